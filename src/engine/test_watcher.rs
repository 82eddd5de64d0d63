// src/engine/test_watcher.rs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancellation token for one run.
///
/// A fresh watcher is allocated before every run and again when it
/// completes, so interrupting a superseded run never affects the next one.
/// Runners poll [`is_interrupted`](Self::is_interrupted) between test files.
#[derive(Debug, Clone, Default)]
pub struct TestWatcher {
    interrupted: Arc<AtomicBool>,
}

impl TestWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Whether both handles refer to the same token.
    pub fn same_as(&self, other: &TestWatcher) -> bool {
        Arc::ptr_eq(&self.interrupted, &other.interrupted)
    }
}
