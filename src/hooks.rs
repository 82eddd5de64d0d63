// src/hooks.rs

//! Typed pub/sub between plugins, the controller and the runner.
//!
//! Three topics:
//! - `fsChange`: the test paths of every project, on startup and after each
//!   relevant file change.
//! - `shouldRunTestSuite`: async gate consulted before each test file; all
//!   listeners run concurrently and the answers are ANDed.
//! - `testRunComplete`: the aggregated result, delivered synchronously in
//!   registration order.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::warn;

use crate::config::ProjectConfig;
use crate::exec::results::AggregatedResult;
use crate::types::BoxFuture;

#[derive(Debug, Clone)]
pub struct ProjectTestPaths {
    pub config: Arc<ProjectConfig>,
    pub test_paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct FsChangeInfo {
    pub projects: Vec<ProjectTestPaths>,
}

#[derive(Debug, Clone)]
pub struct TestSuiteInfo {
    pub config: Arc<ProjectConfig>,
    pub duration: Option<Duration>,
    pub test_path: PathBuf,
}

pub type FsChangeListener = Box<dyn FnMut(&FsChangeInfo) + Send>;
pub type ShouldRunListener = Arc<dyn Fn(TestSuiteInfo) -> BoxFuture<'static, bool> + Send + Sync>;
pub type RunCompleteListener = Box<dyn FnMut(&AggregatedResult) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookTopic {
    FileChange,
    ShouldRunTestSuite,
    TestRunComplete,
}

#[derive(Default)]
pub struct HookBus {
    fs_change: Vec<FsChangeListener>,
    should_run: Vec<ShouldRunListener>,
    run_complete: Vec<RunCompleteListener>,
}

impl fmt::Debug for HookBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookBus")
            .field("fs_change", &self.fs_change.len())
            .field("should_run", &self.should_run.len())
            .field("run_complete", &self.run_complete.len())
            .finish()
    }
}

impl HookBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle given to a plugin's `apply`.
    pub fn subscriber(&mut self) -> HookSubscriber<'_> {
        HookSubscriber { bus: self }
    }

    pub fn is_used(&self, topic: HookTopic) -> bool {
        match topic {
            HookTopic::FileChange => !self.fs_change.is_empty(),
            HookTopic::ShouldRunTestSuite => !self.should_run.is_empty(),
            HookTopic::TestRunComplete => !self.run_complete.is_empty(),
        }
    }

    pub fn emit_file_change(&mut self, info: &FsChangeInfo) {
        for listener in &mut self.fs_change {
            listener(info);
        }
    }

    pub fn emit_test_run_complete(&mut self, results: &AggregatedResult) {
        for listener in &mut self.run_complete {
            listener(results);
        }
    }

    /// Snapshot of the `shouldRunTestSuite` listeners for the runner.
    pub fn should_run_gate(&self) -> ShouldRunGate {
        ShouldRunGate {
            listeners: Arc::new(self.should_run.clone()),
        }
    }
}

pub struct HookSubscriber<'a> {
    bus: &'a mut HookBus,
}

impl HookSubscriber<'_> {
    pub fn on_file_change(&mut self, listener: impl FnMut(&FsChangeInfo) + Send + 'static) {
        self.bus.fs_change.push(Box::new(listener));
    }

    pub fn should_run_test_suite<F>(&mut self, listener: F)
    where
        F: Fn(TestSuiteInfo) -> BoxFuture<'static, bool> + Send + Sync + 'static,
    {
        self.bus.should_run.push(Arc::new(listener));
    }

    pub fn on_test_run_complete(&mut self, listener: impl FnMut(&AggregatedResult) + Send + 'static) {
        self.bus.run_complete.push(Box::new(listener));
    }
}

/// Cloneable view over the `shouldRunTestSuite` listeners.
#[derive(Clone, Default)]
pub struct ShouldRunGate {
    listeners: Arc<Vec<ShouldRunListener>>,
}

impl fmt::Debug for ShouldRunGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShouldRunGate")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ShouldRunGate {
    /// True unless some listener answers false. A listener that panics
    /// counts as false.
    pub async fn should_run(&self, info: TestSuiteInfo) -> bool {
        if self.listeners.is_empty() {
            return true;
        }

        let mut set = JoinSet::new();
        for listener in self.listeners.iter() {
            set.spawn(listener(info.clone()));
        }

        let mut verdict = true;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(answer) => verdict &= answer,
                Err(err) => {
                    warn!("shouldRunTestSuite listener failed: {err}");
                    verdict = false;
                }
            }
        }
        verdict
    }
}
