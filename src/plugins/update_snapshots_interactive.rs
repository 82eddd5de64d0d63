// src/plugins/update_snapshots_interactive.rs

use std::sync::{Arc, Mutex};

use crate::config::{ConfigUpdate, RunConfig};
use crate::engine::WatchHandle;
use crate::exec::results::AssertionLocation;
use crate::hooks::HookSubscriber;
use crate::plugins::{lock, PluginOutcome, PluginRun, Reservation, Settle, UsageRow, WatchPlugin};
use crate::snapshot::{ReviewAction, SnapshotReviewController};
use crate::terminal::{Key, Terminal};
use crate::types::{UpdateSnapshot, WatchMode};

/// `i`: step through failing snapshots one assertion at a time.
#[derive(Debug)]
pub struct UpdateSnapshotsInteractivePlugin {
    review: Arc<Mutex<SnapshotReviewController>>,
    failed: Arc<Mutex<Vec<AssertionLocation>>>,
    settle: Settle,
}

impl UpdateSnapshotsInteractivePlugin {
    pub fn new(terminal: Terminal) -> Self {
        Self {
            review: Arc::new(Mutex::new(SnapshotReviewController::new(terminal))),
            failed: Arc::default(),
            settle: Settle::default(),
        }
    }

    fn settle_if_done(&mut self) {
        if !lock(&self.review).is_active() {
            self.settle.settle(PluginOutcome::NoRerun);
        }
    }
}

/// Configuration that re-runs exactly `assertion`, or clears the filters
/// when leaving review mode.
pub fn review_update(assertion: Option<&AssertionLocation>, update_snapshot: bool) -> ConfigUpdate {
    let (name, path) = match assertion {
        Some(a) => (
            format!("^{}$", regex::escape(&a.full_name)),
            regex::escape(&a.path.to_string_lossy().replace('\\', "/")),
        ),
        None => (String::new(), String::new()),
    };
    ConfigUpdate {
        mode: Some(WatchMode::Watch),
        test_name_pattern: Some(name),
        test_path_pattern: Some(path),
        update_snapshot: Some(if update_snapshot {
            UpdateSnapshot::All
        } else {
            UpdateSnapshot::None
        }),
        ..ConfigUpdate::default()
    }
}

impl WatchPlugin for UpdateSnapshotsInteractivePlugin {
    fn name(&self) -> &str {
        "UpdateSnapshotInteractivePlugin"
    }

    fn is_internal(&self) -> bool {
        true
    }

    fn reservation(&self) -> Option<Reservation> {
        Some(Reservation {
            key: Some('i'),
            purpose: "updating snapshots interactively",
        })
    }

    fn apply(&mut self, hooks: &mut HookSubscriber<'_>) {
        let review = Arc::clone(&self.review);
        let failed = Arc::clone(&self.failed);
        hooks.on_test_run_complete(move |results| {
            *lock(&failed) = results.failed_snapshot_assertions();
            let mut review = lock(&review);
            if review.is_active() {
                review.update_with_results(results);
            }
        });
    }

    fn usage_info(&self, _config: &RunConfig) -> Option<UsageRow> {
        if lock(&self.failed).is_empty() {
            return None;
        }
        Some(UsageRow::new('i', "update failing snapshots interactively"))
    }

    fn on_key(&mut self, key: &Key) -> bool {
        lock(&self.review).put(key);
        self.settle_if_done();
        true
    }

    fn run(&mut self, _config: &RunConfig, handle: &WatchHandle) -> Option<PluginRun> {
        let failed = lock(&self.failed).clone();
        if failed.is_empty() {
            return Some(Box::pin(async { PluginOutcome::NoRerun }));
        }

        let run = self.settle.arm();
        let handle = handle.clone();
        let action: ReviewAction = Box::new(move |assertion, update_snapshot| {
            handle.update_config_and_run(review_update(assertion, update_snapshot));
        });
        lock(&self.review).run(failed, action);
        self.settle_if_done();
        Some(run)
    }
}
