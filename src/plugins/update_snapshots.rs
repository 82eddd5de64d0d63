// src/plugins/update_snapshots.rs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::{ConfigUpdate, RunConfig};
use crate::engine::WatchHandle;
use crate::hooks::HookSubscriber;
use crate::plugins::{PluginOutcome, PluginRun, Reservation, UsageRow, WatchPlugin};
use crate::types::UpdateSnapshot;

/// `u`: re-run with `updateSnapshot = all`. Only offered after a run with
/// snapshot failures.
#[derive(Debug, Default)]
pub struct UpdateSnapshotsPlugin {
    has_snapshot_failure: Arc<AtomicBool>,
}

impl UpdateSnapshotsPlugin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WatchPlugin for UpdateSnapshotsPlugin {
    fn name(&self) -> &str {
        "UpdateSnapshotsPlugin"
    }

    fn is_internal(&self) -> bool {
        true
    }

    fn reservation(&self) -> Option<Reservation> {
        Some(Reservation {
            key: Some('u'),
            purpose: "updating snapshots",
        })
    }

    fn apply(&mut self, hooks: &mut HookSubscriber<'_>) {
        let flag = Arc::clone(&self.has_snapshot_failure);
        hooks.on_test_run_complete(move |results| {
            flag.store(results.snapshot.failure, Ordering::SeqCst);
        });
    }

    fn usage_info(&self, _config: &RunConfig) -> Option<UsageRow> {
        self.has_snapshot_failure
            .load(Ordering::SeqCst)
            .then(|| UsageRow::new('u', "update failing snapshots"))
    }

    fn run(&mut self, _config: &RunConfig, handle: &WatchHandle) -> Option<PluginRun> {
        handle.update_config_and_run(ConfigUpdate {
            update_snapshot: Some(UpdateSnapshot::All),
            ..ConfigUpdate::default()
        });
        Some(Box::pin(async { PluginOutcome::NoRerun }))
    }
}
