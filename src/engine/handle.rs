// src/engine/handle.rs

use tokio::sync::mpsc;
use tracing::debug;

use crate::config::ConfigUpdate;
use crate::engine::WatchEvent;

/// What plugins get to talk back to the controller.
///
/// Requests are queued behind whatever the controller is handling right
/// now, so they never re-enter it.
#[derive(Debug, Clone)]
pub struct WatchHandle {
    tx: mpsc::UnboundedSender<WatchEvent>,
}

impl WatchHandle {
    pub fn new(tx: mpsc::UnboundedSender<WatchEvent>) -> Self {
        Self { tx }
    }

    /// Apply `update` and start a run. `updateSnapshot` reverts afterwards.
    pub fn update_config_and_run(&self, update: ConfigUpdate) {
        self.send(WatchEvent::UpdateConfigAndRun(update));
    }

    /// Leave watch mode.
    pub fn quit(&self) {
        self.send(WatchEvent::Shutdown);
    }

    fn send(&self, event: WatchEvent) {
        if self.tx.send(event).is_err() {
            debug!("watch controller is gone; dropping plugin request");
        }
    }
}
