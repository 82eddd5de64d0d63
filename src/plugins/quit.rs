// src/plugins/quit.rs

use crate::config::RunConfig;
use crate::engine::WatchHandle;
use crate::plugins::{PluginRun, Reservation, UsageRow, WatchPlugin};
use crate::terminal::Terminal;

/// `q`: leave watch mode.
#[derive(Debug)]
pub struct QuitPlugin {
    terminal: Terminal,
}

impl QuitPlugin {
    pub fn new(terminal: Terminal) -> Self {
        Self { terminal }
    }
}

impl WatchPlugin for QuitPlugin {
    fn name(&self) -> &str {
        "QuitPlugin"
    }

    fn is_internal(&self) -> bool {
        true
    }

    fn reservation(&self) -> Option<Reservation> {
        Some(Reservation {
            key: None,
            purpose: "quitting watch mode",
        })
    }

    fn usage_info(&self, _config: &RunConfig) -> Option<UsageRow> {
        Some(UsageRow::new('q', "quit watch mode"))
    }

    fn run(&mut self, _config: &RunConfig, handle: &WatchHandle) -> Option<PluginRun> {
        self.terminal.write_str("\n");
        handle.quit();
        None
    }
}
