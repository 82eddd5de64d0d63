// src/engine/mod.rs

//! The watch controller.
//!
//! Keystrokes, file-change batches, plugin completions and run completions
//! all arrive as [`WatchEvent`]s on one channel and are handled one at a
//! time, so the controller never needs a lock.
//!
//! The synchronous state machine lives in [`controller`]; the async shell
//! that owns the channel, spawns runs and awaits plugins is [`runtime`].

use crate::config::ConfigUpdate;
use crate::exec::RunReport;
use crate::haste::HasteChange;
use crate::plugins::PluginOutcome;
use crate::terminal::Key;

/// Everything the controller reacts to.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// A decoded keystroke from the raw-mode reader.
    Key(Key),
    /// The file index of project `project` changed.
    FilesChanged { project: usize, change: HasteChange },
    /// A plugin asked for a configuration change followed by a run.
    UpdateConfigAndRun(ConfigUpdate),
    /// The activation `activation` of the active plugin finished.
    PluginSettled {
        activation: u64,
        outcome: PluginOutcome,
    },
    /// Run `run_id` completed. Errors are already formatted for display.
    RunFinished {
        run_id: u64,
        outcome: Result<RunReport, String>,
    },
    /// Leave watch mode.
    Shutdown,
}

pub mod controller;
pub mod handle;
pub mod runtime;
pub mod test_watcher;
pub mod usage;

pub use controller::{ControllerCommand, ControllerStep, WatchController, WatchControllerParts};
pub use handle::WatchHandle;
pub use runtime::Runtime;
pub use test_watcher::TestWatcher;
