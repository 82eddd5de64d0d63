// src/plugins/mod.rs

//! Watch plugins.
//!
//! A plugin binds a key, may tap the [`HookBus`](crate::hooks::HookBus) to
//! keep private state, and may take over the keyboard while it is active.
//!
//! - [`registry`]: internal + third-party registration, key conflicts and
//!   usage rows.
//! - [`quit`], [`test_path_pattern`], [`test_name_pattern`],
//!   [`update_snapshots`], [`update_snapshots_interactive`]: built-ins.
//! - [`command`]: third-party plugins backed by an executable.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use crate::config::{ConfigUpdate, RunConfig};
use crate::engine::WatchHandle;
use crate::hooks::HookSubscriber;
use crate::terminal::{Key, PatternPrompt, PromptEvent, TypeaheadSource};
use crate::types::BoxFuture;

pub mod command;
pub mod quit;
pub mod registry;
pub mod test_name_pattern;
pub mod test_path_pattern;
pub mod update_snapshots;
pub mod update_snapshots_interactive;

pub use command::CommandPlugin;
pub use quit::QuitPlugin;
pub use registry::{internal_plugins, PluginRegistry};
pub use test_name_pattern::TestNamePatternPlugin;
pub use test_path_pattern::TestPathPatternPlugin;
pub use update_snapshots::UpdateSnapshotsPlugin;
pub use update_snapshots_interactive::UpdateSnapshotsInteractivePlugin;

/// How an activation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginOutcome {
    /// Deactivate and start a run with the current configuration.
    Rerun,
    /// Deactivate; the plugin already did what it needed.
    NoRerun,
    /// Deactivate and redraw the usage banner.
    Cancelled,
}

/// Resolves once the plugin gives the keyboard back.
pub type PluginRun = BoxFuture<'static, PluginOutcome>;

/// A `(key, prompt)` line in the usage banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageRow {
    pub key: char,
    pub prompt: String,
}

impl UsageRow {
    pub fn new(key: char, prompt: impl Into<String>) -> Self {
        Self {
            key,
            prompt: prompt.into(),
        }
    }
}

/// A key held by an internal plugin that third-party plugins may not take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    /// Reserved even while the plugin shows no usage row. `None` reserves
    /// whatever key the plugin's usage row names.
    pub key: Option<char>,
    /// What the key is reserved for, used in the conflict message.
    pub purpose: &'static str,
}

pub trait WatchPlugin: Send {
    /// Identifier used in log lines and conflict messages.
    fn name(&self) -> &str;

    fn is_internal(&self) -> bool {
        false
    }

    fn reservation(&self) -> Option<Reservation> {
        None
    }

    fn apply(&mut self, _hooks: &mut HookSubscriber<'_>) {}

    /// Usage row for the current configuration; `None` hides the plugin and
    /// makes its key inert.
    fn usage_info(&self, _config: &RunConfig) -> Option<UsageRow> {
        None
    }

    /// Keystrokes while active. Returning `false` lets the controller route
    /// the key as if no plugin were active.
    fn on_key(&mut self, _key: &Key) -> bool {
        false
    }

    /// Activate. `None` means there is nothing to wait for and the plugin is
    /// deactivated right away.
    fn run(&mut self, _config: &RunConfig, _handle: &WatchHandle) -> Option<PluginRun> {
        None
    }
}

/// One-shot completion shared between `run` and `on_key`.
#[derive(Debug, Default)]
pub(crate) struct Settle {
    tx: Option<oneshot::Sender<PluginOutcome>>,
}

impl Settle {
    /// Arm a new activation and return the future the controller awaits.
    /// A dropped sender counts as a cancellation.
    pub(crate) fn arm(&mut self) -> PluginRun {
        let (tx, rx) = oneshot::channel();
        self.tx = Some(tx);
        Box::pin(async move { rx.await.unwrap_or(PluginOutcome::Cancelled) })
    }

    pub(crate) fn settle(&mut self, outcome: PluginOutcome) {
        if let Some(tx) = self.tx.take() {
            // The controller may have moved on already.
            let _ = tx.send(outcome);
        }
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Feed `key` to an active pattern prompt. Enter applies the update built
/// from the submitted pattern; Escape cancels the activation.
pub(crate) fn drive_pattern_prompt<S: TypeaheadSource>(
    prompt: &mut PatternPrompt<S>,
    settle: &mut Settle,
    handle: Option<&WatchHandle>,
    key: &Key,
    on_submit: impl FnOnce(String) -> ConfigUpdate,
) {
    match prompt.put(key) {
        PromptEvent::Submitted(pattern) => {
            if let Some(handle) = handle {
                handle.update_config_and_run(on_submit(pattern));
            }
            settle.settle(PluginOutcome::NoRerun);
        }
        PromptEvent::Cancelled(_) => settle.settle(PluginOutcome::Cancelled),
        PromptEvent::Changed { .. } | PromptEvent::Ignored => {}
    }
}
