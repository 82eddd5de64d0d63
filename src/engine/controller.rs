// src/engine/controller.rs

//! Synchronous watch-mode state machine.
//!
//! [`WatchController::step`] consumes one [`WatchEvent`] and returns the
//! commands the async shell must carry out: start a run, await a plugin
//! activation, or exit. It never blocks and never spawns, which keeps every
//! routing rule testable without a runtime.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crossterm::style::Stylize;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::project::absolutize;
use crate::config::{update_run_config, ConfigUpdate, RunConfig};
use crate::engine::usage::{toggle_usage_hint, usage};
use crate::engine::{TestWatcher, WatchEvent, WatchHandle};
use crate::exec::{RunPlan, RunReport};
use crate::haste::{is_snapshot_path, FileIndex, HasteChange};
use crate::hooks::{FsChangeInfo, HookBus, HookTopic, ProjectTestPaths};
use crate::plugins::{PluginOutcome, PluginRegistry, PluginRun, UsageRow};
use crate::search::{FailedTestsCache, SearchSource};
use crate::terminal::{ControlKey, Key, Terminal};
use crate::types::{UpdateSnapshot, WatchMode};

/// Keys that interrupt a run in flight, besides every plugin key.
const INTERRUPT_KEYS: [Key; 5] = [
    Key::Char('q'),
    Key::ENTER,
    Key::Char('a'),
    Key::Char('o'),
    Key::Char('f'),
];

/// Work for the async shell.
pub enum ControllerCommand {
    /// Execute the plan and report back with [`WatchEvent::RunFinished`].
    StartRun(RunPlan),
    /// Await the plugin and report back with [`WatchEvent::PluginSettled`].
    AwaitPlugin { activation: u64, run: PluginRun },
    /// Stop the event loop.
    Exit,
}

impl fmt::Debug for ControllerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerCommand::StartRun(plan) => f.debug_tuple("StartRun").field(&plan.run_id).finish(),
            ControllerCommand::AwaitPlugin { activation, .. } => f
                .debug_struct("AwaitPlugin")
                .field("activation", activation)
                .finish_non_exhaustive(),
            ControllerCommand::Exit => f.write_str("Exit"),
        }
    }
}

/// Decision returned for a single event.
#[derive(Debug)]
pub struct ControllerStep {
    pub commands: Vec<ControllerCommand>,
    pub keep_running: bool,
}

impl ControllerStep {
    fn idle() -> Self {
        Self::with(Vec::new())
    }

    fn with(commands: Vec<ControllerCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }

    /// Whether this step starts a run.
    pub fn starts_run(&self) -> bool {
        self.commands
            .iter()
            .any(|c| matches!(c, ControllerCommand::StartRun(_)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActivePlugin {
    index: usize,
    activation: u64,
}

/// What the controller is assembled from.
#[derive(Debug)]
pub struct WatchControllerParts {
    pub config: RunConfig,
    /// One file index per project, in project order.
    pub contexts: Vec<Arc<FileIndex>>,
    /// Internal and third-party plugins, already applied to `hooks`.
    pub registry: PluginRegistry,
    pub hooks: HookBus,
    pub terminal: Terminal,
    pub handle: WatchHandle,
    /// Changes to matching paths never trigger a run.
    pub watch_path_ignore_patterns: Vec<Regex>,
}

#[derive(Debug)]
pub struct WatchController {
    config: RunConfig,
    sources: Vec<SearchSource>,
    registry: PluginRegistry,
    hooks: HookBus,
    failed_tests: FailedTestsCache,
    terminal: Terminal,
    handle: WatchHandle,
    ignore_patterns: Vec<Regex>,
    watcher: TestWatcher,
    is_running: bool,
    run_id: u64,
    next_activation: u64,
    active_plugin: Option<ActivePlugin>,
    should_display_usage: bool,
    is_usage_displayed: bool,
}

impl WatchController {
    /// Build the controller and announce the initial test paths on `fsChange`.
    pub fn new(parts: WatchControllerParts) -> Self {
        let config = update_run_config(
            &parts.config,
            &ConfigUpdate {
                mode: Some(parts.config.mode),
                pass_with_no_tests: Some(true),
                ..ConfigUpdate::default()
            },
        );

        let mut controller = Self {
            config,
            sources: parts.contexts.into_iter().map(SearchSource::new).collect(),
            registry: parts.registry,
            hooks: parts.hooks,
            failed_tests: FailedTestsCache::new(),
            terminal: parts.terminal,
            handle: parts.handle,
            ignore_patterns: parts.watch_path_ignore_patterns,
            watcher: TestWatcher::new(),
            is_running: false,
            run_id: 0,
            next_activation: 0,
            active_plugin: None,
            should_display_usage: true,
            is_usage_displayed: false,
        };
        controller.emit_file_change();
        controller
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    /// Cancellation token of the current (or next) run.
    pub fn watcher(&self) -> &TestWatcher {
        &self.watcher
    }

    /// Registry index of the plugin owning the keyboard.
    pub fn active_plugin(&self) -> Option<usize> {
        self.active_plugin.map(|a| a.index)
    }

    pub fn failed_tests(&self) -> &FailedTestsCache {
        &self.failed_tests
    }

    pub fn usage_rows(&self) -> Vec<UsageRow> {
        self.registry.sorted_usage_rows(&self.config)
    }

    /// The initial run.
    pub fn start(&mut self) -> ControllerStep {
        ControllerStep::with(self.start_run().into_iter().collect())
    }

    pub fn step(&mut self, event: WatchEvent) -> ControllerStep {
        match event {
            WatchEvent::Key(key) => self.on_key(key),
            WatchEvent::FilesChanged { project, change } => self.on_files_changed(project, change),
            WatchEvent::UpdateConfigAndRun(update) => {
                ControllerStep::with(self.update_config_and_run(update).into_iter().collect())
            }
            WatchEvent::PluginSettled { activation, outcome } => {
                self.on_plugin_settled(activation, outcome)
            }
            WatchEvent::RunFinished { run_id, outcome } => self.on_run_finished(run_id, outcome),
            WatchEvent::Shutdown => self.exit(),
        }
    }

    fn on_key(&mut self, key: Key) -> ControllerStep {
        if key.is_hard_quit() {
            info!("hard quit requested");
            self.terminal.write_str("\n");
            return self.exit();
        }

        if let Some(active) = self.active_plugin {
            if let Some(plugin) = self.registry.get_mut(active.index) {
                if plugin.on_key(&key) {
                    return ControllerStep::idle();
                }
            }
        }

        let rows = self.registry.sorted_usage_rows(&self.config);
        if self.is_running && is_interrupt_key(&key, &rows) {
            debug!(%key, run_id = self.run_id, "interrupting the current run");
            self.watcher.interrupt();
            return ControllerStep::idle();
        }

        let mut commands = Vec::new();
        let plugin_index = key
            .as_char()
            .and_then(|c| self.registry.find_by_key(&self.config, c));
        if let Some(index) = plugin_index {
            if self.is_running {
                self.watcher.interrupt();
                return ControllerStep::idle();
            }
            commands.extend(self.activate(index));
        }

        match key {
            Key::Control(ControlKey::Enter) => commands.extend(self.start_run()),
            Key::Char('a') => {
                self.config = update_run_config(&self.config, &ConfigUpdate::clear_filters(WatchMode::WatchAll));
                commands.extend(self.start_run());
            }
            Key::Char('c') => {
                commands.extend(self.update_config_and_run(ConfigUpdate::clear_filters(WatchMode::Watch)));
            }
            Key::Char('f') => {
                self.config = update_run_config(
                    &self.config,
                    &ConfigUpdate {
                        only_failures: Some(!self.config.only_failures),
                        ..ConfigUpdate::default()
                    },
                );
                commands.extend(self.start_run());
            }
            Key::Char('o') => {
                self.config = update_run_config(&self.config, &ConfigUpdate::clear_filters(WatchMode::Watch));
                commands.extend(self.start_run());
            }
            Key::Char('w') => self.show_full_usage(),
            _ => {}
        }

        ControllerStep::with(commands)
    }

    fn activate(&mut self, index: usize) -> Option<ControllerCommand> {
        let plugin = self.registry.get_mut(index)?;
        self.next_activation += 1;
        let activation = self.next_activation;
        debug!(plugin = plugin.name(), activation, "activating watch plugin");

        self.active_plugin = Some(ActivePlugin { index, activation });
        match plugin.run(&self.config, &self.handle) {
            Some(run) => Some(ControllerCommand::AwaitPlugin { activation, run }),
            None => {
                self.active_plugin = None;
                None
            }
        }
    }

    fn on_plugin_settled(&mut self, activation: u64, outcome: PluginOutcome) -> ControllerStep {
        match self.active_plugin {
            Some(active) if active.activation == activation => self.active_plugin = None,
            Some(_) => {
                debug!(activation, "ignoring outcome of a superseded plugin activation");
                return ControllerStep::idle();
            }
            None => {}
        }
        debug!(activation, ?outcome, "plugin settled");

        match outcome {
            PluginOutcome::Rerun => {
                ControllerStep::with(self.update_config_and_run(ConfigUpdate::default()).into_iter().collect())
            }
            PluginOutcome::NoRerun => ControllerStep::idle(),
            PluginOutcome::Cancelled => {
                self.terminal.hide_cursor();
                self.terminal.clear_screen();
                self.terminal.write_str(&self.usage_banner());
                self.terminal.show_cursor();
                ControllerStep::idle()
            }
        }
    }

    /// Apply `update`, start a run, then put `updateSnapshot` back.
    ///
    /// A previous value of `all` is restored as `none`, so snapshot updates
    /// never carry over into the next run.
    fn update_config_and_run(&mut self, update: ConfigUpdate) -> Option<ControllerCommand> {
        let previous = self.config.update_snapshot;
        self.config = update_run_config(&self.config, &update);
        let command = self.start_run();

        let restored = match previous {
            UpdateSnapshot::All => UpdateSnapshot::None,
            other => other,
        };
        self.config = update_run_config(
            &self.config,
            &ConfigUpdate {
                update_snapshot: Some(restored),
                ..ConfigUpdate::default()
            },
        );
        command
    }

    /// Requests made while a run is in flight are dropped, not queued.
    fn start_run(&mut self) -> Option<ControllerCommand> {
        if self.is_running {
            debug!(run_id = self.run_id, "run already in progress; dropping request");
            return None;
        }

        self.watcher = TestWatcher::new();
        if self.terminal.is_interactive() {
            self.terminal.clear_screen();
            self.terminal
                .write_line(&"Determining test suites to run...".bold().dim().to_string());
        }
        self.is_running = true;
        self.run_id += 1;
        info!(run_id = self.run_id, mode = ?self.config.mode, "starting test run");

        Some(ControllerCommand::StartRun(RunPlan {
            run_id: self.run_id,
            config: self.config.clone(),
            sources: self.sources.clone(),
            watcher: self.watcher.clone(),
            failed_tests: self.failed_tests.clone(),
            gate: self.hooks.should_run_gate(),
        }))
    }

    fn on_run_finished(&mut self, run_id: u64, outcome: Result<RunReport, String>) -> ControllerStep {
        if !self.is_running || run_id != self.run_id {
            debug!(run_id, current = self.run_id, "ignoring completion of a stale run");
            return ControllerStep::idle();
        }
        self.is_running = false;

        match outcome {
            Ok(report) => {
                info!(
                    run_id,
                    suites = report.results.num_total_test_suites,
                    failed = report.results.num_failed_test_suites,
                    interrupted = report.results.interrupted,
                    "test run complete"
                );
                self.hooks.emit_test_run_complete(&report.results);
                self.watcher = TestWatcher::new();
                if report.no_scm && !self.config.no_scm {
                    self.config = update_run_config(
                        &self.config,
                        &ConfigUpdate {
                            no_scm: Some(true),
                            ..ConfigUpdate::default()
                        },
                    );
                }
                self.print_usage_after_run();
                self.failed_tests.set_test_results(&report.results.test_results);
            }
            Err(message) => {
                warn!(run_id, "test run failed: {message}");
                self.watcher = TestWatcher::new();
                self.terminal.write_line(&format!("\n\n{}", message.red()));
                self.print_usage_after_run();
            }
        }
        ControllerStep::idle()
    }

    fn print_usage_after_run(&mut self) {
        if !self.terminal.is_interactive() {
            self.terminal.write_str("\n");
            return;
        }
        if self.should_display_usage {
            self.terminal.write_str(&self.usage_banner());
            self.is_usage_displayed = true;
        } else {
            self.terminal.write_str(&toggle_usage_hint());
            self.is_usage_displayed = false;
        }
        self.should_display_usage = false;
    }

    fn show_full_usage(&mut self) {
        if self.should_display_usage || self.is_usage_displayed {
            return;
        }
        self.terminal.cursor_up(1);
        self.terminal.erase_down();
        self.terminal.write_str(&self.usage_banner());
        self.is_usage_displayed = true;
    }

    fn usage_banner(&self) -> String {
        usage(&self.config, &self.registry.sorted_usage_rows(&self.config))
    }

    fn on_files_changed(&mut self, project: usize, change: HasteChange) -> ControllerStep {
        let Some(source) = self.sources.get(project) else {
            warn!(project, "change batch for an unknown project");
            return ControllerStep::idle();
        };
        let root = source.context().project().root_dir.clone();

        let relevant = change
            .events
            .iter()
            .filter(|event| self.is_valid_path(&root, &event.path))
            .count();
        if relevant == 0 {
            debug!(project, events = change.events.len(), "no relevant paths in change batch");
            return ControllerStep::idle();
        }

        debug!(project, relevant, "files changed");
        self.sources[project] = SearchSource::new(change.index);
        self.active_plugin = None;
        self.emit_file_change();
        ControllerStep::with(self.start_run().into_iter().collect())
    }

    fn is_valid_path(&self, root: &Path, path: &Path) -> bool {
        let coverage = absolutize(root, Path::new(&self.config.coverage_directory));
        if path.starts_with(&coverage) || is_snapshot_path(path) {
            return false;
        }
        let text = path.to_string_lossy();
        !self.ignore_patterns.iter().any(|re| re.is_match(&text))
    }

    fn emit_file_change(&mut self) {
        if !self.hooks.is_used(HookTopic::FileChange) {
            return;
        }
        let projects = self
            .sources
            .iter()
            .map(|source| {
                let test_paths = match source.find_matching_tests("") {
                    Ok(result) => result.paths(),
                    Err(err) => {
                        warn!("listing test paths failed: {err}");
                        Vec::new()
                    }
                };
                ProjectTestPaths {
                    config: Arc::clone(source.context().project()),
                    test_paths,
                }
            })
            .collect();
        self.hooks.emit_file_change(&FsChangeInfo { projects });
    }

    fn exit(&mut self) -> ControllerStep {
        if self.active_plugin.is_some() {
            self.terminal.cursor_down(1);
            self.terminal.erase_down();
        }
        ControllerStep {
            commands: vec![ControllerCommand::Exit],
            keep_running: false,
        }
    }
}

fn is_interrupt_key(key: &Key, rows: &[UsageRow]) -> bool {
    INTERRUPT_KEYS.contains(key) || key.as_char().is_some_and(|c| rows.iter().any(|row| row.key == c))
}
