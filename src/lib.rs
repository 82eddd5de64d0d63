// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod haste;
pub mod hooks;
pub mod logging;
pub mod plugins;
pub mod search;
pub mod snapshot;
pub mod terminal;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use regex::Regex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::{ConfigFile, RunConfig};
use crate::engine::{Runtime, WatchController, WatchControllerParts, WatchEvent, WatchHandle};
use crate::errors::TestwatchError;
use crate::exec::{CommandRunner, RunServices};
use crate::fs::{FileSystem, RealFileSystem};
use crate::haste::{spawn_watcher, FileIndex};
use crate::hooks::HookBus;
use crate::plugins::{internal_plugins, CommandPlugin, PluginRegistry, WatchPlugin};
use crate::search::{CommandFilter, ScmChangedFiles, TestFilter};
use crate::terminal::{is_interactive, spawn_key_reader, stdin_is_terminal, RawModeGuard, Terminal};
use crate::types::{UpdateSnapshot, WatchMode};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and the initial run configuration
/// - file indexes and the file watcher
/// - hooks and plugins (internal + `[[watch_plugin]]`)
/// - raw-mode keyboard input and Ctrl-C handling
/// - the watch controller and its runtime
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    debug!(projects = cfg.projects.len(), plugins = cfg.watch_plugins.len(), "config loaded");

    let interactive = is_interactive(args.ci);
    let terminal = Terminal::stdout(interactive);
    let run_config = build_run_config(&args, &cfg, std::env::current_dir()?, interactive);

    // File indexes, one per project.
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let indexes = cfg
        .projects
        .iter()
        .map(|project| FileIndex::build(Arc::clone(project), fs.as_ref()))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    for index in &indexes {
        info!(project = %index.project().name, files = index.len(), "file index built");
    }

    let (tx, rx) = mpsc::unbounded_channel::<WatchEvent>();

    // Plugins.
    let mut hooks = HookBus::new();
    let mut registry = PluginRegistry::new(internal_plugins(&terminal), &mut hooks);
    let mut third_party: Vec<Box<dyn WatchPlugin>> = Vec::with_capacity(cfg.watch_plugins.len());
    for section in &cfg.watch_plugins {
        third_party.push(Box::new(CommandPlugin::load(section, &cfg.base_dir).await?));
    }
    registry.register_third_party(third_party, &run_config, &mut hooks)?;

    let ignore_patterns = cfg
        .watch
        .watch_path_ignore_patterns
        .iter()
        .map(|p| Regex::new(p).map_err(|e| TestwatchError::invalid_pattern(p, e)))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let _watcher_handle = spawn_watcher(
        indexes.clone(),
        Arc::clone(&fs),
        Duration::from_millis(cfg.watch.debounce_ms),
        tx.clone(),
    )?;

    let controller = WatchController::new(WatchControllerParts {
        config: run_config,
        contexts: indexes.into_iter().map(Arc::new).collect(),
        registry,
        hooks,
        terminal: terminal.clone(),
        handle: WatchHandle::new(tx.clone()),
        watch_path_ignore_patterns: ignore_patterns,
    });

    let services = RunServices {
        runner: Arc::new(CommandRunner::new(cfg.runner.command.clone(), terminal.clone())),
        changed_files: Arc::new(ScmChangedFiles),
        filter: cfg
            .watch
            .filter
            .as_ref()
            .map(|command| Arc::new(CommandFilter::new(command.clone())) as Arc<dyn TestFilter>),
        terminal,
    };

    // Keystrokes. Without a terminal on stdin the session is driven by file
    // changes alone.
    let _raw_mode = if stdin_is_terminal() {
        match RawModeGuard::enable() {
            Ok(guard) => {
                spawn_key_reader(tx.clone());
                Some(guard)
            }
            Err(err) => {
                warn!("could not enable raw mode; keyboard input disabled: {err}");
                None
            }
        }
    } else {
        None
    };

    // Ctrl-C outside raw mode → graceful shutdown.
    {
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(WatchEvent::Shutdown);
        });
    }

    let runtime = Runtime::new(controller, rx, tx, services);
    runtime.run().await?;
    Ok(())
}

/// Initial run configuration from the config file and CLI overrides.
///
/// Snapshots default to `new` on an interactive terminal and `none`
/// otherwise.
pub fn build_run_config(args: &CliArgs, cfg: &ConfigFile, cwd: PathBuf, interactive: bool) -> RunConfig {
    let mode = if args.watch_all || cfg.watch.watch_all {
        WatchMode::WatchAll
    } else {
        WatchMode::Watch
    };

    let mut config = RunConfig::new(mode, cwd);
    if let Some(pattern) = &args.test_path_pattern {
        config.test_path_pattern = Some(pattern.clone());
    }
    config.test_name_pattern = args.test_name_pattern.clone().unwrap_or_default();
    config.only_failures = args.only_failures;
    config.find_related_tests = args.find_related_tests;
    config.run_tests_by_path = args.run_tests_by_path;
    config.non_flag_args = args.paths.clone();
    config.collect_coverage = args.coverage;
    config.coverage_directory = cfg.watch.coverage_directory.clone();
    config.last_commit = args.last_commit;
    config.changed_since = args.changed_since.clone();
    config.with_ancestor = args.changed_files_with_ancestor;
    config.bail = args.bail.unwrap_or(cfg.watch.bail);
    config.update_snapshot = match args.update_snapshot {
        Some(arg) => arg.into(),
        None if interactive => UpdateSnapshot::New,
        None => UpdateSnapshot::None,
    };
    config
}
