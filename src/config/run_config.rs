// src/config/run_config.rs

//! The immutable configuration a single watch run is started with.

use std::path::PathBuf;

use serde::Serialize;

use crate::types::{UpdateSnapshot, WatchMode};

/// Snapshot of every option that can change between runs.
///
/// A `RunConfig` is never mutated once handed out: keystrokes, plugins and
/// file events produce a new value through
/// [`update_run_config`](crate::config::update::update_run_config).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfig {
    pub mode: WatchMode,
    /// `None` means "no pattern configured at all"; `Some("")` is the
    /// cleared pattern, which matches every test file.
    pub test_path_pattern: Option<String>,
    pub test_name_pattern: String,
    pub only_changed: bool,
    pub only_failures: bool,
    pub bail: u32,
    pub changed_since: Option<String>,
    pub last_commit: bool,
    /// Also count files changed by the parent of the current commit.
    pub with_ancestor: bool,
    pub collect_coverage: bool,
    pub collect_coverage_from: Vec<String>,
    pub coverage_directory: String,
    pub coverage_reporters: Vec<String>,
    pub find_related_tests: bool,
    pub run_tests_by_path: bool,
    pub non_flag_args: Vec<PathBuf>,
    pub no_scm: bool,
    pub notify: bool,
    pub pass_with_no_tests: bool,
    pub reporters: Vec<String>,
    pub update_snapshot: UpdateSnapshot,
    pub verbose: bool,
    pub cwd: PathBuf,
}

impl RunConfig {
    /// Startup configuration for the given mode.
    ///
    /// `only_changed` is forced on in watch mode before the first derivation,
    /// the same way `--watch` implies "only changed files".
    pub fn new(mode: WatchMode, cwd: PathBuf) -> Self {
        Self {
            mode,
            test_path_pattern: Some(String::new()),
            test_name_pattern: String::new(),
            only_changed: mode == WatchMode::Watch,
            only_failures: false,
            bail: 0,
            changed_since: None,
            last_commit: false,
            with_ancestor: false,
            collect_coverage: false,
            collect_coverage_from: Vec::new(),
            coverage_directory: "coverage".to_string(),
            coverage_reporters: Vec::new(),
            find_related_tests: false,
            run_tests_by_path: false,
            non_flag_args: Vec::new(),
            no_scm: false,
            notify: false,
            pass_with_no_tests: false,
            reporters: Vec::new(),
            update_snapshot: UpdateSnapshot::New,
            verbose: false,
            cwd,
        }
    }

    pub fn watch(&self) -> bool {
        self.mode == WatchMode::Watch
    }

    pub fn watch_all(&self) -> bool {
        self.mode == WatchMode::WatchAll
    }

    /// True when a non-empty path pattern narrows the selection.
    pub fn has_test_path_pattern(&self) -> bool {
        self.test_path_pattern
            .as_deref()
            .is_some_and(|p| !p.is_empty())
    }

    /// True when either a path or a name pattern is active.
    pub fn has_filters(&self) -> bool {
        self.has_test_path_pattern() || !self.test_name_pattern.is_empty()
    }
}
