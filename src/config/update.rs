// src/config/update.rs

//! Pure reducer producing a new [`RunConfig`] from partial overrides.

use std::path::PathBuf;

use serde::Deserialize;

use crate::config::run_config::RunConfig;
use crate::types::{UpdateSnapshot, WatchMode};

/// Partial override of a [`RunConfig`]. `None` leaves a field untouched.
///
/// Deserializable so that command plugins can answer with an update in JSON
/// (`{"mode": "watch", "testPathPattern": "foo"}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigUpdate {
    pub bail: Option<u32>,
    pub changed_since: Option<String>,
    pub collect_coverage: Option<bool>,
    pub collect_coverage_from: Option<Vec<String>>,
    pub coverage_directory: Option<String>,
    pub coverage_reporters: Option<Vec<String>>,
    pub find_related_tests: Option<bool>,
    pub mode: Option<WatchMode>,
    pub non_flag_args: Option<Vec<PathBuf>>,
    pub no_scm: Option<bool>,
    pub notify: Option<bool>,
    pub only_failures: Option<bool>,
    pub pass_with_no_tests: Option<bool>,
    pub reporters: Option<Vec<String>>,
    pub test_name_pattern: Option<String>,
    pub test_path_pattern: Option<String>,
    pub update_snapshot: Option<UpdateSnapshot>,
    pub verbose: Option<bool>,
    pub with_ancestor: Option<bool>,
}

impl ConfigUpdate {
    /// Switch mode and drop both patterns (`a`, `c`, `o` keys).
    pub fn clear_filters(mode: WatchMode) -> Self {
        Self {
            mode: Some(mode),
            test_name_pattern: Some(String::new()),
            test_path_pattern: Some(String::new()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Apply `update` to `config`, returning the new configuration.
///
/// After every application `only_changed` is re-derived as
/// `!watch_all && test_name_pattern.is_empty() && !has_test_path_pattern`.
pub fn update_run_config(config: &RunConfig, update: &ConfigUpdate) -> RunConfig {
    let mut next = config.clone();

    if let Some(mode) = update.mode {
        next.mode = mode;
    }
    if let Some(pattern) = &update.test_name_pattern {
        next.test_name_pattern = pattern.clone();
    }
    if let Some(pattern) = &update.test_path_pattern {
        next.test_path_pattern = Some(pattern.clone());
    }

    next.only_changed =
        !next.watch_all() && next.test_name_pattern.is_empty() && !next.has_test_path_pattern();

    if let Some(bail) = update.bail {
        next.bail = bail;
    }
    if let Some(since) = &update.changed_since {
        next.changed_since = if since.is_empty() {
            None
        } else {
            Some(since.clone())
        };
    }
    if let Some(with_ancestor) = update.with_ancestor {
        next.with_ancestor = with_ancestor;
    }
    if let Some(collect) = update.collect_coverage {
        next.collect_coverage = collect;
    }
    if let Some(from) = &update.collect_coverage_from {
        next.collect_coverage_from = from.clone();
    }
    if let Some(dir) = &update.coverage_directory {
        next.coverage_directory = dir.clone();
    }
    if let Some(reporters) = &update.coverage_reporters {
        next.coverage_reporters = reporters.clone();
    }
    if let Some(related) = update.find_related_tests {
        next.find_related_tests = related;
    }
    if let Some(args) = &update.non_flag_args {
        next.non_flag_args = args.clone();
    }
    // noSCM is sticky: once detected it is never cleared.
    if update.no_scm == Some(true) {
        next.no_scm = true;
    }
    if let Some(notify) = update.notify {
        next.notify = notify;
    }
    if let Some(only_failures) = update.only_failures {
        next.only_failures = only_failures;
    }
    if update.pass_with_no_tests.is_some() {
        next.pass_with_no_tests = true;
    }
    if let Some(reporters) = &update.reporters {
        next.reporters = reporters.clone();
    }
    if let Some(update_snapshot) = update.update_snapshot {
        next.update_snapshot = update_snapshot;
    }
    if let Some(verbose) = update.verbose {
        next.verbose = verbose;
    }

    next
}
