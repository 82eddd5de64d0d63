// src/exec/runner.rs

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::config::RunConfig;
use crate::engine::TestWatcher;
use crate::errors::Result;
use crate::exec::results::AggregatedResult;
use crate::search::Test;
use crate::types::BoxFuture;

/// Everything a runner needs for one run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub run_id: u64,
    pub tests: Vec<Test>,
    pub config: RunConfig,
    /// Polled between test files; once set, no further files are started.
    pub watcher: TestWatcher,
    pub collect_coverage_from: Option<BTreeSet<String>>,
    /// In "only failures" mode, the names that failed last time per file.
    /// Empty otherwise.
    pub enabled_tests: BTreeMap<PathBuf, BTreeSet<String>>,
}

/// Executes a selection of test files.
///
/// Production uses [`CommandRunner`](crate::exec::CommandRunner); tests can
/// plug in a fake that records requests and returns scripted results.
pub trait TestRunner: Send + Sync {
    fn run_tests(&self, request: RunRequest) -> BoxFuture<'_, Result<AggregatedResult>>;
}
