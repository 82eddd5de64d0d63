// src/search/mod.rs

//! Test selection.
//!
//! - [`source`]: [`SearchSource`], which turns a [`RunConfig`](crate::config::RunConfig)
//!   and a [`FileIndex`](crate::haste::FileIndex) into a [`SearchResult`].
//! - [`filter`]: the optional user filter applied to every selection.
//! - [`changed_files`]: the source-control lookup behind "only changed".
//! - [`failed_tests`]: the cache behind "only failures".

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ProjectConfig;

pub mod changed_files;
pub mod filter;
pub mod source;

pub use changed_files::{ChangedFiles, ChangedFilesOptions, ChangedFilesProvider, Scm, ScmChangedFiles};
pub use failed_tests::FailedTestsCache;
pub use filter::{apply_filter, CommandFilter, TestFilter};
pub use source::SearchSource;

/// A test file selected for execution.
#[derive(Debug, Clone)]
pub struct Test {
    pub project: Arc<ProjectConfig>,
    pub path: PathBuf,
    pub duration: Option<Duration>,
}

impl Test {
    pub fn new(project: Arc<ProjectConfig>, path: PathBuf) -> Self {
        Self {
            project,
            path,
            duration: None,
        }
    }
}

/// Per-check match counters, keyed by check name (`roots`, `testMatch`, ...).
pub type Stats = BTreeMap<&'static str, usize>;

/// Outcome of a selection. Never mutated once returned.
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    pub tests: Vec<Test>,
    pub stats: Option<Stats>,
    /// Number of candidate files the stats were computed over.
    pub total: Option<usize>,
    /// "Only changed" was requested but no repository was found in any root.
    pub no_scm: bool,
    /// Requested source paths, relative to the project root.
    pub collect_coverage_from: Option<BTreeSet<String>>,
}

impl SearchResult {
    pub fn from_tests(tests: Vec<Test>) -> Self {
        Self {
            tests,
            ..Self::default()
        }
    }

    pub fn no_scm() -> Self {
        Self {
            no_scm: true,
            ..Self::default()
        }
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.tests.iter().map(|t| t.path.clone()).collect()
    }
}
