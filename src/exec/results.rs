// src/exec/results.rs

//! Result model produced by a [`TestRunner`](crate::exec::TestRunner).

use std::path::{Path, PathBuf};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssertionStatus {
    Passed,
    Failed,
    Skipped,
    Todo,
}

/// One test case inside a test file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionResult {
    /// Ancestor titles and the test title joined by spaces.
    pub full_name: String,
    pub title: String,
    pub status: AssertionStatus,
    /// The failure was caused by a snapshot mismatch.
    pub failing_snapshot: bool,
}

impl AssertionResult {
    pub fn new(full_name: impl Into<String>, status: AssertionStatus) -> Self {
        let full_name = full_name.into();
        let title = full_name
            .rsplit(" > ")
            .next()
            .unwrap_or(full_name.as_str())
            .to_string();
        Self {
            full_name,
            title,
            status,
            failing_snapshot: false,
        }
    }

    pub fn with_failing_snapshot(mut self) -> Self {
        self.failing_snapshot = true;
        self
    }
}

/// A test identified by its file and full name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionLocation {
    pub full_name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileSnapshotSummary {
    pub unmatched: u32,
    pub updated: u32,
}

/// Everything known about one executed test file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestFileResult {
    pub test_file_path: PathBuf,
    pub assertions: Vec<AssertionResult>,
    /// Set when the file failed outside of any assertion (crash, syntax error).
    pub failure_message: Option<String>,
    pub snapshot: FileSnapshotSummary,
}

impl TestFileResult {
    pub fn new(path: impl Into<PathBuf>, assertions: Vec<AssertionResult>) -> Self {
        let unmatched = assertions.iter().filter(|a| a.failing_snapshot).count() as u32;
        Self {
            test_file_path: path.into(),
            assertions,
            failure_message: None,
            snapshot: FileSnapshotSummary {
                unmatched,
                updated: 0,
            },
        }
    }

    pub fn num_failing(&self) -> usize {
        self.assertions
            .iter()
            .filter(|a| a.status == AssertionStatus::Failed)
            .count()
    }

    pub fn num_passing(&self) -> usize {
        self.assertions
            .iter()
            .filter(|a| a.status == AssertionStatus::Passed)
            .count()
    }

    pub fn failed(&self) -> bool {
        self.failure_message.is_some() || self.num_failing() > 0
    }

    pub fn path(&self) -> &Path {
        &self.test_file_path
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    /// At least one snapshot did not match.
    pub failure: bool,
    pub unmatched: u32,
    pub updated: u32,
    pub files_unmatched: u32,
}

/// Aggregate of a whole run, handed to `testRunComplete` listeners.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedResult {
    pub test_results: Vec<TestFileResult>,
    pub num_total_tests: usize,
    pub num_passed_tests: usize,
    pub num_failed_tests: usize,
    pub num_total_test_suites: usize,
    pub num_failed_test_suites: usize,
    pub snapshot: SnapshotSummary,
    pub interrupted: bool,
    pub success: bool,
}

impl AggregatedResult {
    pub fn from_files(test_results: Vec<TestFileResult>, interrupted: bool) -> Self {
        let num_total_tests = test_results.iter().map(|r| r.assertions.len()).sum();
        let num_passed_tests = test_results.iter().map(|r| r.num_passing()).sum();
        let num_failed_tests = test_results.iter().map(|r| r.num_failing()).sum();
        let num_failed_test_suites = test_results.iter().filter(|r| r.failed()).count();

        let unmatched: u32 = test_results.iter().map(|r| r.snapshot.unmatched).sum();
        let updated: u32 = test_results.iter().map(|r| r.snapshot.updated).sum();
        let files_unmatched = test_results
            .iter()
            .filter(|r| r.snapshot.unmatched > 0)
            .count() as u32;

        Self {
            num_total_test_suites: test_results.len(),
            test_results,
            num_total_tests,
            num_passed_tests,
            num_failed_tests,
            num_failed_test_suites,
            snapshot: SnapshotSummary {
                failure: unmatched > 0,
                unmatched,
                updated,
                files_unmatched,
            },
            interrupted,
            success: num_failed_test_suites == 0 && !interrupted,
        }
    }

    /// Failed assertions of files with unmatched snapshots, in file order.
    pub fn failed_snapshot_assertions(&self) -> Vec<AssertionLocation> {
        if self.num_failed_tests == 0 {
            return Vec::new();
        }
        self.test_results
            .iter()
            .filter(|file| file.snapshot.unmatched > 0)
            .flat_map(|file| {
                file.assertions
                    .iter()
                    .filter(|a| a.status == AssertionStatus::Failed)
                    .map(|a| AssertionLocation {
                        full_name: a.full_name.clone(),
                        path: file.test_file_path.clone(),
                    })
            })
            .collect()
    }

    /// Full names of every test seen in this run, deduplicated and sorted.
    pub fn test_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .test_results
            .iter()
            .flat_map(|file| file.assertions.iter().map(|a| a.full_name.clone()))
            .collect();
        names.sort();
        names.dedup();
        names
    }
}
