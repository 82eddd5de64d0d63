use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use testwatch::config::RunConfig;
use testwatch::engine::TestWatcher;
use testwatch::errors::Result;
use testwatch::exec::{
    AggregatedResult, AssertionResult, AssertionStatus, RunRequest, TestFileResult, TestRunner,
};
use testwatch::types::BoxFuture;

/// What the fake runner was asked to do.
#[derive(Debug, Clone)]
pub struct RecordedRun {
    pub run_id: u64,
    pub paths: Vec<PathBuf>,
    pub config: RunConfig,
    pub watcher: TestWatcher,
    pub collect_coverage_from: Option<BTreeSet<String>>,
    pub enabled_tests: BTreeMap<PathBuf, BTreeSet<String>>,
}

/// A fake runner that:
/// - records every request
/// - answers with the next scripted result, or with one passing assertion
///   per selected file once the script runs out
/// - optionally blocks each run until [`FakeRunner::release`] is called.
#[derive(Debug, Default)]
pub struct FakeRunner {
    runs: Arc<Mutex<Vec<RecordedRun>>>,
    scripted: Mutex<VecDeque<AggregatedResult>>,
    gate: Option<Arc<Notify>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every run waits for a `release()` before reporting.
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Notify::new())),
            ..Self::default()
        }
    }

    pub fn with_results(self, results: impl IntoIterator<Item = AggregatedResult>) -> Self {
        self.scripted.lock().unwrap().extend(results);
        self
    }

    /// Let one blocked (or the next) run finish.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn runs(&self) -> Vec<RecordedRun> {
        self.runs.lock().unwrap().clone()
    }

    pub fn run_count(&self) -> usize {
        self.runs.lock().unwrap().len()
    }
}

/// One passing assertion per file.
pub fn passing_results(paths: &[PathBuf]) -> AggregatedResult {
    AggregatedResult::from_files(
        paths
            .iter()
            .map(|p| TestFileResult::new(p, vec![AssertionResult::new("passes", AssertionStatus::Passed)]))
            .collect(),
        false,
    )
}

/// One file whose named assertion fails on an unmatched snapshot.
pub fn snapshot_failure(path: &str, name: &str) -> AggregatedResult {
    AggregatedResult::from_files(
        vec![TestFileResult::new(
            path,
            vec![AssertionResult::new(name, AssertionStatus::Failed).with_failing_snapshot()],
        )],
        false,
    )
}

/// One file with a single plain failing assertion.
pub fn failing_results(path: &str, name: &str) -> AggregatedResult {
    AggregatedResult::from_files(
        vec![TestFileResult::new(
            path,
            vec![AssertionResult::new(name, AssertionStatus::Failed)],
        )],
        false,
    )
}

impl TestRunner for FakeRunner {
    fn run_tests(&self, request: RunRequest) -> BoxFuture<'_, Result<AggregatedResult>> {
        Box::pin(async move {
            let paths: Vec<PathBuf> = request.tests.iter().map(|t| t.path.clone()).collect();
            self.runs.lock().unwrap().push(RecordedRun {
                run_id: request.run_id,
                paths: paths.clone(),
                config: request.config.clone(),
                watcher: request.watcher.clone(),
                collect_coverage_from: request.collect_coverage_from.clone(),
                enabled_tests: request.enabled_tests.clone(),
            });

            if let Some(gate) = &self.gate {
                gate.notified().await;
            }

            let scripted = self.scripted.lock().unwrap().pop_front();
            let mut results = scripted.unwrap_or_else(|| passing_results(&paths));
            if request.watcher.is_interrupted() {
                results.interrupted = true;
                results.success = false;
            }
            Ok(results)
        })
    }
}
