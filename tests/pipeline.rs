// tests/pipeline.rs

mod common;
use crate::common::builders::{index, repo_path, sample_fs, ProjectConfigBuilder, RunConfigBuilder};
use crate::common::fake_runner::{failing_results, FakeRunner};
use crate::common::fake_scm::FakeScm;
use crate::common::init_tracing;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde_json::json;

use testwatch::config::RunConfig;
use testwatch::engine::TestWatcher;
use testwatch::errors::{Result, TestwatchError};
use testwatch::exec::{run_tests, RunPlan, RunServices};
use testwatch::hooks::{HookBus, ShouldRunGate};
use testwatch::search::{FailedTestsCache, SearchSource, TestFilter};
use testwatch::terminal::{CaptureBuffer, Terminal};
use testwatch::types::BoxFuture;

struct Setup {
    runner: Arc<FakeRunner>,
    scm: Arc<FakeScm>,
    services: RunServices,
    output: CaptureBuffer,
}

fn setup(scm: FakeScm, filter: Option<Arc<dyn TestFilter>>) -> Setup {
    init_tracing();
    let runner = Arc::new(FakeRunner::new());
    let scm = Arc::new(scm);
    let (terminal, output) = Terminal::capture(true);
    let services = RunServices {
        runner: runner.clone(),
        changed_files: scm.clone(),
        filter,
        terminal,
    };
    Setup {
        runner,
        scm,
        services,
        output,
    }
}

fn plan(config: RunConfig) -> RunPlan {
    plan_with(config, FailedTestsCache::new(), ShouldRunGate::default())
}

fn plan_with(config: RunConfig, failed_tests: FailedTestsCache, gate: ShouldRunGate) -> RunPlan {
    let source = SearchSource::new(index(ProjectConfigBuilder::new().build(), &sample_fs()));
    RunPlan {
        run_id: 1,
        config,
        sources: vec![source],
        watcher: TestWatcher::new(),
        failed_tests,
        gate,
    }
}

/// Answers with a fixed JSON value.
struct JsonFilter(serde_json::Value);

impl TestFilter for JsonFilter {
    fn name(&self) -> &str {
        "json-filter"
    }

    fn filter(&self, _test_paths: Vec<PathBuf>) -> BoxFuture<'_, Result<serde_json::Value>> {
        let answer = self.0.clone();
        Box::pin(async move { Ok(answer) })
    }
}

#[tokio::test]
async fn changed_files_drive_the_default_selection() {
    let s = setup(FakeScm::git("/repo", &[repo_path("src/strings.js")]), None);

    let report = run_tests(plan(RunConfigBuilder::new().build()), &s.services)
        .await
        .unwrap();

    assert!(!report.no_scm);
    assert_eq!(report.results.num_total_test_suites, 1);
    assert_eq!(s.runner.runs()[0].paths, vec![repo_path("src/strings.test.js")]);

    let lookups = s.scm.lookups.lock().unwrap();
    assert_eq!(lookups.len(), 1);
    assert_eq!(lookups[0].0, vec![PathBuf::from("/repo")]);
    assert!(!lookups[0].1.last_commit);
}

#[tokio::test]
async fn watch_all_skips_the_changed_files_lookup() {
    let s = setup(FakeScm::failing(), None);

    run_tests(plan(RunConfigBuilder::new().watch_all().build()), &s.services)
        .await
        .unwrap();

    assert!(s.scm.lookups.lock().unwrap().is_empty());
    assert_eq!(s.runner.runs()[0].paths.len(), 2);
}

#[tokio::test]
async fn missing_repository_reports_no_scm() {
    let s = setup(FakeScm::none(), None);

    let report = run_tests(plan(RunConfigBuilder::new().build()), &s.services)
        .await
        .unwrap();

    assert!(report.no_scm);
    assert_eq!(s.runner.run_count(), 0);
    let out = s.output.plain();
    assert!(out.contains("Only changed files in a git or hg repository can be found."));
    assert!(out.contains("--watch is not supported without git/hg, please use --watchAll"));
    assert!(out.contains("No tests found related to files changed since last commit."));
}

#[tokio::test]
async fn lookup_errors_abort_the_run() {
    let s = setup(FakeScm::failing(), None);

    let err = run_tests(plan(RunConfigBuilder::new().build()), &s.services)
        .await
        .unwrap_err();
    assert!(matches!(err, TestwatchError::ChangedFiles(_)));
    assert_eq!(s.runner.run_count(), 0);
}

#[tokio::test]
async fn only_failures_keeps_last_failing_files() {
    let s = setup(FakeScm::none(), None);
    let mut failed = FailedTestsCache::new();
    failed.set_test_results(&failing_results("/repo/src/math.test.js", "adds").test_results);

    let config = RunConfigBuilder::new().watch_all().only_failures(true).build();
    run_tests(plan_with(config, failed, ShouldRunGate::default()), &s.services)
        .await
        .unwrap();

    assert_eq!(s.runner.runs()[0].paths, vec![repo_path("src/math.test.js")]);
}

#[tokio::test]
async fn only_failures_hands_failing_names_to_the_runner() {
    let s = setup(FakeScm::none(), None);
    let mut failed = FailedTestsCache::new();
    failed.set_test_results(&failing_results("/repo/src/math.test.js", "adds").test_results);

    let config = RunConfigBuilder::new().watch_all().only_failures(true).build();
    run_tests(plan_with(config, failed.clone(), ShouldRunGate::default()), &s.services)
        .await
        .unwrap();
    let enabled = &s.runner.runs()[0].enabled_tests;
    assert_eq!(enabled.len(), 1);
    assert!(enabled[&repo_path("src/math.test.js")].contains("adds"));

    let config = RunConfigBuilder::new().watch_all().build();
    run_tests(plan_with(config, failed, ShouldRunGate::default()), &s.services)
        .await
        .unwrap();
    assert!(s.runner.runs()[1].enabled_tests.is_empty());
}

#[tokio::test]
async fn should_run_listeners_only_see_tests_left_by_only_failures() {
    let s = setup(FakeScm::none(), None);
    let seen: Arc<Mutex<Vec<PathBuf>>> = Arc::new(Mutex::new(Vec::new()));
    let mut hooks = HookBus::new();
    {
        let seen = Arc::clone(&seen);
        hooks.subscriber().should_run_test_suite(move |info| {
            seen.lock().unwrap().push(info.test_path.clone());
            Box::pin(async { true })
        });
    }
    let mut failed = FailedTestsCache::new();
    failed.set_test_results(&failing_results("/repo/src/strings.test.js", "upper").test_results);

    let config = RunConfigBuilder::new().watch_all().only_failures(true).build();
    run_tests(plan_with(config, failed, hooks.should_run_gate()), &s.services)
        .await
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![repo_path("src/strings.test.js")]);
    assert_eq!(s.runner.runs()[0].paths, vec![repo_path("src/strings.test.js")]);
}

#[tokio::test]
async fn with_ancestor_is_forwarded_to_the_lookup() {
    let s = setup(FakeScm::git("/repo", &[]), None);
    let mut config = RunConfigBuilder::new().build();
    config.with_ancestor = true;

    run_tests(plan(config), &s.services).await.unwrap();

    let lookups = s.scm.lookups.lock().unwrap();
    assert!(lookups[0].1.with_ancestor);
}

#[tokio::test]
async fn only_failures_with_nothing_failed_explains_itself() {
    let s = setup(FakeScm::none(), None);
    let mut failed = FailedTestsCache::new();
    failed.set_test_results(&[]);

    let config = RunConfigBuilder::new().watch_all().only_failures(true).build();
    run_tests(plan_with(config, failed, ShouldRunGate::default()), &s.services)
        .await
        .unwrap();

    assert_eq!(s.runner.run_count(), 0);
    let out = s.output.plain();
    assert!(out.contains("No failed test found."));
    assert!(out.contains("Press `f` to quit \"only failed tests\" mode."));
}

#[tokio::test]
async fn filter_narrows_the_selection() {
    let filter = JsonFilter(json!({
        "filtered": [{"test": "/repo/src/strings.test.js", "message": "kept"}]
    }));
    let s = setup(FakeScm::none(), Some(Arc::new(filter) as Arc<dyn TestFilter>));

    run_tests(plan(RunConfigBuilder::new().watch_all().build()), &s.services)
        .await
        .unwrap();

    assert_eq!(s.runner.runs()[0].paths, vec![repo_path("src/strings.test.js")]);
}

#[tokio::test]
async fn malformed_filter_answers_are_errors() {
    let filter: Arc<dyn TestFilter> = Arc::new(JsonFilter(json!({"tests": []})));
    let s = setup(FakeScm::none(), Some(filter));

    let err = run_tests(plan(RunConfigBuilder::new().watch_all().build()), &s.services)
        .await
        .unwrap_err();
    assert!(matches!(err, TestwatchError::InvalidFilterResult(ref name) if name == "json-filter"));
    assert_eq!(
        err.to_string(),
        "Filter json-filter did not return a valid test list"
    );
}

#[tokio::test]
async fn should_run_listeners_veto_suites() {
    let s = setup(FakeScm::none(), None);
    let mut hooks = HookBus::new();
    hooks.subscriber().should_run_test_suite(|info| {
        let keep = !info.test_path.ends_with("math.test.js");
        Box::pin(async move { keep })
    });
    hooks
        .subscriber()
        .should_run_test_suite(|_info| Box::pin(async { true }));

    let config = RunConfigBuilder::new().watch_all().build();
    run_tests(
        plan_with(config, FailedTestsCache::new(), hooks.should_run_gate()),
        &s.services,
    )
    .await
    .unwrap();

    assert_eq!(s.runner.runs()[0].paths, vec![repo_path("src/strings.test.js")]);
}

#[tokio::test]
async fn unmatched_pattern_prints_the_search_stats() {
    let s = setup(FakeScm::none(), None);

    let config = RunConfigBuilder::new().watch_all().test_path_pattern("nomatch").build();
    let report = run_tests(plan(config), &s.services).await.unwrap();

    assert_eq!(report.results.num_total_test_suites, 0);
    assert_eq!(s.runner.run_count(), 0);
    let out = s.output.plain();
    assert!(out.contains("No tests found\nIn /repo\n  5 files checked."));
    assert!(out.contains("  testMatch: "));
    assert!(out.contains(" - 2 matches"));
    assert!(out.contains("Pattern: nomatch - 0 matches"));
}

#[tokio::test]
async fn related_tests_forward_coverage_sources() {
    let s = setup(FakeScm::none(), None);

    let config = RunConfigBuilder::new()
        .find_related(&["src/math.js"])
        .coverage()
        .build();
    run_tests(plan(config), &s.services).await.unwrap();

    let run = &s.runner.runs()[0];
    assert_eq!(run.paths, vec![repo_path("src/math.test.js")]);
    assert_eq!(
        run.collect_coverage_from,
        Some(BTreeSet::from(["src/math.js".to_string()]))
    );
}
