// src/exec/pipeline.rs

//! One run, end to end: changed files, selection, filters, execution.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use crossterm::style::Stylize;
use tracing::{debug, info};

use crate::config::{ProjectConfig, RunConfig};
use crate::engine::TestWatcher;
use crate::errors::Result;
use crate::exec::results::AggregatedResult;
use crate::exec::runner::{RunRequest, TestRunner};
use crate::hooks::{ShouldRunGate, TestSuiteInfo};
use crate::search::{
    apply_filter, ChangedFiles, ChangedFilesOptions, ChangedFilesProvider, FailedTestsCache,
    SearchResult, SearchSource, Test, TestFilter,
};
use crate::terminal::Terminal;

/// What the controller hands over when it starts a run.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub run_id: u64,
    pub config: RunConfig,
    pub sources: Vec<SearchSource>,
    pub watcher: TestWatcher,
    pub failed_tests: FailedTestsCache,
    pub gate: ShouldRunGate,
}

/// Long-lived collaborators shared by every run.
#[derive(Clone)]
pub struct RunServices {
    pub runner: Arc<dyn TestRunner>,
    pub changed_files: Arc<dyn ChangedFilesProvider>,
    pub filter: Option<Arc<dyn TestFilter>>,
    pub terminal: Terminal,
}

impl std::fmt::Debug for RunServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunServices")
            .field("filter", &self.filter.as_ref().map(|flt| flt.name().to_string()))
            .finish_non_exhaustive()
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub results: AggregatedResult,
    /// "Only changed" found no repository in any root.
    pub no_scm: bool,
}

const NO_SCM_MESSAGE: &str = "Only changed files in a git or hg repository can be found. \
    Run `git init` or `hg init` in the project to run only the tests related to files \
    changed since the last commit.";

/// Run `plan` to completion.
///
/// Selection errors (bad filter answer, failed SCM lookup) abort the run and
/// are returned; the caller reports them and keeps watching.
pub async fn run_tests(plan: RunPlan, services: &RunServices) -> Result<RunReport> {
    let RunPlan {
        run_id,
        config,
        sources,
        watcher,
        failed_tests,
        gate,
    } = plan;

    let changed = resolve_changed_files(&config, &sources, services).await?;

    let mut selections: Vec<(Arc<ProjectConfig>, SearchResult)> = Vec::with_capacity(sources.len());
    let mut no_scm = false;
    for source in &sources {
        let mut result = source.get_test_paths(&config, changed.as_ref())?;
        if let Some(filter) = &services.filter {
            result = apply_filter(filter.as_ref(), result).await?;
        }
        if result.no_scm && result.tests.is_empty() && config.only_changed {
            no_scm = true;
        }
        selections.push((Arc::clone(source.context().project()), result));
    }

    if no_scm {
        services.terminal.write_line(NO_SCM_MESSAGE);
        services.terminal.write_line(&format!(
            "\n{} is not supported without git/hg, please use --watchAll",
            "--watch".bold()
        ));
    }

    let mut candidates: Vec<Test> = Vec::new();
    let mut coverage_from: Option<BTreeSet<String>> = None;
    for (_, result) in &selections {
        candidates.extend(result.tests.iter().cloned());
        if let Some(paths) = &result.collect_coverage_from {
            coverage_from
                .get_or_insert_with(BTreeSet::new)
                .extend(paths.iter().cloned());
        }
    }

    if config.only_failures {
        candidates = failed_tests.filter_tests(candidates);
    }

    let mut tests: Vec<Test> = Vec::with_capacity(candidates.len());
    for test in candidates {
        let info = TestSuiteInfo {
            config: Arc::clone(&test.project),
            duration: test.duration,
            test_path: test.path.clone(),
        };
        if gate.should_run(info).await {
            tests.push(test);
        } else {
            debug!(run_id, path = %test.path.display(), "test suite skipped by shouldRunTestSuite");
        }
    }

    if tests.is_empty() {
        info!(run_id, "no tests selected");
        services
            .terminal
            .write_line(&no_tests_found_message(&config, &selections));
        return Ok(RunReport {
            results: AggregatedResult::from_files(Vec::new(), false),
            no_scm,
        });
    }

    let enabled_tests = if config.only_failures {
        tests
            .iter()
            .filter_map(|t| {
                failed_tests
                    .failing_names(&t.path)
                    .filter(|names| !names.is_empty())
                    .map(|names| (t.path.clone(), names.clone()))
            })
            .collect()
    } else {
        BTreeMap::new()
    };

    let request = RunRequest {
        run_id,
        tests,
        config,
        watcher,
        collect_coverage_from: coverage_from,
        enabled_tests,
    };
    let results = services.runner.run_tests(request).await?;
    Ok(RunReport { results, no_scm })
}

async fn resolve_changed_files(
    config: &RunConfig,
    sources: &[SearchSource],
    services: &RunServices,
) -> Result<Option<ChangedFiles>> {
    if !config.only_changed {
        return Ok(None);
    }

    let roots: Vec<PathBuf> = sources
        .iter()
        .flat_map(|s| s.context().project().roots.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let options = ChangedFilesOptions {
        last_commit: config.last_commit,
        changed_since: config.changed_since.clone(),
        with_ancestor: config.with_ancestor,
    };

    let changed = services.changed_files.changed_files(&roots, &options).await?;
    debug!(
        repos = changed.repos.len(),
        files = changed.changed_files.len(),
        "changed files resolved"
    );
    Ok(Some(changed))
}

fn pluralize(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}

/// Explanation printed when a run selects nothing.
pub fn no_tests_found_message(config: &RunConfig, selections: &[(Arc<ProjectConfig>, SearchResult)]) -> String {
    if config.only_failures {
        return format!(
            "{}\nPress `f` to quit \"only failed tests\" mode.",
            "No failed test found.".bold()
        );
    }
    if config.only_changed {
        return format!(
            "{}\nPress `a` to run all tests, or run with `--watchAll`.",
            "No tests found related to files changed since last commit.".bold()
        );
    }
    if config.find_related_tests && !config.non_flag_args.is_empty() {
        let paths: Vec<String> = config
            .non_flag_args
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        return format!(
            "{}\n  {}",
            "No tests found related to:".bold(),
            paths.join("\n  ")
        );
    }

    let mut message = format!("{}", "No tests found".bold());
    for (project, result) in selections {
        let Some(stats) = &result.stats else {
            continue;
        };
        let _ = write!(
            message,
            "\nIn {}\n  {} checked.",
            project.root_dir.display(),
            pluralize(result.total.unwrap_or_default(), "file", "files")
        );
        for (key, count) in stats {
            let value = match *key {
                "roots" => format!("{:?}", project.roots),
                "testMatch" => format!("{:?}", project.test_match),
                "testPathIgnorePatterns" => format!("{:?}", project.test_path_ignore_patterns),
                "testRegex" => format!("{:?}", project.test_regex),
                "testPathPattern" => continue,
                other => other.to_string(),
            };
            let _ = write!(message, "\n  {key}: {value} - {}", pluralize(*count, "match", "matches"));
        }
    }
    if config.has_test_path_pattern() {
        let _ = write!(
            message,
            "\nPattern: {} - 0 matches",
            config.test_path_pattern.clone().unwrap_or_default().yellow()
        );
    }
    message
}
