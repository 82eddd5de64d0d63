// src/exec/command_runner.rs

//! Runs each selected test file through a shell command.

use std::collections::BTreeSet;
use std::path::Path;
use std::process::Stdio;

use anyhow::Context;
use crossterm::style::Stylize;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::errors::Result;
use crate::exec::results::{AggregatedResult, AssertionStatus, TestFileResult};
use crate::exec::runner::{RunRequest, TestRunner};
use crate::exec::tap::parse_tap;
use crate::search::Test;
use crate::terminal::Terminal;
use crate::types::BoxFuture;

pub const ENV_TEST_PATH: &str = "TESTWATCH_TEST_PATH";
pub const ENV_TEST_NAME_PATTERN: &str = "TESTWATCH_TEST_NAME_PATTERN";
pub const ENV_UPDATE_SNAPSHOT: &str = "TESTWATCH_UPDATE_SNAPSHOT";
pub const ENV_COVERAGE: &str = "TESTWATCH_COVERAGE";
pub const ENV_COLLECT_COVERAGE_FROM: &str = "TESTWATCH_COLLECT_COVERAGE_FROM";
/// Newline-separated names to run; unset runs every test in the file.
pub const ENV_ENABLED_TESTS: &str = "TESTWATCH_ENABLED_TESTS";

/// Sequential runner: one `sh -c` per test file, `{path}` substituted.
///
/// The command reports results on stdout in TAP form (see
/// [`tap`](crate::exec::tap)); its exit status alone decides pass/fail when
/// no test points are printed.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    command: String,
    terminal: Terminal,
}

impl CommandRunner {
    pub fn new(command: impl Into<String>, terminal: Terminal) -> Self {
        Self {
            command: command.into(),
            terminal,
        }
    }

    fn command_for(&self, path: &Path) -> String {
        self.command.replace("{path}", &shell_quote(&path.to_string_lossy()))
    }

    async fn run_file(
        &self,
        test: &Test,
        config: &RunConfig,
        coverage_from: &str,
        enabled: Option<&BTreeSet<String>>,
    ) -> Result<TestFileResult> {
        let cmd_line = self.command_for(&test.path);
        debug!(path = %test.path.display(), cmd = %cmd_line, "running test file");

        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&cmd_line);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&cmd_line);
            c
        };

        if let Some(names) = enabled {
            let joined: Vec<&str> = names.iter().map(String::as_str).collect();
            cmd.env(ENV_ENABLED_TESTS, joined.join("\n"));
        }

        let output = cmd
            .current_dir(&test.project.root_dir)
            .env(ENV_TEST_PATH, &test.path)
            .env(ENV_TEST_NAME_PATTERN, &config.test_name_pattern)
            .env(ENV_UPDATE_SNAPSHOT, config.update_snapshot.as_str())
            .env(ENV_COVERAGE, if config.collect_coverage { "1" } else { "0" })
            .env(ENV_COLLECT_COVERAGE_FROM, coverage_from)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("running test command for {}", test.path.display()))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let report = parse_tap(&stdout);
        let mut result = TestFileResult::new(test.path.clone(), report.assertions);
        result.snapshot.updated = report.snapshots_updated;

        if !output.status.success() && result.num_failing() == 0 {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            result.failure_message = Some(if stderr.is_empty() {
                format!("Test command exited with {}", output.status)
            } else {
                stderr
            });
        }
        Ok(result)
    }

    fn print_file_result(&self, test: &Test, result: &TestFileResult) {
        let rel = test.project.relative_path(&test.path);
        let badge = if result.failed() {
            " FAIL ".on_red().white().bold().to_string()
        } else {
            " PASS ".on_green().black().bold().to_string()
        };
        self.terminal.write_line(&format!("{badge} {rel}"));

        for assertion in &result.assertions {
            if assertion.status == AssertionStatus::Failed {
                let mark = if assertion.failing_snapshot {
                    " (snapshot)"
                } else {
                    ""
                };
                self.terminal.write_line(&format!(
                    "  {} {}{mark}",
                    "\u{25CF}".red(),
                    assertion.full_name
                ));
            }
        }
        if let Some(message) = &result.failure_message {
            for line in message.lines() {
                self.terminal.write_line(&format!("    {line}"));
            }
        }
    }

    fn print_summary(&self, results: &AggregatedResult) {
        let failed_suites = results.num_failed_test_suites;
        let passed_suites = results.num_total_test_suites - failed_suites;
        let mut suites = Vec::new();
        if failed_suites > 0 {
            suites.push(format!("{failed_suites} failed").red().bold().to_string());
        }
        if passed_suites > 0 {
            suites.push(format!("{passed_suites} passed").green().bold().to_string());
        }
        suites.push(format!("{} total", results.num_total_test_suites));

        let mut tests = Vec::new();
        if results.num_failed_tests > 0 {
            tests.push(format!("{} failed", results.num_failed_tests).red().bold().to_string());
        }
        if results.num_passed_tests > 0 {
            tests.push(format!("{} passed", results.num_passed_tests).green().bold().to_string());
        }
        tests.push(format!("{} total", results.num_total_tests));

        self.terminal.write_line("");
        self.terminal
            .write_line(&format!("{} {}", "Test Suites:".bold(), suites.join(", ")));
        self.terminal
            .write_line(&format!("{}       {}", "Tests:".bold(), tests.join(", ")));

        let snapshot = &results.snapshot;
        if snapshot.unmatched > 0 || snapshot.updated > 0 {
            let mut parts = Vec::new();
            if snapshot.unmatched > 0 {
                parts.push(format!("{} failed", snapshot.unmatched).red().bold().to_string());
            }
            if snapshot.updated > 0 {
                parts.push(format!("{} updated", snapshot.updated).green().bold().to_string());
            }
            self.terminal
                .write_line(&format!("{}   {}", "Snapshots:".bold(), parts.join(", ")));
        }
        if results.interrupted {
            self.terminal.write_line(&"Test run was interrupted.".yellow().to_string());
        }
    }

    async fn run_all(&self, request: RunRequest) -> Result<AggregatedResult> {
        let RunRequest {
            run_id,
            tests,
            config,
            watcher,
            collect_coverage_from,
            enabled_tests,
        } = request;

        let coverage_from = collect_coverage_from
            .map(|paths| paths.into_iter().collect::<Vec<_>>().join(","))
            .unwrap_or_default();

        info!(run_id, count = tests.len(), "running tests");

        let mut results = Vec::with_capacity(tests.len());
        let mut failed_files = 0u32;
        let mut interrupted = false;

        for test in &tests {
            if watcher.is_interrupted() {
                info!(run_id, "run interrupted");
                interrupted = true;
                break;
            }

            let result = match self
                .run_file(test, &config, &coverage_from, enabled_tests.get(&test.path))
                .await
            {
                Ok(result) => result,
                Err(err) => {
                    warn!(run_id, path = %test.path.display(), "test command failed: {err}");
                    let mut result = TestFileResult::new(test.path.clone(), Vec::new());
                    result.failure_message = Some(err.to_string());
                    result
                }
            };

            self.print_file_result(test, &result);
            if result.failed() {
                failed_files += 1;
            }
            results.push(result);

            if config.bail > 0 && failed_files >= config.bail {
                info!(run_id, failed_files, "bail threshold reached; not starting more test files");
                break;
            }
        }

        let aggregated = AggregatedResult::from_files(results, interrupted);
        self.print_summary(&aggregated);
        Ok(aggregated)
    }
}

impl TestRunner for CommandRunner {
    fn run_tests(&self, request: RunRequest) -> BoxFuture<'_, Result<AggregatedResult>> {
        Box::pin(self.run_all(request))
    }
}

/// Single-quote `s` for `sh`.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
