// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::UpdateSnapshot;

/// Command-line arguments for `testwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "testwatch",
    version,
    about = "Interactively re-run the tests affected by your changes.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Testwatch.toml")]
    pub config: String,

    /// Run every test file on each change instead of only the related ones.
    #[arg(long)]
    pub watch_all: bool,

    /// Only run test files whose path matches this regex.
    #[arg(long, value_name = "REGEX")]
    pub test_path_pattern: Option<String>,

    /// Only run tests whose full name matches this regex.
    #[arg(long, short = 't', value_name = "REGEX")]
    pub test_name_pattern: Option<String>,

    /// Start in "only failed tests" mode.
    #[arg(long)]
    pub only_failures: bool,

    /// Find tests related to the given source files.
    #[arg(long)]
    pub find_related_tests: bool,

    /// Treat the positional paths as exact test files.
    #[arg(long)]
    pub run_tests_by_path: bool,

    /// Collect coverage information.
    #[arg(long)]
    pub coverage: bool,

    /// Compare against the last commit instead of the working tree.
    #[arg(long)]
    pub last_commit: bool,

    /// Compare against the given revision.
    #[arg(long, value_name = "REV")]
    pub changed_since: Option<String>,

    /// Also count files changed by the parent of the current commit.
    #[arg(long)]
    pub changed_files_with_ancestor: bool,

    /// Stop a run after this many failing test files.
    #[arg(long, value_name = "N")]
    pub bail: Option<u32>,

    /// Snapshot write policy for the initial run.
    #[arg(long, value_enum, value_name = "MODE")]
    pub update_snapshot: Option<SnapshotArg>,

    /// Force non-interactive output (no banners, no raw keys).
    #[arg(long)]
    pub ci: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TESTWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Paths used by `--find-related-tests` / `--run-tests-by-path`.
    #[arg(value_name = "PATHS")]
    pub paths: Vec<PathBuf>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum SnapshotArg {
    All,
    None,
    New,
}

impl From<SnapshotArg> for UpdateSnapshot {
    fn from(arg: SnapshotArg) -> Self {
        match arg {
            SnapshotArg::All => UpdateSnapshot::All,
            SnapshotArg::None => UpdateSnapshot::None,
            SnapshotArg::New => UpdateSnapshot::New,
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
