// src/exec/mod.rs

//! Test execution layer.
//!
//! - [`pipeline`]: one run end to end, from changed-file lookup through
//!   selection, filters and the `shouldRunTestSuite` gate to the runner.
//! - [`runner`]: the [`TestRunner`] seam the pipeline hands selections to.
//! - [`command_runner`]: the production runner, one shell command per file.
//! - [`tap`]: parser for the per-file report the command prints.
//! - [`results`]: per-file and aggregated results.

pub mod command_runner;
pub mod pipeline;
pub mod results;
pub mod runner;
pub mod tap;

pub use command_runner::CommandRunner;
pub use pipeline::{run_tests, RunPlan, RunReport, RunServices};
pub use results::{AggregatedResult, AssertionLocation, AssertionResult, AssertionStatus, TestFileResult};
pub use runner::{RunRequest, TestRunner};
