// src/search/filter.rs

use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;

use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::errors::{Result, TestwatchError};
use crate::search::SearchResult;
use crate::types::BoxFuture;

/// A user filter narrowing every selection.
///
/// Implementations receive the candidate test paths and must answer with
/// `{"filtered": [{"test": "<path>", "message": "..."}]}`.
pub trait TestFilter: Send + Sync {
    /// Identifier used in error messages (usually the command line).
    fn name(&self) -> &str;

    fn filter(&self, test_paths: Vec<PathBuf>) -> BoxFuture<'_, Result<serde_json::Value>>;
}

#[derive(Debug, Deserialize)]
struct FilterResult {
    filtered: Vec<FilterEntry>,
}

#[derive(Debug, Deserialize)]
struct FilterEntry {
    test: PathBuf,
    #[serde(default)]
    message: Option<String>,
}

/// Keep only the tests of `result` that `filter` names.
pub async fn apply_filter(filter: &dyn TestFilter, result: SearchResult) -> Result<SearchResult> {
    let raw = filter.filter(result.paths()).await?;
    let parsed: FilterResult = serde_json::from_value(raw)
        .map_err(|_| TestwatchError::InvalidFilterResult(filter.name().to_string()))?;

    for entry in &parsed.filtered {
        if let Some(message) = &entry.message {
            debug!(test = ?entry.test, "filter: {message}");
        }
    }
    let keep: HashSet<PathBuf> = parsed.filtered.into_iter().map(|e| e.test).collect();
    let before = result.tests.len();
    let tests: Vec<_> = result
        .tests
        .into_iter()
        .filter(|t| keep.contains(&t.path))
        .collect();
    debug!(filter = %filter.name(), before, after = tests.len(), "applied test filter");

    Ok(SearchResult { tests, ..result })
}

/// Filter backed by a shell command.
///
/// The candidate paths are written to stdin as a JSON array; stdout must
/// hold the JSON answer.
#[derive(Debug, Clone)]
pub struct CommandFilter {
    command: String,
}

impl CommandFilter {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    async fn run(&self, test_paths: Vec<PathBuf>) -> Result<serde_json::Value> {
        let setup_err = |message: String| TestwatchError::FilterSetup {
            filter: self.command.clone(),
            message,
        };
        let failed = |message: String| TestwatchError::FilterFailed {
            filter: self.command.clone(),
            message,
        };

        let input = serde_json::to_vec(&test_paths).map_err(|e| setup_err(e.to_string()))?;

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| setup_err(e.to_string()))?;

        // stdin is fed concurrently with draining stdout.
        let writer = child.stdin.take().map(|mut stdin| {
            tokio::spawn(async move {
                let written = stdin.write_all(&input).await;
                drop(stdin);
                written
            })
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if let Some(writer) = writer {
            match writer.await {
                Ok(Ok(())) => {}
                // The filter answered without reading every path.
                Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {
                    debug!(filter = %self.command, "filter closed stdin early");
                }
                Ok(Err(e)) => return Err(failed(e.to_string())),
                Err(e) => return Err(failed(e.to_string())),
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(failed(format!("exited with {}: {}", output.status, stderr)));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|_| TestwatchError::InvalidFilterResult(self.command.clone()))
    }
}

impl TestFilter for CommandFilter {
    fn name(&self) -> &str {
        &self.command
    }

    fn filter(&self, test_paths: Vec<PathBuf>) -> BoxFuture<'_, Result<serde_json::Value>> {
        Box::pin(self.run(test_paths))
    }
}
