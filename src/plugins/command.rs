// src/plugins/command.rs

//! Third-party plugins backed by an executable.
//!
//! The executable is called in two ways, always with a JSON document on
//! stdin:
//!
//! - `<path> --usage` with `{"config": <blob>}` once at startup. It prints
//!   `{"key": "x", "prompt": "do something"}` or `null` for no usage row.
//! - `<path> --run` with `{"config": <blob>, "globalConfig": <run config>}`
//!   on activation. It may print `{"update": {...}, "rerun": true}`; both
//!   fields are optional. A non-zero exit cancels the activation.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Deserialize;
use serde_json::json;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::project::absolutize;
use crate::config::{ConfigUpdate, RunConfig, WatchPluginSection};
use crate::engine::WatchHandle;
use crate::errors::{Result, TestwatchError};
use crate::plugins::{PluginOutcome, PluginRun, UsageRow, WatchPlugin};

#[derive(Debug, Deserialize)]
struct UsageAnswer {
    key: String,
    prompt: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RunAnswer {
    update: Option<ConfigUpdate>,
    rerun: bool,
}

#[derive(Debug)]
pub struct CommandPlugin {
    name: String,
    path: PathBuf,
    config: serde_json::Value,
    usage: Option<UsageRow>,
}

impl CommandPlugin {
    /// Resolve `section.path` against `base_dir` and ask the executable for
    /// its usage row.
    pub async fn load(section: &WatchPluginSection, base_dir: &Path) -> Result<Self> {
        let path = absolutize(base_dir, Path::new(&section.path));
        let init_err = |message: String| TestwatchError::PluginInit {
            path: section.path.clone(),
            message,
        };

        let config = serde_json::to_value(&section.config).map_err(|e| init_err(e.to_string()))?;
        let stdout = invoke(&path, "--usage", &json!({ "config": config }))
            .await
            .map_err(init_err)?;

        let answer: Option<UsageAnswer> =
            serde_json::from_slice(&stdout).map_err(|e| init_err(format!("invalid usage answer: {e}")))?;
        let usage = match answer {
            None => None,
            Some(answer) => {
                let mut chars = answer.key.chars();
                match (chars.next(), chars.next()) {
                    (Some(key), None) => Some(UsageRow::new(key, answer.prompt)),
                    _ => {
                        return Err(init_err(format!(
                            "usage key must be a single character, got {:?}",
                            answer.key
                        )));
                    }
                }
            }
        };

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| section.path.clone());
        debug!(plugin = %name, ?usage, "loaded command plugin");

        Ok(Self {
            name,
            path,
            config,
            usage,
        })
    }
}

/// Run `path flag` with `input` on stdin and return its stdout.
async fn invoke(path: &Path, flag: &str, input: &serde_json::Value) -> std::result::Result<Vec<u8>, String> {
    let payload = serde_json::to_vec(input).map_err(|e| e.to_string())?;

    let mut child = Command::new(path)
        .arg(flag)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| format!("could not start {}: {e}", path.display()))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(&payload).await.map_err(|e| e.to_string())?;
    }

    let output = child.wait_with_output().await.map_err(|e| e.to_string())?;
    if !output.status.success() {
        return Err(format!("{} {flag} exited with {}", path.display(), output.status));
    }
    Ok(output.stdout)
}

impl WatchPlugin for CommandPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn usage_info(&self, _config: &RunConfig) -> Option<UsageRow> {
        self.usage.clone()
    }

    fn run(&mut self, config: &RunConfig, handle: &WatchHandle) -> Option<PluginRun> {
        let path = self.path.clone();
        let name = self.name.clone();
        let input = json!({ "config": self.config, "globalConfig": config });
        let handle = handle.clone();

        Some(Box::pin(async move {
            let stdout = match invoke(&path, "--run", &input).await {
                Ok(stdout) => stdout,
                Err(err) => {
                    warn!(plugin = %name, "watch plugin run failed: {err}");
                    return PluginOutcome::Cancelled;
                }
            };

            let answer: RunAnswer = if stdout.iter().all(u8::is_ascii_whitespace) {
                RunAnswer::default()
            } else {
                match serde_json::from_slice(&stdout) {
                    Ok(answer) => answer,
                    Err(err) => {
                        warn!(plugin = %name, "invalid answer from watch plugin: {err}");
                        return PluginOutcome::Cancelled;
                    }
                }
            };

            if let Some(update) = answer.update {
                handle.update_config_and_run(update);
            }
            if answer.rerun {
                PluginOutcome::Rerun
            } else {
                PluginOutcome::NoRerun
            }
        }))
    }
}
