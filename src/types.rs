// src/types.rs

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Boxed, sendable future used at the async trait seams (runner, filter,
/// changed-files provider, plugins).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Which files a watch run considers by default.
///
/// - `Watch`: only tests related to files changed since the last commit.
/// - `WatchAll`: every test file, narrowed only by explicit patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum WatchMode {
    #[default]
    Watch,
    WatchAll,
}

impl FromStr for WatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "watch" => Ok(WatchMode::Watch),
            "watchall" | "watch_all" | "watch-all" => Ok(WatchMode::WatchAll),
            other => Err(format!(
                "invalid watch mode: {other} (expected \"watch\" or \"watchAll\")"
            )),
        }
    }
}

/// Snapshot write policy for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UpdateSnapshot {
    /// Rewrite every failing snapshot.
    All,
    /// Never write snapshots.
    None,
    /// Write snapshots that do not exist yet (the interactive default).
    #[default]
    New,
}

impl UpdateSnapshot {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateSnapshot::All => "all",
            UpdateSnapshot::None => "none",
            UpdateSnapshot::New => "new",
        }
    }
}

impl fmt::Display for UpdateSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateSnapshot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(UpdateSnapshot::All),
            "none" => Ok(UpdateSnapshot::None),
            "new" => Ok(UpdateSnapshot::New),
            other => Err(format!(
                "invalid updateSnapshot: {other} (expected \"all\", \"none\" or \"new\")"
            )),
        }
    }
}
