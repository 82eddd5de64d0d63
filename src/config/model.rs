// src/config/model.rs

use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;

use crate::config::project::ProjectConfig;

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [watch]
/// watch_all = false
/// coverage_directory = "coverage"
///
/// [runner]
/// command = "node {path}"
///
/// [[project]]
/// root_dir = "."
/// roots = ["src"]
/// test_match = ["**/*.test.js"]
///
/// [[watch_plugin]]
/// path = "./scripts/plugin"
/// config = { key = "x" }
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub runner: RunnerSection,

    /// Every `[[project]]` table. An empty list means one implicit project
    /// rooted next to the config file.
    #[serde(default, rename = "project")]
    pub projects: Vec<ProjectSection>,

    /// Third-party plugins from `[[watch_plugin]]`.
    #[serde(default, rename = "watch_plugin")]
    pub watch_plugins: Vec<WatchPluginSection>,
}

/// `[watch]` section: settings of the interactive session itself.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Start in watch-all mode instead of "only changed files".
    #[serde(default)]
    pub watch_all: bool,

    /// Directory coverage reports are written to; changes inside it never
    /// trigger a run.
    #[serde(default = "default_coverage_directory")]
    pub coverage_directory: String,

    /// Regexes for paths whose changes are ignored by the watcher.
    #[serde(default)]
    pub watch_path_ignore_patterns: Vec<String>,

    /// Optional filter command applied to every selection.
    #[serde(default)]
    pub filter: Option<String>,

    /// Stop a run after this many failing test files (0 disables).
    #[serde(default)]
    pub bail: u32,

    /// Milliseconds the watcher waits for more events before emitting a batch.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_coverage_directory() -> String {
    "coverage".to_string()
}

fn default_debounce_ms() -> u64 {
    50
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            watch_all: false,
            coverage_directory: default_coverage_directory(),
            watch_path_ignore_patterns: Vec::new(),
            filter: None,
            bail: 0,
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// `[runner]` section: how a single test file is executed.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerSection {
    /// Shell command; `{path}` is replaced by the absolute test file path.
    #[serde(default = "default_runner_command")]
    pub command: String,
}

fn default_runner_command() -> String {
    "node {path}".to_string()
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            command: default_runner_command(),
        }
    }
}

/// `[[project]]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSection {
    /// Optional display name; defaults to the root directory.
    #[serde(default)]
    pub name: Option<String>,

    /// Project root, relative to the config file directory.
    #[serde(default)]
    pub root_dir: Option<PathBuf>,

    /// Directories searched for tests and sources. Defaults to `[root_dir]`.
    #[serde(default)]
    pub roots: Vec<PathBuf>,

    /// Globs a test file must match (any of them). Empty disables the check.
    #[serde(default = "default_test_match")]
    pub test_match: Vec<String>,

    /// Regexes a test file must match (any of them). Empty disables the check.
    #[serde(default)]
    pub test_regex: Vec<String>,

    /// Regexes excluding test files.
    #[serde(default = "default_ignore_patterns")]
    pub test_path_ignore_patterns: Vec<String>,

    /// Extensions indexed and tried when resolving imports.
    #[serde(default = "default_extensions")]
    pub module_file_extensions: Vec<String>,
}

pub(crate) fn default_test_match() -> Vec<String> {
    vec![
        "**/__tests__/**/*.{js,jsx,ts,tsx,mjs,cjs}".to_string(),
        "**/*.{test,spec}.{js,jsx,ts,tsx,mjs,cjs}".to_string(),
    ]
}

pub(crate) fn default_ignore_patterns() -> Vec<String> {
    vec!["/node_modules/".to_string()]
}

pub(crate) fn default_extensions() -> Vec<String> {
    ["js", "jsx", "ts", "tsx", "mjs", "cjs", "json"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            name: None,
            root_dir: None,
            roots: Vec::new(),
            test_match: default_test_match(),
            test_regex: Vec::new(),
            test_path_ignore_patterns: default_ignore_patterns(),
            module_file_extensions: default_extensions(),
        }
    }
}

/// `[[watch_plugin]]` table: an executable plus its opaque config blob.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchPluginSection {
    pub path: String,

    #[serde(default)]
    pub config: toml::Table,
}

/// Validated configuration.
///
/// Construct via [`ConfigFile::resolve`] (see `validate.rs`); every project
/// has compiled matchers and absolute paths.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub watch: WatchSection,
    pub runner: RunnerSection,
    pub projects: Vec<Arc<ProjectConfig>>,
    pub watch_plugins: Vec<WatchPluginSection>,
    /// Directory the config was loaded from; relative paths resolve here.
    pub base_dir: PathBuf,
}
