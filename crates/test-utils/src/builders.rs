#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use testwatch::config::model::ProjectSection;
use testwatch::config::{ProjectConfig, RunConfig};
use testwatch::fs::mock::MockFileSystem;
use testwatch::haste::FileIndex;
use testwatch::types::{UpdateSnapshot, WatchMode};

/// Root every builder defaults to.
pub const REPO_ROOT: &str = "/repo";

/// Builder for a compiled `ProjectConfig`.
pub struct ProjectConfigBuilder {
    base_dir: PathBuf,
    section: ProjectSection,
}

impl ProjectConfigBuilder {
    pub fn new() -> Self {
        Self {
            base_dir: PathBuf::from(REPO_ROOT),
            section: ProjectSection::default(),
        }
    }

    pub fn root_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.section.name = Some(name.to_string());
        self
    }

    pub fn root(mut self, root: &str) -> Self {
        self.section.roots.push(PathBuf::from(root));
        self
    }

    pub fn test_match(mut self, globs: &[&str]) -> Self {
        self.section.test_match = globs.iter().map(|g| g.to_string()).collect();
        self
    }

    pub fn test_regex(mut self, pattern: &str) -> Self {
        self.section.test_regex.push(pattern.to_string());
        self
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.section.test_path_ignore_patterns.push(pattern.to_string());
        self
    }

    pub fn build(self) -> Arc<ProjectConfig> {
        Arc::new(
            ProjectConfig::from_section(&self.section, &self.base_dir)
                .expect("Failed to build project config from builder"),
        )
    }
}

impl Default for ProjectConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Index `fs` for `project`.
pub fn index(project: Arc<ProjectConfig>, fs: &MockFileSystem) -> Arc<FileIndex> {
    Arc::new(FileIndex::build(project, fs).expect("Failed to index mock filesystem"))
}

/// A small JavaScript project: two sources, two tests, one snapshot.
///
/// ```text
/// /repo/src/math.js           <- math.test.js
/// /repo/src/strings.js        <- strings.test.js
/// /repo/src/math.test.js
/// /repo/src/strings.test.js
/// /repo/src/__snapshots__/math.test.js.snap
/// ```
pub fn sample_fs() -> MockFileSystem {
    MockFileSystem::new()
        .with_file("/repo/src/math.js", "export const add = (a, b) => a + b;")
        .with_file("/repo/src/strings.js", "export const upper = (s) => s.toUpperCase();")
        .with_file(
            "/repo/src/math.test.js",
            "import { add } from './math';\ntest('adds', () => expect(add(1, 2)).toBe(3));",
        )
        .with_file(
            "/repo/src/strings.test.js",
            "const { upper } = require('./strings');\ntest('upper', () => {});",
        )
        .with_file("/repo/src/__snapshots__/math.test.js.snap", "exports[`adds 1`] = `3`;")
}

pub fn repo_path(relative: &str) -> PathBuf {
    Path::new(REPO_ROOT).join(relative)
}

/// Builder for `RunConfig` starting from `watch` mode at `/repo`.
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RunConfig::new(WatchMode::Watch, PathBuf::from(REPO_ROOT)),
        }
    }

    pub fn watch_all(mut self) -> Self {
        self.config.mode = WatchMode::WatchAll;
        self.config.only_changed = false;
        self
    }

    pub fn test_path_pattern(mut self, pattern: &str) -> Self {
        self.config.test_path_pattern = Some(pattern.to_string());
        self.config.only_changed = false;
        self
    }

    pub fn test_name_pattern(mut self, pattern: &str) -> Self {
        self.config.test_name_pattern = pattern.to_string();
        self.config.only_changed = false;
        self
    }

    pub fn only_failures(mut self, value: bool) -> Self {
        self.config.only_failures = value;
        self
    }

    pub fn update_snapshot(mut self, value: UpdateSnapshot) -> Self {
        self.config.update_snapshot = value;
        self
    }

    pub fn find_related(mut self, paths: &[&str]) -> Self {
        self.config.find_related_tests = true;
        self.config.only_changed = false;
        self.config.non_flag_args = paths.iter().map(PathBuf::from).collect();
        self
    }

    pub fn run_tests_by_path(mut self, paths: &[&str]) -> Self {
        self.config.run_tests_by_path = true;
        self.config.only_changed = false;
        self.config.non_flag_args = paths.iter().map(PathBuf::from).collect();
        self
    }

    pub fn coverage(mut self) -> Self {
        self.config.collect_coverage = true;
        self
    }

    pub fn build(self) -> RunConfig {
        self.config
    }
}

impl Default for RunConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
