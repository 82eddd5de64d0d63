// src/config/project.rs

//! Compiled per-project configuration.

use std::fmt;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;

use crate::config::model::ProjectSection;
use crate::errors::{Result, TestwatchError};

/// One project: its roots plus the compiled test-file matchers.
///
/// Paths are absolute. Matchers are evaluated against the full path string
/// with forward slashes.
#[derive(Clone)]
pub struct ProjectConfig {
    pub name: String,
    pub root_dir: PathBuf,
    pub roots: Vec<PathBuf>,
    pub test_match: Vec<String>,
    pub test_regex: Vec<String>,
    pub test_path_ignore_patterns: Vec<String>,
    pub module_file_extensions: Vec<String>,
    test_match_set: Option<GlobSet>,
    test_regex_set: Vec<Regex>,
    ignore_regex: Option<Regex>,
}

impl fmt::Debug for ProjectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectConfig")
            .field("name", &self.name)
            .field("root_dir", &self.root_dir)
            .field("roots", &self.roots)
            .finish_non_exhaustive()
    }
}

impl ProjectConfig {
    /// Compile a `[[project]]` table. Relative paths resolve against `base_dir`.
    pub fn from_section(section: &ProjectSection, base_dir: &Path) -> Result<Self> {
        let root_dir = match &section.root_dir {
            Some(dir) => absolutize(base_dir, dir),
            None => base_dir.to_path_buf(),
        };

        let roots = if section.roots.is_empty() {
            vec![root_dir.clone()]
        } else {
            section
                .roots
                .iter()
                .map(|r| absolutize(&root_dir, r))
                .collect()
        };

        let test_match_set = if section.test_match.is_empty() {
            None
        } else {
            Some(build_globset(&section.test_match)?)
        };

        let test_regex_set = section
            .test_regex
            .iter()
            .map(|p| Regex::new(p).map_err(|e| TestwatchError::invalid_pattern(p, e)))
            .collect::<Result<Vec<_>>>()?;

        let ignore_regex = if section.test_path_ignore_patterns.is_empty() {
            None
        } else {
            let joined = section.test_path_ignore_patterns.join("|");
            Some(Regex::new(&joined).map_err(|e| TestwatchError::invalid_pattern(&joined, e))?)
        };

        let name = section
            .name
            .clone()
            .unwrap_or_else(|| root_dir.to_string_lossy().into_owned());

        Ok(Self {
            name,
            root_dir,
            roots,
            test_match: section.test_match.clone(),
            test_regex: section.test_regex.clone(),
            test_path_ignore_patterns: section.test_path_ignore_patterns.clone(),
            module_file_extensions: section.module_file_extensions.clone(),
            test_match_set,
            test_regex_set,
            ignore_regex,
        })
    }

    /// Whether `path` lies under one of the configured roots.
    pub fn is_under_roots(&self, path: &Path) -> bool {
        self.roots.iter().any(|root| path.starts_with(root) && path != root)
    }

    /// `None` when no `test_match` globs are configured.
    pub fn matches_test_match(&self, path: &str) -> Option<bool> {
        self.test_match_set.as_ref().map(|set| set.is_match(path))
    }

    /// `None` when no `test_regex` is configured.
    pub fn matches_test_regex(&self, path: &str) -> Option<bool> {
        if self.test_regex_set.is_empty() {
            return None;
        }
        Some(self.test_regex_set.iter().any(|re| re.is_match(path)))
    }

    /// `None` when no ignore pattern is configured; otherwise whether the
    /// path is ignored.
    pub fn matches_ignore(&self, path: &str) -> Option<bool> {
        self.ignore_regex.as_ref().map(|re| re.is_match(path))
    }

    /// Render `path` relative to the project root, with forward slashes.
    pub fn relative_path(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root_dir).unwrap_or(path);
        rel.to_string_lossy().replace('\\', "/")
    }
}

pub(crate) fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        normalize(&base.join(path))
    }
}

/// Lexically drop `.` and resolve `..` components without touching disk.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).map_err(|e| TestwatchError::invalid_pattern(pat, e))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| TestwatchError::invalid_pattern(&patterns.join(", "), e))
}
