// src/search/changed_files.rs

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, trace};

use crate::errors::{Result, TestwatchError};
use crate::types::BoxFuture;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scm {
    Git,
    Hg,
}

impl Scm {
    fn binary(self) -> &'static str {
        match self {
            Scm::Git => "git",
            Scm::Hg => "hg",
        }
    }
}

/// Files changed in every repository found under the requested roots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedFiles {
    /// Repository roots found per source-control system.
    pub repos: BTreeMap<Scm, BTreeSet<PathBuf>>,
    pub changed_files: BTreeSet<PathBuf>,
}

impl ChangedFiles {
    /// False when no repository was found in any root.
    pub fn has_scm(&self) -> bool {
        self.repos.values().any(|roots| !roots.is_empty())
    }
}

/// Which revision range counts as "changed".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedFilesOptions {
    /// Files touched by the last commit.
    pub last_commit: bool,
    /// Files changed since this revision (plus uncommitted changes).
    pub changed_since: Option<String>,
    /// Include the parent commit of HEAD.
    pub with_ancestor: bool,
}

pub trait ChangedFilesProvider: Send + Sync {
    fn changed_files<'a>(
        &'a self,
        roots: &'a [PathBuf],
        options: &'a ChangedFilesOptions,
    ) -> BoxFuture<'a, Result<ChangedFiles>>;
}

/// Asks `git` and `hg` through `tokio::process`.
///
/// A root that is not inside a repository (or whose tool is not installed)
/// simply contributes no repository.
#[derive(Debug, Clone, Default)]
pub struct ScmChangedFiles;

impl ChangedFilesProvider for ScmChangedFiles {
    fn changed_files<'a>(
        &'a self,
        roots: &'a [PathBuf],
        options: &'a ChangedFilesOptions,
    ) -> BoxFuture<'a, Result<ChangedFiles>> {
        Box::pin(async move {
            let mut result = ChangedFiles::default();

            for scm in [Scm::Git, Scm::Hg] {
                let mut repos = BTreeSet::new();
                for root in roots {
                    if let Some(repo) = find_repo(scm, root).await {
                        repos.insert(repo);
                    }
                }
                for repo in &repos {
                    for file in changed_in_repo(scm, repo, options).await? {
                        result.changed_files.insert(file);
                    }
                }
                result.repos.insert(scm, repos);
            }

            debug!(
                changed = result.changed_files.len(),
                has_scm = result.has_scm(),
                "resolved changed files"
            );
            Ok(result)
        })
    }
}

async fn find_repo(scm: Scm, root: &Path) -> Option<PathBuf> {
    let args: &[&str] = match scm {
        Scm::Git => &["rev-parse", "--show-toplevel"],
        Scm::Hg => &["root"],
    };
    let output = Command::new(scm.binary())
        .args(args)
        .current_dir(root)
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        trace!(root = ?root, scm = ?scm, "not a repository");
        return None;
    }
    let top = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!top.is_empty()).then(|| PathBuf::from(top))
}

async fn changed_in_repo(scm: Scm, repo: &Path, options: &ChangedFilesOptions) -> Result<Vec<PathBuf>> {
    let mut queries: Vec<Vec<String>> = Vec::new();
    let since = options
        .changed_since
        .clone()
        .or_else(|| options.with_ancestor.then(|| ancestor_rev(scm).to_string()));

    match scm {
        Scm::Git => {
            if options.last_commit {
                queries.push(args(&["show", "--name-only", "--pretty=format:", "HEAD", "--"]));
            } else {
                if let Some(rev) = &since {
                    queries.push(args(&["diff", "--name-only", &format!("{rev}...HEAD"), "--"]));
                }
                // None of these need HEAD, so a repository without commits works.
                queries.push(args(&["diff", "--cached", "--name-only"]));
                queries.push(args(&["diff", "--name-only"]));
                queries.push(args(&["ls-files", "--others", "--exclude-standard"]));
            }
        }
        Scm::Hg => {
            if options.last_commit {
                queries.push(args(&["status", "-amnu", "--change", "."]));
            } else if let Some(rev) = &since {
                queries.push(args(&["status", "-amnu", "--rev", &format!("ancestor(., {rev})")]));
            } else {
                queries.push(args(&["status", "-amnu"]));
            }
        }
    }

    let mut files = Vec::new();
    for query in queries {
        let output = Command::new(scm.binary())
            .args(&query)
            .current_dir(repo)
            .output()
            .await
            .map_err(|e| TestwatchError::ChangedFiles(format!("{} {}: {e}", scm.binary(), query.join(" "))))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(TestwatchError::ChangedFiles(format!(
                "{} {} failed: {stderr}",
                scm.binary(),
                query.join(" ")
            )));
        }

        files.extend(
            String::from_utf8_lossy(&output.stdout)
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(|l| repo.join(l)),
        );
    }
    Ok(files)
}

fn ancestor_rev(scm: Scm) -> &'static str {
    match scm {
        Scm::Git => "HEAD^",
        Scm::Hg => "min((!public() & ::.)+.^)",
    }
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}
