// tests/changed_files.rs

mod common;
use crate::common::{init_tracing, with_timeout};

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use testwatch::search::{ChangedFilesOptions, ChangedFilesProvider, Scm, ScmChangedFiles};

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args([
            "-c",
            "user.name=testwatch",
            "-c",
            "user.email=testwatch@example.com",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .status()
        .expect("failed to spawn git");
    assert!(status.success(), "git {args:?} failed");
}

async fn lookup(root: &Path, options: ChangedFilesOptions) -> Vec<PathBuf> {
    let roots = vec![root.to_path_buf()];
    let changed = with_timeout(ScmChangedFiles.changed_files(&roots, &options))
        .await
        .unwrap();
    assert!(changed.repos[&Scm::Git].contains(root));
    changed.changed_files.into_iter().collect()
}

#[tokio::test]
async fn fresh_repository_reports_untracked_and_staged_files() {
    init_tracing();
    if !git_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    git(&root, &["init", "-q"]);
    fs::write(root.join("a.js"), "export const a = 1;").unwrap();
    fs::write(root.join("b.js"), "export const b = 2;").unwrap();
    git(&root, &["add", "b.js"]);

    let changed = lookup(&root, ChangedFilesOptions::default()).await;

    assert_eq!(changed, vec![root.join("a.js"), root.join("b.js")]);
}

#[tokio::test]
async fn with_ancestor_includes_the_last_commit() {
    init_tracing();
    if !git_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    git(&root, &["init", "-q"]);
    fs::write(root.join("first.js"), "1").unwrap();
    git(&root, &["add", "."]);
    git(&root, &["commit", "-q", "-m", "first"]);
    fs::write(root.join("second.js"), "2").unwrap();
    git(&root, &["add", "."]);
    git(&root, &["commit", "-q", "-m", "second"]);

    assert!(lookup(&root, ChangedFilesOptions::default()).await.is_empty());

    let options = ChangedFilesOptions {
        with_ancestor: true,
        ..ChangedFilesOptions::default()
    };
    assert_eq!(lookup(&root, options).await, vec![root.join("second.js")]);
}
