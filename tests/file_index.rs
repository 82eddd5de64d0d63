// tests/file_index.rs

mod common;

use std::fs;
use std::path::PathBuf;

use common::builders::{repo_path, sample_fs, ProjectConfigBuilder};
use testwatch::fs::mock::MockFileSystem;
use testwatch::fs::{FileSystem, RealFileSystem};
use testwatch::haste::{ChangeEvent, ChangeKind, FileIndex};

fn build(fs: &MockFileSystem) -> FileIndex {
    FileIndex::build(ProjectConfigBuilder::new().build(), fs).unwrap()
}

#[test]
fn crawl_indexes_sources_tests_and_snapshots() {
    let index = build(&sample_fs());

    assert_eq!(index.len(), 5);
    assert!(index.contains(&repo_path("src/__snapshots__/math.test.js.snap")));
    assert_eq!(
        index.graph().dependents_of(&repo_path("src/math.js")),
        vec![repo_path("src/math.test.js")]
    );
    assert_eq!(
        index.graph().dependencies_of(&repo_path("src/strings.test.js")),
        vec![repo_path("src/strings.js")]
    );
}

#[test]
fn unchanged_content_produces_no_event() {
    let fs = sample_fs();
    let mut index = build(&fs);

    let events = index.apply_changes(&fs, &[repo_path("src/math.js")]);
    assert!(events.is_empty());
}

#[test]
fn modified_imports_rewire_the_graph() {
    let fs = sample_fs();
    let mut index = build(&fs);

    fs.add_file(
        repo_path("src/strings.test.js"),
        "import { add } from './math';\nimport { upper } from './strings';",
    );
    let events = index.apply_changes(&fs, &[repo_path("src/strings.test.js")]);

    assert_eq!(
        events,
        vec![ChangeEvent::new(repo_path("src/strings.test.js"), ChangeKind::Modified)]
    );
    assert_eq!(
        index.graph().dependents_of(&repo_path("src/math.js")),
        vec![repo_path("src/math.test.js"), repo_path("src/strings.test.js")]
    );
}

#[test]
fn added_and_deleted_files_are_reported() {
    let fs = sample_fs();
    let mut index = build(&fs);

    fs.add_file(repo_path("src/dates.js"), "export const now = () => 0;");
    fs.remove_file(repo_path("src/strings.js"));

    let events = index.apply_changes(&fs, &[repo_path("src/dates.js"), repo_path("src/strings.js")]);

    assert_eq!(
        events,
        vec![
            ChangeEvent::new(repo_path("src/dates.js"), ChangeKind::Added),
            ChangeEvent::new(repo_path("src/strings.js"), ChangeKind::Deleted),
        ]
    );
    assert!(index.contains(&repo_path("src/dates.js")));
    assert!(!index.contains(&repo_path("src/strings.js")));
    assert!(index.graph().dependencies_of(&repo_path("src/strings.test.js")).is_empty());
}

#[test]
fn paths_outside_roots_or_extensions_are_ignored() {
    let fs = sample_fs()
        .with_file("/elsewhere/lib.js", "module.exports = 1;")
        .with_file("/repo/README.md", "# readme");
    let mut index = build(&fs);

    let events = index.apply_changes(
        &fs,
        &[PathBuf::from("/elsewhere/lib.js"), repo_path("README.md")],
    );

    assert!(events.is_empty());
    assert_eq!(index.len(), 5);
}

#[test]
fn import_cycles_resolve_each_file_once() {
    let fs = MockFileSystem::new()
        .with_file("/repo/a.js", "import './b';")
        .with_file("/repo/b.js", "import './a';")
        .with_file("/repo/a.test.js", "import './a';");
    let index = build(&fs);

    let related = index.resolve_inverse(&[PathBuf::from("/repo/b.js")], &|p| {
        p.to_string_lossy().ends_with(".test.js")
    });
    assert_eq!(related, vec![PathBuf::from("/repo/a.test.js")]);
}

#[test]
fn real_crawl_skips_vendored_directories() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("src/nested")).unwrap();
    fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
    fs::write(root.join("src/a.js"), "").unwrap();
    fs::write(root.join("src/nested/b.ts"), "").unwrap();
    fs::write(root.join("src/notes.txt"), "").unwrap();
    fs::write(root.join("node_modules/pkg/index.js"), "").unwrap();

    let extensions = vec!["js".to_string(), "ts".to_string()];
    let found = RealFileSystem.crawl(root, &extensions).unwrap();

    assert_eq!(found, vec![root.join("src/a.js"), root.join("src/nested/b.ts")]);
}
