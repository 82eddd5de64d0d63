// tests/selection.rs

mod common;
use crate::common::builders::{index, repo_path, sample_fs, ProjectConfigBuilder, RunConfigBuilder};
use crate::common::init_tracing;

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use testwatch::haste::FileIndex;
use testwatch::search::{ChangedFiles, Scm, SearchSource};

fn sample_source() -> SearchSource {
    SearchSource::new(index(ProjectConfigBuilder::new().build(), &sample_fs()))
}

fn changed(files: &[&str], with_repo: bool) -> ChangedFiles {
    let mut repos = BTreeMap::new();
    repos.insert(
        Scm::Git,
        if with_repo {
            BTreeSet::from([PathBuf::from("/repo")])
        } else {
            BTreeSet::new()
        },
    );
    repos.insert(Scm::Hg, BTreeSet::new());
    ChangedFiles {
        repos,
        changed_files: files.iter().map(|f| repo_path(f)).collect(),
    }
}

#[test]
fn repeated_selection_is_identical() {
    init_tracing();
    let source = sample_source();
    let config = RunConfigBuilder::new().watch_all().build();

    let first = source.get_test_paths(&config, None).unwrap();
    let second = source.get_test_paths(&config, None).unwrap();

    assert_eq!(first.paths(), second.paths());
    assert_eq!(
        first.paths(),
        vec![repo_path("src/math.test.js"), repo_path("src/strings.test.js")]
    );
}

#[test]
fn each_violated_clause_rejects_the_path() {
    let project = ProjectConfigBuilder::new()
        .root("src")
        .test_match(&["**/*.js"])
        .test_regex("test")
        .build();
    let source = SearchSource::new(Arc::new(FileIndex::empty(project)));

    assert!(source.is_test_path(&repo_path("src/a.test.js")));

    // Outside every root.
    assert!(!source.is_test_path(&repo_path("lib/a.test.js")));
    // Fails the glob only.
    assert!(!source.is_test_path(&repo_path("src/a.test.ts")));
    // Fails the regex only.
    assert!(!source.is_test_path(&repo_path("src/a.spec.js")));
    // Ignored by the default `/node_modules/` pattern.
    assert!(!source.is_test_path(&repo_path("src/node_modules/a.test.js")));
}

#[test]
fn only_changed_without_any_repository_reports_no_scm() {
    let source = sample_source();
    let config = RunConfigBuilder::new().build();
    assert!(config.only_changed);

    let without_scm = source
        .get_test_paths(&config, Some(&changed(&[], false)))
        .unwrap();
    assert!(without_scm.no_scm);
    assert!(without_scm.tests.is_empty());

    let nothing_changed = source
        .get_test_paths(&config, Some(&changed(&[], true)))
        .unwrap();
    assert!(!nothing_changed.no_scm);
    assert!(nothing_changed.tests.is_empty());
}

#[test]
fn only_changed_selects_dependents_of_changed_sources() {
    let source = sample_source();
    let config = RunConfigBuilder::new().build();

    let result = source
        .get_test_paths(&config, Some(&changed(&["src/math.js"], true)))
        .unwrap();
    assert_eq!(result.paths(), vec![repo_path("src/math.test.js")]);

    // A changed snapshot selects the test it belongs to.
    let result = source
        .get_test_paths(
            &config,
            Some(&changed(&["src/__snapshots__/math.test.js.snap"], true)),
        )
        .unwrap();
    assert_eq!(result.paths(), vec![repo_path("src/math.test.js")]);
}

#[test]
fn only_changed_requires_changed_files() {
    let source = sample_source();
    let config = RunConfigBuilder::new().build();
    assert!(source.get_test_paths(&config, None).is_err());
}

#[test]
fn related_tests_record_coverage_sources_even_without_matches() {
    let source = sample_source();
    let config = RunConfigBuilder::new()
        .find_related(&["src/a.js"])
        .coverage()
        .build();

    let result = source.get_test_paths(&config, None).unwrap();
    assert!(result.tests.is_empty());
    assert_eq!(
        result.collect_coverage_from,
        Some(BTreeSet::from(["src/a.js".to_string()]))
    );

    let config = RunConfigBuilder::new()
        .find_related(&["src/strings.js"])
        .coverage()
        .build();
    let result = source.get_test_paths(&config, None).unwrap();
    assert_eq!(result.paths(), vec![repo_path("src/strings.test.js")]);
    assert_eq!(
        result.collect_coverage_from,
        Some(BTreeSet::from(["src/strings.js".to_string()]))
    );
}

#[test]
fn explicit_paths_keep_only_test_files() {
    let source = sample_source();
    let config = RunConfigBuilder::new()
        .run_tests_by_path(&["src/math.test.js", "src/math.js"])
        .build();

    let result = source.get_test_paths(&config, None).unwrap();
    assert_eq!(result.paths(), vec![repo_path("src/math.test.js")]);
}

#[test]
fn path_pattern_is_case_insensitive_and_tallies_stats() {
    let source = sample_source();
    let config = RunConfigBuilder::new()
        .watch_all()
        .test_path_pattern("MATH")
        .build();

    let result = source.get_test_paths(&config, None).unwrap();
    assert_eq!(result.paths(), vec![repo_path("src/math.test.js")]);

    let stats = result.stats.expect("pattern selections carry stats");
    assert_eq!(result.total, Some(5));
    assert_eq!(stats.get("testPathPattern"), Some(&3));
    assert_eq!(stats.get("testMatch"), Some(&2));
}

#[test]
fn invalid_path_pattern_is_an_error() {
    let source = sample_source();
    let config = RunConfigBuilder::new().watch_all().test_path_pattern("(").build();
    assert!(source.get_test_paths(&config, None).is_err());
}
