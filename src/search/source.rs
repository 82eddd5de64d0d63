// src/search/source.rs

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::config::project::absolutize;
use crate::config::{ProjectConfig, RunConfig};
use crate::errors::{Result, TestwatchError};
use crate::haste::FileIndex;
use crate::search::changed_files::ChangedFiles;
use crate::search::{SearchResult, Stats, Test};

/// One clause of the test-file predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TestPathCase {
    Roots,
    TestMatch,
    TestPathIgnorePatterns,
    TestRegex,
}

impl TestPathCase {
    fn stat(self) -> &'static str {
        match self {
            TestPathCase::Roots => "roots",
            TestPathCase::TestMatch => "testMatch",
            TestPathCase::TestPathIgnorePatterns => "testPathIgnorePatterns",
            TestPathCase::TestRegex => "testRegex",
        }
    }
}

const TEST_PATH_PATTERN_STAT: &str = "testPathPattern";

/// Computes test selections for one project context.
#[derive(Debug, Clone)]
pub struct SearchSource {
    context: Arc<FileIndex>,
    cases: Vec<TestPathCase>,
}

impl SearchSource {
    pub fn new(context: Arc<FileIndex>) -> Self {
        let project = context.project();
        let mut cases = vec![TestPathCase::Roots];
        if !project.test_match.is_empty() {
            cases.push(TestPathCase::TestMatch);
        }
        if !project.test_path_ignore_patterns.is_empty() {
            cases.push(TestPathCase::TestPathIgnorePatterns);
        }
        if !project.test_regex.is_empty() {
            cases.push(TestPathCase::TestRegex);
        }
        Self { context, cases }
    }

    pub fn context(&self) -> &Arc<FileIndex> {
        &self.context
    }

    fn project(&self) -> &Arc<ProjectConfig> {
        self.context.project()
    }

    fn case_matches(&self, case: TestPathCase, path: &Path) -> bool {
        let project = self.project();
        let text = path_text(path);
        match case {
            TestPathCase::Roots => project.is_under_roots(path),
            TestPathCase::TestMatch => project.matches_test_match(&text).unwrap_or(true),
            TestPathCase::TestPathIgnorePatterns => !project.matches_ignore(&text).unwrap_or(false),
            TestPathCase::TestRegex => project.matches_test_regex(&text).unwrap_or(true),
        }
    }

    /// Under a root, matching `test_match` and `test_regex`, not ignored.
    pub fn is_test_path(&self, path: &Path) -> bool {
        self.cases.iter().all(|case| self.case_matches(*case, path))
    }

    fn to_tests(&self, paths: impl IntoIterator<Item = PathBuf>) -> Vec<Test> {
        paths
            .into_iter()
            .map(|path| Test::new(Arc::clone(self.project()), path))
            .collect()
    }

    /// Filter every indexed file, tallying each clause separately.
    fn filter_with_stats(&self, pattern: Option<&Regex>) -> SearchResult {
        let mut stats = Stats::new();
        for case in [
            TestPathCase::Roots,
            TestPathCase::TestMatch,
            TestPathCase::TestPathIgnorePatterns,
            TestPathCase::TestRegex,
        ] {
            stats.insert(case.stat(), 0);
        }
        if pattern.is_some() {
            stats.insert(TEST_PATH_PATTERN_STAT, 0);
        }

        let mut selected = Vec::new();
        let mut total = 0;
        for path in self.context.all_files() {
            total += 1;
            let mut keep = true;
            for case in &self.cases {
                if self.case_matches(*case, path) {
                    *stats.entry(case.stat()).or_default() += 1;
                } else {
                    keep = false;
                }
            }
            if let Some(re) = pattern {
                if re.is_match(&path_text(path)) {
                    *stats.entry(TEST_PATH_PATTERN_STAT).or_default() += 1;
                } else {
                    keep = false;
                }
            }
            if keep {
                selected.push(path.to_path_buf());
            }
        }

        SearchResult {
            tests: self.to_tests(selected),
            stats: Some(stats),
            total: Some(total),
            ..SearchResult::default()
        }
    }

    /// Every test file whose path matches `pattern` (case-insensitive).
    /// The empty pattern matches every test file.
    pub fn find_matching_tests(&self, pattern: &str) -> Result<SearchResult> {
        if pattern.is_empty() {
            return Ok(self.filter_with_stats(None));
        }
        let re = compile_test_path_pattern(pattern)?;
        Ok(self.filter_with_stats(Some(&re)))
    }

    /// Test files transitively depending on `paths`.
    ///
    /// With coverage, `collect_coverage_from` lists the requested paths
    /// relative to the project root.
    pub fn find_related_tests(&self, paths: &BTreeSet<PathBuf>, collect_coverage: bool) -> SearchResult {
        let seeds: Vec<PathBuf> = paths.iter().cloned().collect();
        let related = self
            .context
            .resolve_inverse(&seeds, &|p: &Path| self.is_test_path(p));
        let mut result = SearchResult::from_tests(self.to_tests(related));

        if collect_coverage {
            let project = self.project();
            result.collect_coverage_from =
                Some(paths.iter().map(|p| project.relative_path(p)).collect());
        }
        result
    }

    /// Explicit test files, resolved against `cwd` and kept only if they
    /// pass the test-file predicate.
    pub fn find_tests_by_paths(&self, paths: &[PathBuf], cwd: &Path) -> SearchResult {
        let resolved = paths
            .iter()
            .map(|p| absolutize(cwd, p))
            .filter(|p| self.is_test_path(p));
        SearchResult::from_tests(self.to_tests(resolved))
    }

    pub fn find_related_tests_from_pattern(
        &self,
        paths: &[PathBuf],
        cwd: &Path,
        collect_coverage: bool,
    ) -> SearchResult {
        if paths.is_empty() {
            return SearchResult::default();
        }
        let resolved: BTreeSet<PathBuf> = paths.iter().map(|p| absolutize(cwd, p)).collect();
        self.find_related_tests(&resolved, collect_coverage)
    }

    pub fn find_tests_related_to_changed_files(
        &self,
        changed: &ChangedFiles,
        collect_coverage: bool,
    ) -> SearchResult {
        if !changed.has_scm() {
            return SearchResult::no_scm();
        }
        self.find_related_tests(&changed.changed_files, collect_coverage)
    }

    /// Selection for `config`, in strict precedence: only-changed, explicit
    /// paths, related tests, path pattern, nothing.
    pub fn get_test_paths(&self, config: &RunConfig, changed: Option<&ChangedFiles>) -> Result<SearchResult> {
        if config.only_changed {
            let changed = changed.ok_or(TestwatchError::MissingChangedFiles)?;
            return Ok(self.find_tests_related_to_changed_files(changed, config.collect_coverage));
        }

        let paths = &config.non_flag_args;
        if config.run_tests_by_path && !paths.is_empty() {
            return Ok(self.find_tests_by_paths(paths, &config.cwd));
        }
        if config.find_related_tests && !paths.is_empty() {
            return Ok(self.find_related_tests_from_pattern(
                paths,
                &config.cwd,
                config.collect_coverage,
            ));
        }
        if let Some(pattern) = &config.test_path_pattern {
            debug!(project = %self.project().name, pattern = %pattern, "matching tests by path pattern");
            return self.find_matching_tests(pattern);
        }
        Ok(SearchResult::default())
    }
}

fn compile_test_path_pattern(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| TestwatchError::invalid_pattern(pattern, e))
}

fn path_text(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
