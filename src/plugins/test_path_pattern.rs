// src/plugins/test_path_pattern.rs

use std::sync::{Arc, Mutex};

use regex::RegexBuilder;

use crate::config::{ConfigUpdate, RunConfig};
use crate::engine::usage::active_filters;
use crate::engine::WatchHandle;
use crate::hooks::{HookSubscriber, ProjectTestPaths};
use crate::plugins::{drive_pattern_prompt, lock, PluginRun, Settle, UsageRow, WatchPlugin};
use crate::terminal::{render_matches, Key, PatternPrompt, PatternView, ScrollOptions, Terminal, TypeaheadSource};
use crate::types::WatchMode;

/// Typeahead over the test files reported by the last `fsChange`.
#[derive(Debug, Default)]
pub struct TestPathSource {
    projects: Arc<Mutex<Vec<ProjectTestPaths>>>,
}

impl TestPathSource {
    /// Project-relative paths of the test files matching `pattern`,
    /// case-insensitively. An invalid regex matches nothing.
    pub fn matching_paths(&self, pattern: &str) -> Vec<String> {
        let Ok(re) = RegexBuilder::new(pattern).case_insensitive(true).build() else {
            return Vec::new();
        };
        let projects = lock(&self.projects);
        projects
            .iter()
            .flat_map(|project| {
                project.test_paths.iter().filter_map(|path| {
                    let text = path.to_string_lossy().replace('\\', "/");
                    re.is_match(&text)
                        .then(|| project.config.relative_path(path))
                })
            })
            .collect()
    }
}

impl TypeaheadSource for TestPathSource {
    fn entity_name(&self) -> &'static str {
        "filename"
    }

    fn on_pattern_change(&mut self, pattern: &str, options: ScrollOptions) -> PatternView {
        let items = if pattern.is_empty() {
            Vec::new()
        } else {
            self.matching_paths(pattern)
        };
        render_matches(self.entity_name(), "file", pattern, &items, options)
    }
}

/// `p`: filter by a filename regex pattern.
#[derive(Debug)]
pub struct TestPathPatternPlugin {
    prompt: PatternPrompt<TestPathSource>,
    settle: Settle,
    handle: Option<WatchHandle>,
}

impl TestPathPatternPlugin {
    pub fn new(terminal: Terminal) -> Self {
        Self {
            prompt: PatternPrompt::new(terminal, TestPathSource::default()),
            settle: Settle::default(),
            handle: None,
        }
    }
}

impl WatchPlugin for TestPathPatternPlugin {
    fn name(&self) -> &str {
        "TestPathPatternPlugin"
    }

    fn is_internal(&self) -> bool {
        true
    }

    fn apply(&mut self, hooks: &mut HookSubscriber<'_>) {
        let projects = Arc::clone(&self.prompt.source().projects);
        hooks.on_file_change(move |info| {
            *lock(&projects) = info.projects.clone();
        });
    }

    fn usage_info(&self, _config: &RunConfig) -> Option<UsageRow> {
        Some(UsageRow::new('p', "filter by a filename regex pattern"))
    }

    fn on_key(&mut self, key: &Key) -> bool {
        drive_pattern_prompt(
            &mut self.prompt,
            &mut self.settle,
            self.handle.as_ref(),
            key,
            |pattern| ConfigUpdate {
                mode: Some(WatchMode::Watch),
                test_path_pattern: Some(pattern),
                ..ConfigUpdate::default()
            },
        );
        true
    }

    fn run(&mut self, config: &RunConfig, handle: &WatchHandle) -> Option<PluginRun> {
        self.handle = Some(handle.clone());
        let run = self.settle.arm();
        self.prompt.run(&active_filters(config));
        Some(run)
    }
}
