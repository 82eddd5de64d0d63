// src/plugins/test_name_pattern.rs

use std::sync::{Arc, Mutex};

use regex::RegexBuilder;

use crate::config::{ConfigUpdate, RunConfig};
use crate::engine::usage::active_filters;
use crate::engine::WatchHandle;
use crate::hooks::HookSubscriber;
use crate::plugins::{drive_pattern_prompt, lock, PluginRun, Settle, UsageRow, WatchPlugin};
use crate::terminal::{render_matches, Key, PatternPrompt, PatternView, ScrollOptions, Terminal, TypeaheadSource};
use crate::types::WatchMode;

/// Typeahead over the test names seen in the last completed run.
#[derive(Debug, Default)]
pub struct TestNameSource {
    names: Arc<Mutex<Vec<String>>>,
}

impl TypeaheadSource for TestNameSource {
    fn entity_name(&self) -> &'static str {
        "test name"
    }

    fn on_pattern_change(&mut self, pattern: &str, options: ScrollOptions) -> PatternView {
        let items: Vec<String> = match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(re) if !pattern.is_empty() => lock(&self.names)
                .iter()
                .filter(|name| re.is_match(name))
                .cloned()
                .collect(),
            _ => Vec::new(),
        };
        render_matches(self.entity_name(), "test", pattern, &items, options)
    }
}

/// `t`: filter by a test name regex pattern.
#[derive(Debug)]
pub struct TestNamePatternPlugin {
    prompt: PatternPrompt<TestNameSource>,
    settle: Settle,
    handle: Option<WatchHandle>,
}

impl TestNamePatternPlugin {
    pub fn new(terminal: Terminal) -> Self {
        Self {
            prompt: PatternPrompt::new(terminal, TestNameSource::default()),
            settle: Settle::default(),
            handle: None,
        }
    }
}

impl WatchPlugin for TestNamePatternPlugin {
    fn name(&self) -> &str {
        "TestNamePatternPlugin"
    }

    fn is_internal(&self) -> bool {
        true
    }

    fn apply(&mut self, hooks: &mut HookSubscriber<'_>) {
        let names = Arc::clone(&self.prompt.source().names);
        hooks.on_test_run_complete(move |results| {
            *lock(&names) = results.test_names();
        });
    }

    fn usage_info(&self, _config: &RunConfig) -> Option<UsageRow> {
        Some(UsageRow::new('t', "filter by a test name regex pattern"))
    }

    fn on_key(&mut self, key: &Key) -> bool {
        drive_pattern_prompt(
            &mut self.prompt,
            &mut self.settle,
            self.handle.as_ref(),
            key,
            |pattern| ConfigUpdate {
                mode: Some(WatchMode::Watch),
                test_name_pattern: Some(pattern),
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
