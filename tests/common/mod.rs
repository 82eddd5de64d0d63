#![allow(dead_code)]

pub use testwatch_test_utils::builders;
pub use testwatch_test_utils::fake_runner;
pub use testwatch_test_utils::fake_scm;
pub use testwatch_test_utils::{init_tracing, with_timeout};

use std::sync::{Arc, Mutex};

use regex::Regex;
use tokio::sync::mpsc;

use testwatch::config::RunConfig;
use testwatch::engine::{WatchController, WatchControllerParts, WatchEvent, WatchHandle};
use testwatch::hooks::HookBus;
use testwatch::plugins::{internal_plugins, PluginOutcome, PluginRegistry, PluginRun, UsageRow, WatchPlugin};
use testwatch::terminal::{CaptureBuffer, Key, Terminal};

use crate::common::builders::{index, sample_fs, ProjectConfigBuilder};

/// A controller over the sample project with every built-in plugin.
pub struct Harness {
    pub controller: WatchController,
    pub output: CaptureBuffer,
    pub events: mpsc::UnboundedReceiver<WatchEvent>,
    pub tx: mpsc::UnboundedSender<WatchEvent>,
}

pub fn harness(config: RunConfig) -> Harness {
    harness_with(config, Vec::new(), Vec::new(), true)
}

pub fn harness_with(
    config: RunConfig,
    extra_plugins: Vec<Box<dyn WatchPlugin>>,
    ignore_patterns: Vec<Regex>,
    interactive: bool,
) -> Harness {
    init_tracing();
    let (terminal, output) = Terminal::capture(interactive);
    let (tx, events) = mpsc::unbounded_channel();

    let mut hooks = HookBus::new();
    let mut registry = PluginRegistry::new(internal_plugins(&terminal), &mut hooks);
    registry
        .register_third_party(extra_plugins, &config, &mut hooks)
        .expect("plugins should not conflict");

    let project = ProjectConfigBuilder::new().build();
    let controller = WatchController::new(WatchControllerParts {
        config,
        contexts: vec![index(Arc::clone(&project), &sample_fs())],
        registry,
        hooks,
        terminal,
        handle: WatchHandle::new(tx.clone()),
        watch_path_ignore_patterns: ignore_patterns,
    });

    Harness {
        controller,
        output,
        events,
        tx,
    }
}

/// Minimal third-party plugin bound to one key.
///
/// Records the keys it receives while active; activating it resolves to
/// `outcome` right away.
pub struct StubPlugin {
    name: String,
    key: char,
    consumes_keys: bool,
    outcome: PluginOutcome,
    pub received: Arc<Mutex<Vec<Key>>>,
    pub activations: Arc<Mutex<usize>>,
}

impl StubPlugin {
    pub fn new(name: &str, key: char) -> Self {
        Self {
            name: name.to_string(),
            key,
            consumes_keys: false,
            outcome: PluginOutcome::Rerun,
            received: Arc::default(),
            activations: Arc::default(),
        }
    }

    pub fn consuming(mut self) -> Self {
        self.consumes_keys = true;
        self
    }

    pub fn settles_with(mut self, outcome: PluginOutcome) -> Self {
        self.outcome = outcome;
        self
    }
}

impl WatchPlugin for StubPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn usage_info(&self, _config: &RunConfig) -> Option<UsageRow> {
        Some(UsageRow::new(self.key, format!("run {}", self.name)))
    }

    fn on_key(&mut self, key: &Key) -> bool {
        self.received.lock().unwrap().push(*key);
        self.consumes_keys
    }

    fn run(&mut self, _config: &RunConfig, _handle: &WatchHandle) -> Option<PluginRun> {
        *self.activations.lock().unwrap() += 1;
        let outcome = self.outcome;
        Some(Box::pin(async move { outcome }))
    }
}
