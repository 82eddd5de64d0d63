// src/plugins/registry.rs

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::config::RunConfig;
use crate::errors::{Result, TestwatchError};
use crate::hooks::HookBus;
use crate::plugins::{
    QuitPlugin, TestNamePatternPlugin, TestPathPatternPlugin, UpdateSnapshotsInteractivePlugin,
    UpdateSnapshotsPlugin, UsageRow, WatchPlugin,
};
use crate::terminal::Terminal;

/// The built-in plugins, in the order their usage rows appear.
pub fn internal_plugins(terminal: &Terminal) -> Vec<Box<dyn WatchPlugin>> {
    vec![
        Box::new(TestPathPatternPlugin::new(terminal.clone())),
        Box::new(TestNamePatternPlugin::new(terminal.clone())),
        Box::new(UpdateSnapshotsPlugin::new()),
        Box::new(UpdateSnapshotsInteractivePlugin::new(terminal.clone())),
        Box::new(QuitPlugin::new(terminal.clone())),
    ]
}

struct KeyOwner {
    plugin: String,
    overwritable: bool,
    reserved_for: Option<&'static str>,
}

/// Every registered plugin, internal ones first.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Box<dyn WatchPlugin>>,
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.plugins.iter().map(|p| p.name()))
            .finish()
    }
}

impl PluginRegistry {
    /// Register `plugins` without conflict checks, tapping `hooks` for each.
    pub fn new(plugins: Vec<Box<dyn WatchPlugin>>, hooks: &mut HookBus) -> Self {
        let mut registry = Self::default();
        for plugin in plugins {
            registry.push(plugin, hooks);
        }
        registry
    }

    fn push(&mut self, mut plugin: Box<dyn WatchPlugin>, hooks: &mut HookBus) {
        plugin.apply(&mut hooks.subscriber());
        debug!(plugin = plugin.name(), "watch plugin registered");
        self.plugins.push(plugin);
    }

    /// Register third-party plugins in order.
    ///
    /// A plugin may take over the key of an overwritable internal plugin but
    /// not a reserved one, and two third-party plugins may not share a key.
    pub fn register_third_party(
        &mut self,
        plugins: Vec<Box<dyn WatchPlugin>>,
        config: &RunConfig,
        hooks: &mut HookBus,
    ) -> Result<()> {
        let mut keys: HashMap<char, KeyOwner> = HashMap::new();
        for plugin in &self.plugins {
            let reservation = plugin.reservation();
            let key = reservation
                .and_then(|r| r.key)
                .or_else(|| plugin.usage_info(config).map(|row| row.key));
            let Some(key) = key else {
                continue;
            };
            let reserved_for = reservation.map(|r| r.purpose);
            keys.insert(
                key,
                KeyOwner {
                    plugin: plugin.name().to_string(),
                    overwritable: reserved_for.is_none(),
                    reserved_for,
                },
            );
        }

        for plugin in plugins {
            if let Some(row) = plugin.usage_info(config) {
                check_for_conflicts(&mut keys, plugin.name(), row.key)?;
            }
            self.push(plugin, hooks);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut (dyn WatchPlugin + 'static)> {
        self.plugins.get_mut(index).map(|p| p.as_mut())
    }

    /// Plugins that currently show a usage row, keeping only the last
    /// plugin for each key.
    fn interactive(&self, config: &RunConfig) -> Vec<(usize, UsageRow)> {
        let rows: Vec<Option<UsageRow>> = self.plugins.iter().map(|p| p.usage_info(config)).collect();
        rows.iter()
            .enumerate()
            .filter_map(|(i, row)| {
                let row = row.as_ref()?;
                let shadowed = rows[i + 1..]
                    .iter()
                    .flatten()
                    .any(|later| later.key == row.key);
                (!shadowed).then(|| (i, row.clone()))
            })
            .collect()
    }

    /// Usage rows: internal plugins in registration order, then third-party
    /// plugins by key.
    pub fn sorted_usage_rows(&self, config: &RunConfig) -> Vec<UsageRow> {
        let mut rows = self.interactive(config);
        rows.sort_by(|(a, row_a), (b, row_b)| {
            let internal_a = self.plugins[*a].is_internal();
            let internal_b = self.plugins[*b].is_internal();
            match (internal_a, internal_b) {
                (true, true) => std::cmp::Ordering::Equal,
                (true, false) => std::cmp::Ordering::Less,
                (false, true) => std::cmp::Ordering::Greater,
                (false, false) => row_a.key.cmp(&row_b.key),
            }
        });
        rows.into_iter().map(|(_, row)| row).collect()
    }

    /// Index of the interactive plugin bound to `key`.
    pub fn find_by_key(&self, config: &RunConfig, key: char) -> Option<usize> {
        self.interactive(config)
            .into_iter()
            .find(|(_, row)| row.key == key)
            .map(|(index, _)| index)
    }
}

fn check_for_conflicts(keys: &mut HashMap<char, KeyOwner>, plugin: &str, key: char) -> Result<()> {
    match keys.get(&key) {
        Some(owner) if !owner.overwritable => {
            let message = match owner.reserved_for {
                Some(purpose) => format!(
                    "Watch plugin {plugin} attempted to register key <{key}>,\n  \
                     that is reserved internally for {purpose}.\n  \
                     Please change the configuration key for this plugin."
                ),
                None => format!(
                    "Watch plugins {} and {plugin} both attempted to register key <{key}>.\n  \
                     Please change the key configuration for one of the conflicting plugins to avoid overlap.",
                    owner.plugin
                ),
            };
            Err(TestwatchError::PluginConflict(message))
        }
        _ => {
            keys.insert(
                key,
                KeyOwner {
                    plugin: plugin.to_string(),
                    overwritable: false,
                    reserved_for: None,
                },
            );
            Ok(())
        }
    }
}
