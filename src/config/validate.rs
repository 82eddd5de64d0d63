// src/config/validate.rs

use std::path::Path;
use std::sync::Arc;

use regex::Regex;

use crate::config::model::{ConfigFile, ProjectSection, RawConfigFile};
use crate::config::project::ProjectConfig;
use crate::errors::{Result, TestwatchError};

impl ConfigFile {
    /// Validate a raw config and compile its projects.
    ///
    /// `base_dir` is the directory relative paths are resolved against
    /// (normally the directory containing the config file).
    pub fn resolve(raw: RawConfigFile, base_dir: &Path) -> Result<Self> {
        validate_raw_config(&raw)?;

        let sections = if raw.projects.is_empty() {
            vec![ProjectSection::default()]
        } else {
            raw.projects.clone()
        };

        let projects = sections
            .iter()
            .map(|section| ProjectConfig::from_section(section, base_dir).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;

        Ok(ConfigFile {
            watch: raw.watch,
            runner: raw.runner,
            projects,
            watch_plugins: raw.watch_plugins,
            base_dir: base_dir.to_path_buf(),
        })
    }
}

/// Run every structural check that does not need the filesystem.
pub fn validate_config(raw: &RawConfigFile) -> Result<()> {
    validate_raw_config(raw)
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_watch_section(cfg)?;
    validate_runner(cfg)?;
    validate_plugins(cfg)?;
    Ok(())
}

fn validate_watch_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.coverage_directory.trim().is_empty() {
        return Err(TestwatchError::ConfigError(
            "[watch].coverage_directory must not be empty".to_string(),
        ));
    }

    for pattern in &cfg.watch.watch_path_ignore_patterns {
        Regex::new(pattern).map_err(|e| TestwatchError::invalid_pattern(pattern, e))?;
    }

    if let Some(filter) = &cfg.watch.filter {
        if filter.trim().is_empty() {
            return Err(TestwatchError::ConfigError(
                "[watch].filter must not be an empty command".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_runner(cfg: &RawConfigFile) -> Result<()> {
    if cfg.runner.command.trim().is_empty() {
        return Err(TestwatchError::ConfigError(
            "[runner].command must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_plugins(cfg: &RawConfigFile) -> Result<()> {
    for plugin in &cfg.watch_plugins {
        if plugin.path.trim().is_empty() {
            return Err(TestwatchError::ConfigError(
                "[[watch_plugin]] entries need a non-empty `path`".to_string(),
            ));
        }
    }
    Ok(())
}
