// src/config/mod.rs

//! Configuration for testwatch.
//!
//! - [`model`]: the TOML-backed file model.
//! - [`loader`]: reading a config file from disk.
//! - [`validate`]: checks and compilation into [`ConfigFile`].
//! - [`project`]: compiled per-project matchers.
//! - [`run_config`]: the immutable [`RunConfig`] each run uses.
//! - [`update`]: the pure reducer that derives new `RunConfig`s.

pub mod loader;
pub mod model;
pub mod project;
pub mod run_config;
pub mod update;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{
    ConfigFile, ProjectSection, RawConfigFile, RunnerSection, WatchPluginSection, WatchSection,
};
pub use project::ProjectConfig;
pub use run_config::RunConfig;
pub use update::{update_run_config, ConfigUpdate};
pub use validate::validate_config;
