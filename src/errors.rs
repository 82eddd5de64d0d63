// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TestwatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    /// The user filter returned something other than `{filtered: [{test, message}]}`.
    #[error("Filter {0} did not return a valid test list")]
    InvalidFilterResult(String),

    #[error("Error running filter {filter}: {message}")]
    FilterFailed { filter: String, message: String },

    #[error("Error setting up filter {filter}: {message}")]
    FilterSetup { filter: String, message: String },

    #[error("Changed files lookup failed: {0}")]
    ChangedFiles(String),

    #[error("Changed files must be set when running with -o.")]
    MissingChangedFiles,

    #[error("Watch plugin configuration error\n\n{0}")]
    PluginConflict(String),

    #[error("Failed to initialize watch plugin \"{path}\":\n\n{message}")]
    PluginInit { path: String, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TestwatchError {
    pub(crate) fn invalid_pattern(pattern: &str, err: impl std::fmt::Display) -> Self {
        TestwatchError::InvalidPattern {
            pattern: pattern.to_string(),
            message: err.to_string(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TestwatchError>;
