//! Session error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a [`crate::SessionConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The text is not valid TOML for a session config.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field parsed but holds an unusable value.
    #[error("config field `{field}` {reason}")]
    Invalid {
        /// Dotted field path.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// Result type for config loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
