//! # Session Configuration
//!
//! Loaded once at startup. Every field has a default, so an empty file is
//! a valid config.
//!
//! ```toml
//! [queue]
//! control_to_graphics_capacity = 1048576
//! graphics_to_control_capacity = 1048576
//!
//! [scene]
//! transform_capacity = 1024
//! geometry_capacity = 64
//!
//! [frame]
//! log_frame_reports = false
//! ```

use std::path::Path;

use cadence_core::MEGABYTE;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Initial arena sizes for the two queues, in bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Each arena of the control→graphics queue.
    pub control_to_graphics_capacity: usize,
    /// Each arena of the graphics→control readback queue.
    pub graphics_to_control_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            control_to_graphics_capacity: MEGABYTE,
            graphics_to_control_capacity: MEGABYTE,
        }
    }
}

/// Component table pre-allocation hints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Transforms and meshes.
    pub transform_capacity: usize,
    /// Geometries.
    pub geometry_capacity: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            transform_capacity: 1024,
            geometry_capacity: 64,
        }
    }
}

/// Frame driver options.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Emit an `info` event with the [`crate::FrameReport`] of every frame.
    pub log_frame_reports: bool,
}

/// Everything needed to build a [`crate::Session`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Queue sizing.
    pub queue: QueueConfig,
    /// Table sizing.
    pub scene: SceneConfig,
    /// Frame driver options.
    pub frame: FrameConfig,
}

impl SessionConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for bad TOML, [`ConfigError::Invalid`] for
    /// values that parse but cannot be used.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`SessionConfig::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "session config loaded");
        Ok(config)
    }

    /// Checks values that the type system cannot.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.queue.control_to_graphics_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "queue.control_to_graphics_capacity",
                reason: "must be greater than zero",
            });
        }
        if self.queue.graphics_to_control_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "queue.graphics_to_control_capacity",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = SessionConfig::from_toml_str("").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.queue.control_to_graphics_capacity, MEGABYTE);
    }

    #[test]
    fn test_partial_document_keeps_other_defaults() {
        let config = SessionConfig::from_toml_str(
            "[queue]\ncontrol_to_graphics_capacity = 4096\n[frame]\nlog_frame_reports = true\n",
        )
        .unwrap();
        assert_eq!(config.queue.control_to_graphics_capacity, 4096);
        assert_eq!(config.queue.graphics_to_control_capacity, MEGABYTE);
        assert_eq!(config.scene, SceneConfig::default());
        assert!(config.frame.log_frame_reports);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = SessionConfig::from_toml_str("[queue]\ngraphics_to_control_capacity = 0\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "queue.graphics_to_control_capacity",
                ..
            }
        ));
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let err = SessionConfig::from_toml_str("[queue\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SessionConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_serialized_default_parses_back() {
        let text = toml::to_string(&SessionConfig::default()).unwrap();
        assert_eq!(
            SessionConfig::from_toml_str(&text).unwrap(),
            SessionConfig::default()
        );
    }
}
