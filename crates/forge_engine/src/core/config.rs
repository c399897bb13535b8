//! # Unified Configuration System
//!
//! Configuration for the engine runtime, loaded from TOML. All sections have
//! sensible defaults so a missing or partial file still produces a usable
//! configuration; `validate()` rejects values that would violate runtime
//! invariants (most importantly a tag capacity beyond the bitmask width).

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::scene::TagMask;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// More tags were requested than the bitmask can hold
    ///
    /// Surfaced at startup; the tag index never widens at runtime.
    #[error("tag capacity {requested} exceeds the {width}-bit tag mask")]
    TagCapacity {
        /// Requested number of tags
        requested: u32,
        /// Width of the tag mask in bits
        width: u32,
    },

    /// A field holds a value outside its valid range
    #[error("invalid configuration value: {0}")]
    Invalid(String),
}

/// Window / surface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Surface width in pixels
    pub width: u32,
    /// Surface height in pixels
    pub height: u32,
    /// Window title
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "Forge Engine".to_string(),
        }
    }
}

/// Frame pacing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Fixed timestep in seconds; `None` uses wall-clock deltas
    pub fixed_delta: Option<f32>,
    /// Target frame rate for performance monitoring
    pub target_fps: f32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            fixed_delta: None,
            target_fps: 60.0,
        }
    }
}

/// Scene behaviour configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    /// Number of tag bits the application intends to use (at most 32)
    pub tag_capacity: u32,
    /// Soft cap on the number of live entities, used for diagnostics
    pub max_entities: usize,
    /// Enable per-frame statistics collection
    pub enable_stats: bool,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            tag_capacity: TagMask::WIDTH,
            max_entities: 10_000,
            enable_stats: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (`error`, `warn`, `info`, `debug`, `trace`)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window / surface settings
    pub window: WindowConfig,
    /// Frame pacing settings
    pub frame: FrameConfig,
    /// Scene settings
    pub scene: SceneSettings,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Parse a configuration from a TOML string and validate it
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file, falling back to defaults for absent fields
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Check invariants that must hold before the engine starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scene.tag_capacity > TagMask::WIDTH {
            return Err(ConfigError::TagCapacity {
                requested: self.scene.tag_capacity,
                width: TagMask::WIDTH,
            });
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(
                "window dimensions must be non-zero".to_string(),
            ));
        }
        if let Some(delta) = self.frame.fixed_delta {
            if delta <= 0.0 {
                return Err(ConfigError::Invalid(
                    "fixed_delta must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scene.tag_capacity, 32);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [window]
            width = 640
            height = 480
            "#,
        )
        .unwrap();

        assert_eq!(config.window.width, 640);
        assert_eq!(config.frame.target_fps, 60.0);
        assert_eq!(config.scene.max_entities, 10_000);
    }

    #[test]
    fn test_tag_capacity_over_mask_width_is_rejected() {
        let result = EngineConfig::from_toml_str(
            r#"
            [scene]
            tag_capacity = 64
            "#,
        );

        assert!(matches!(
            result,
            Err(ConfigError::TagCapacity { requested: 64, width: 32 })
        ));
    }

    #[test]
    fn test_zero_window_size_is_rejected() {
        let mut config = EngineConfig::default();
        config.window.width = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let config = EngineConfig::default();
        let text = toml::to_string(&config).unwrap();
        let back = EngineConfig::from_toml_str(&text).unwrap();
        assert_eq!(back.window.width, config.window.width);
    }
}
