//! # Core Engine Module
//!
//! Shared abstractions used throughout the engine. Currently this holds the
//! unified configuration system; foundation utilities are re-exported for
//! convenience.

pub mod config;

pub use crate::foundation;

pub use config::{ConfigError, EngineConfig, FrameConfig, LoggingConfig, SceneSettings, WindowConfig};
