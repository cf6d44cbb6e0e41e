//! Configuration module for TempVis-RS
//!
//! The engine is configured from a single TOML file. Every field has a
//! default, so an empty or partial file is valid.
//!
//! # Config Location
//!
//! The default configuration file lives in the platform-appropriate config
//! directory under `dev.tempvis.tempvis-rs`:
//! - **Linux**: `~/.config/dev.tempvis.tempvis-rs/config.toml`
//! - **macOS**: `~/Library/Application Support/dev.tempvis.tempvis-rs/config.toml`
//! - **Windows**: `%APPDATA%\dev.tempvis.tempvis-rs\config.toml`
//!
//! The `TEMPVIS_CONFIG` environment variable overrides the location.
//!
//! # Example
//!
//! ```toml
//! [tick]
//! interval_ms = 100
//!
//! [channels]
//! initial_count = 4
//!
//! [generator]
//! noise_amplitude = 0.5
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{EngineError, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "dev.tempvis.tempvis-rs";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding the config path
pub const CONFIG_ENV_VAR: &str = "TEMPVIS_CONFIG";

/// Get the application config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Get the path of the config file, honoring `TEMPVIS_CONFIG`
pub fn config_path() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => config_dir().map(|p| p.join(CONFIG_FILE)),
    }
}

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tick loop timing and queue sizes
    pub tick: TickSettings,
    /// Channels created at startup
    pub channels: ChannelSettings,
    /// Shape of the synthetic readings
    pub generator: GeneratorSettings,
    /// History seeded into new channels
    pub backfill: BackfillSettings,
    /// Logging setup for the binary
    pub logging: LoggingSettings,
    /// Console summary for the binary
    pub report: ReportSettings,
}

impl EngineConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load a configuration file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(EngineError::from)
            .with_context(|| format!("Failed to read config file {:?}", path))?;

        Self::from_toml(&content).map_err(|e| e.with_context(format!("{:?}", path)))
    }

    /// Load a configuration file, returning defaults if it is missing or invalid
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No config at {:?}, using defaults", path);
            return Self::default();
        }

        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Load from the default location (see [`config_path`])
    pub fn load_default_location() -> Self {
        match config_path() {
            Some(path) => Self::load_or_default(path),
            None => {
                tracing::warn!("Could not determine config path, using defaults");
                Self::default()
            }
        }
    }

    /// Save the configuration as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(EngineError::from)
                .context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(EngineError::from)
            .with_context(|| format!("Failed to write config file {:?}", path))
    }

    /// Set the tick period
    pub fn with_tick_interval_ms(mut self, interval_ms: u64) -> Self {
        self.tick.interval_ms = interval_ms;
        self
    }

    /// Set the number of channels created at startup
    pub fn with_initial_channels(mut self, count: usize) -> Self {
        self.channels.initial_count = count;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = EngineConfig::from_toml(
            r#"
            [channels]
            initial_count = 3

            [generator]
            noise_amplitude = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.channels.initial_count, 3);
        assert_eq!(config.generator.noise_amplitude, 0.5);
        assert_eq!(config.generator.drift_amplitude, 0.05);
        assert_eq!(config.tick.interval_ms, DEFAULT_TICK_INTERVAL_MS);
        assert_eq!(config.backfill, BackfillSettings::default());
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(EngineConfig::from_toml("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = EngineConfig::from_toml("[tick]\ninterval_ms = \"fast\"").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let config = EngineConfig::default()
            .with_tick_interval_ms(250)
            .with_initial_channels(5);
        config.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("missing.toml"));
        assert!(matches!(err.root(), EngineError::Io(_)));
    }

    #[test]
    fn test_save_into_file_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let err = EngineConfig::default()
            .save(blocker.join(CONFIG_FILE))
            .unwrap_err();
        assert!(matches!(err.root(), EngineError::Io(_)));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load_or_default(dir.path().join("missing.toml"));
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_load_or_default_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "not = [valid").unwrap();
        assert_eq!(EngineConfig::load_or_default(&path), EngineConfig::default());
    }
}
