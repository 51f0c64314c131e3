//! Configuration file handling for ~/.tileforge/config.ini.
//!
//! Settings structs live in [`super::settings`], constants in
//! [`super::defaults`], and parsing in [`super::parser`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::coordinator::CoordinatorConfig;
use crate::key::TileKind;
use crate::origin::PaidApiConfig;

use super::settings::*;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigFile {
    /// Load configuration from the default path (~/.tileforge/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Parse configuration from INI text.
    pub fn from_ini_str(content: &str) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_str(content).map_err(ini::Error::Parse)?;
        super::parser::parse_ini(&ini)
    }

    /// Coordinator tuning derived from the `[limits]` section.
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig::new()
            .with_limit(TileKind::Terrain, self.limits.terrain)
            .with_limit(TileKind::Elevation, self.limits.elevation)
            .with_limit(TileKind::Imagery, self.limits.imagery)
            .with_wait_timeout(Duration::from_secs(self.limits.wait_timeout_secs))
            .with_negative_ttl(Duration::from_secs(self.limits.negative_ttl_secs))
    }

    /// Paid imagery provider description from the `[imagery]` section.
    pub fn paid_api_config(&self) -> PaidApiConfig {
        let imagery = &self.imagery;
        let config = PaidApiConfig::new(&imagery.provider, &imagery.url_template)
            .with_zoom_range(0, imagery.max_zoom);
        match &imagery.api_key {
            Some(key) => config.with_api_key(key, imagery.auth),
            None => config,
        }
    }
}

/// Get the path to the config directory (~/.tileforge).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tileforge")
}

/// Get the path to the config file (~/.tileforge/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
