//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing logic.

use std::path::PathBuf;

use crate::origin::ApiAuth;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub store: StoreSettings,
    pub index: IndexSettings,
    pub limits: LimitsSettings,
    pub terrain: TerrainSettings,
    pub elevation: ElevationSettings,
    pub imagery: ImagerySettings,
    pub delivery: DeliverySettings,
    pub logging: LoggingSettings,
}

/// Object store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Disk,
    Memory,
}

/// `[store]`
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    /// Root directory for the disk backend.
    pub directory: PathBuf,
}

/// Tile index backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexBackend {
    Sqlite,
    Memory,
}

/// `[index]`
#[derive(Debug, Clone)]
pub struct IndexSettings {
    pub backend: IndexBackend,
    /// Database file for the SQLite backend.
    pub path: PathBuf,
}

/// `[limits]`
#[derive(Debug, Clone)]
pub struct LimitsSettings {
    /// Concurrent terrain syntheses
    pub terrain: usize,
    /// Concurrent elevation downloads
    pub elevation: usize,
    /// Concurrent paid imagery requests
    pub imagery: usize,
    pub wait_timeout_secs: u64,
    pub negative_ttl_secs: u64,
}

/// `[terrain]`
#[derive(Debug, Clone)]
pub struct TerrainSettings {
    /// Generator version embedded in every terrain key
    pub version: u32,
    pub max_resolution: u16,
    pub seed: u64,
}

/// Which index backs the elevation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElevationIndex {
    /// In-memory index seeded from the mirrored objects at startup
    Listing,
    /// The `[index]` backend shared with the other kinds
    Shared,
}

/// `[elevation]`
#[derive(Debug, Clone)]
pub struct ElevationSettings {
    /// Bucket serving `skadi/{band}/{tile}.hgt.gz`
    pub base_url: String,
    pub index: ElevationIndex,
}

/// `[imagery]`
#[derive(Debug, Clone)]
pub struct ImagerySettings {
    pub provider: String,
    /// URL with `{z}`, `{x}` and `{y}` placeholders
    pub url_template: String,
    pub api_key: Option<String>,
    pub auth: ApiAuth,
    pub max_zoom: u8,
}

/// How cached tiles are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    Stream,
    Redirect,
}

/// `[delivery]`
#[derive(Debug, Clone)]
pub struct DeliverySettings {
    pub mode: DeliveryMode,
    /// CDN base URL, required for redirect mode
    pub cdn_base: Option<String>,
}

/// `[logging]`
#[derive(Debug, Clone)]
pub struct LoggingSettings {
    /// Directory receiving the log file
    pub directory: PathBuf,
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
}
