//! Default values and constants for all configuration settings.

use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;
use crate::coordinator::{
    DEFAULT_ELEVATION_LIMIT, DEFAULT_IMAGERY_LIMIT, DEFAULT_NEGATIVE_TTL, DEFAULT_TERRAIN_LIMIT,
    DEFAULT_WAIT_TIMEOUT,
};
use crate::origin::{ApiAuth, DEFAULT_ELEVATION_BASE_URL, DEFAULT_MAX_RESOLUTION, DEFAULT_MAX_ZOOM};

/// Default terrain generator version.
pub const DEFAULT_TERRAIN_VERSION: u32 = 1;

/// Default terrain noise seed.
pub const DEFAULT_TERRAIN_SEED: u64 = 0x7E44_A1F0;

/// Default imagery provider name.
pub const DEFAULT_IMAGERY_PROVIDER: &str = "satellite";

/// Default imagery URL template. Points at a placeholder host; deployments
/// must configure their provider.
pub const DEFAULT_IMAGERY_URL_TEMPLATE: &str = "https://tiles.example.com/v1/{z}/{x}/{y}.webp";

/// Default log filter.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default object store directory (~/.tileforge/objects).
pub fn default_store_directory() -> PathBuf {
    config_directory().join("objects")
}

/// Default SQLite index path (~/.tileforge/index.sqlite).
pub fn default_index_path() -> PathBuf {
    config_directory().join("index.sqlite")
}

/// Default log directory (~/.tileforge/logs).
pub fn default_log_directory() -> PathBuf {
    config_directory().join("logs")
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            store: StoreSettings {
                backend: StoreBackend::Disk,
                directory: default_store_directory(),
            },
            index: IndexSettings {
                backend: IndexBackend::Sqlite,
                path: default_index_path(),
            },
            limits: LimitsSettings {
                terrain: DEFAULT_TERRAIN_LIMIT,
                elevation: DEFAULT_ELEVATION_LIMIT,
                imagery: DEFAULT_IMAGERY_LIMIT,
                wait_timeout_secs: DEFAULT_WAIT_TIMEOUT.as_secs(),
                negative_ttl_secs: DEFAULT_NEGATIVE_TTL.as_secs(),
            },
            terrain: TerrainSettings {
                version: DEFAULT_TERRAIN_VERSION,
                max_resolution: DEFAULT_MAX_RESOLUTION,
                seed: DEFAULT_TERRAIN_SEED,
            },
            elevation: ElevationSettings {
                base_url: DEFAULT_ELEVATION_BASE_URL.to_string(),
                index: ElevationIndex::Listing,
            },
            imagery: ImagerySettings {
                provider: DEFAULT_IMAGERY_PROVIDER.to_string(),
                url_template: DEFAULT_IMAGERY_URL_TEMPLATE.to_string(),
                api_key: None,
                auth: ApiAuth::Query,
                max_zoom: DEFAULT_MAX_ZOOM,
            },
            delivery: DeliverySettings {
                mode: DeliveryMode::Stream,
                cdn_base: None,
            },
            logging: LoggingSettings {
                directory: default_log_directory(),
                level: DEFAULT_LOG_LEVEL.to_string(),
            },
        }
    }
}
