//! INI configuration for TileForge.
//!
//! Settings are read from `~/.tileforge/config.ini`. Every key is optional;
//! missing keys keep the defaults from [`defaults`].
//!
//! ```ini
//! [store]
//! backend = disk
//! directory = ~/.tileforge/objects
//!
//! [limits]
//! terrain = 4
//! elevation = 8
//! imagery = 4
//!
//! [imagery]
//! provider = satellite
//! url_template = https://tiles.example.com/v1/{z}/{x}/{y}.webp
//! api_key = ...
//! ```

pub mod defaults;
mod file;
mod parser;
mod settings;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ConfigFile, DeliveryMode, DeliverySettings, ElevationIndex, ElevationSettings, ImagerySettings,
    IndexBackend, IndexSettings, LimitsSettings, LoggingSettings, StoreBackend, StoreSettings,
    TerrainSettings,
};
