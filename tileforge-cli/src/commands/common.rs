//! Common types and utilities shared across CLI commands.

use std::path::Path;

use clap::ValueEnum;
use tileforge::config::ConfigFile;
use tileforge::key::TileKind;

use crate::error::CliError;

/// Tile kind selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum KindArg {
    /// Synthesized terrain chunks: `{res}/{x}/{z}`
    Terrain,
    /// SRTM elevation tiles: `{tile}` or `{lat}/{lon}`
    Elevation,
    /// Paid imagery tiles: `{z}/{x}/{y}`
    Imagery,
}

impl From<KindArg> for TileKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Terrain => TileKind::Terrain,
            KindArg::Elevation => TileKind::Elevation,
            KindArg::Imagery => TileKind::Imagery,
        }
    }
}

/// Load configuration from `--config` or the default location.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    Ok(config)
}
