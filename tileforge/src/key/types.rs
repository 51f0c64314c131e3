//! Tile key types.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::terrain::encoded_len;

/// Southernmost valid SRTM tile latitude (tiles are named by their SW corner).
pub const MIN_ELEVATION_LAT: i16 = -90;

/// Northernmost valid SRTM tile latitude.
pub const MAX_ELEVATION_LAT: i16 = 89;

/// Westernmost valid SRTM tile longitude.
pub const MIN_ELEVATION_LON: i16 = -180;

/// Easternmost valid SRTM tile longitude.
pub const MAX_ELEVATION_LON: i16 = 179;

/// Errors raised while building or parsing tile keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// Elevation tile name does not follow the `N37W122` pattern.
    #[error("invalid elevation tile name '{0}'")]
    InvalidElevationName(String),

    /// A coordinate segment could not be parsed.
    #[error("invalid {name} '{value}'")]
    InvalidCoordinate { name: &'static str, value: String },

    /// Wrong number of coordinate segments for the tile kind.
    #[error("{kind} tiles take {expected} coordinate segments, got {actual}")]
    WrongSegmentCount {
        kind: TileKind,
        expected: usize,
        actual: usize,
    },

    /// Unknown tile kind discriminator.
    #[error("unknown tile kind '{0}'")]
    UnknownKind(String),
}

/// Tile kind discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TileKind {
    /// Procedurally generated terrain chunks.
    Terrain,
    /// Elevation tiles from the public SRTM bucket.
    Elevation,
    /// Rendered imagery from a paid tile provider.
    Imagery,
}

impl TileKind {
    /// All tile kinds, in discriminator order.
    pub const ALL: [TileKind; 3] = [TileKind::Terrain, TileKind::Elevation, TileKind::Imagery];

    /// Stable lowercase name used in index rows, config keys and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            TileKind::Terrain => "terrain",
            TileKind::Elevation => "elevation",
            TileKind::Imagery => "imagery",
        }
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TileKind {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "terrain" => Ok(TileKind::Terrain),
            "elevation" | "dem" => Ok(TileKind::Elevation),
            "imagery" => Ok(TileKind::Imagery),
            _ => Err(KeyError::UnknownKind(s.to_string())),
        }
    }
}

/// Terrain chunk coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TerrainKey {
    /// Generator version; bumping it invalidates every stored chunk.
    pub version: u32,
    /// Layer name (e.g. `terrain`).
    pub layer: String,
    /// Samples per chunk edge, minus one.
    pub resolution: u16,
    /// Chunk column (east-west).
    pub x: i32,
    /// Chunk row (north-south).
    pub z: i32,
}

/// One-degree SRTM elevation tile.
///
/// The name is kept verbatim; latitude and longitude are the signed values
/// of its south-west corner. Construction only checks the syntax, so names
/// such as `S91E181` are representable and simply have no data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElevationKey {
    name: String,
    lat: i16,
    lon: i16,
}

impl ElevationKey {
    /// Parses an SRTM tile name such as `N37W122`.
    pub fn parse(name: &str) -> Result<Self, KeyError> {
        let (lat, lon) = super::parse_elevation_name(name)?;
        Ok(Self {
            name: name.to_ascii_uppercase(),
            lat,
            lon,
        })
    }

    /// Builds the key of the tile containing the given point.
    pub fn containing(lat: f64, lon: f64) -> Result<Self, KeyError> {
        Self::parse(&super::elevation_tile_name(lat, lon))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lat(&self) -> i16 {
        self.lat
    }

    pub fn lon(&self) -> i16 {
        self.lon
    }

    /// Returns true when the tile lies on the globe.
    pub fn is_in_range(&self) -> bool {
        (MIN_ELEVATION_LAT..=MAX_ELEVATION_LAT).contains(&self.lat)
            && (MIN_ELEVATION_LON..=MAX_ELEVATION_LON).contains(&self.lon)
    }

    /// Latitude band directory used by the bulk dataset (`N37`).
    pub fn band(&self) -> &str {
        &self.name[..3]
    }
}

/// Web Mercator imagery tile from a named provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageryKey {
    pub provider: String,
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

/// Identity of a single tile across every tile kind.
///
/// Keys are immutable and are the sole identity used for deduplication,
/// limiter accounting and storage addressing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TileKey {
    Terrain(TerrainKey),
    Elevation(ElevationKey),
    Imagery(ImageryKey),
}

impl TileKey {
    /// Terrain key for the default `terrain` layer.
    pub fn terrain(version: u32, resolution: u16, x: i32, z: i32) -> Self {
        TileKey::Terrain(TerrainKey {
            version,
            layer: "terrain".to_string(),
            resolution,
            x,
            z,
        })
    }

    pub fn elevation(name: &str) -> Result<Self, KeyError> {
        ElevationKey::parse(name).map(TileKey::Elevation)
    }

    pub fn imagery(provider: impl Into<String>, zoom: u8, x: u32, y: u32) -> Self {
        TileKey::Imagery(ImageryKey {
            provider: provider.into(),
            zoom,
            x,
            y,
        })
    }

    pub fn kind(&self) -> TileKind {
        match self {
            TileKey::Terrain(_) => TileKind::Terrain,
            TileKey::Elevation(_) => TileKind::Elevation,
            TileKey::Imagery(_) => TileKind::Imagery,
        }
    }

    /// Hierarchical object-store key for this tile.
    ///
    /// - Terrain: `chunks/{version}/{layer}/r{res}/{x}/{z}.bin`
    /// - Imagery: `imagery/{provider}/{z}/{x}/{y}.webp`
    /// - Elevation: `dem/srtm/{tile}.hgt`
    pub fn object_key(&self) -> String {
        match self {
            TileKey::Terrain(k) => format!(
                "chunks/{}/{}/r{}/{}/{}.bin",
                k.version, k.layer, k.resolution, k.x, k.z
            ),
            TileKey::Imagery(k) => {
                format!("imagery/{}/{}/{}/{}.webp", k.provider, k.zoom, k.x, k.y)
            }
            TileKey::Elevation(k) => format!("dem/srtm/{}.hgt", k.name),
        }
    }

    /// Payload size the origin must produce, when the kind defines one.
    pub fn expected_payload_size(&self) -> Option<usize> {
        match self {
            TileKey::Terrain(k) => Some(encoded_len(k.resolution)),
            TileKey::Elevation(_) | TileKey::Imagery(_) => None,
        }
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileKey::Terrain(k) => write!(
                f,
                "terrain:v{}:{}:r{}:{}:{}",
                k.version, k.layer, k.resolution, k.x, k.z
            ),
            TileKey::Elevation(k) => write!(f, "elevation:{}", k.name),
            TileKey::Imagery(k) => {
                write!(f, "imagery:{}:{}:{}:{}", k.provider, k.zoom, k.x, k.y)
            }
        }
    }
}
