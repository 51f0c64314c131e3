//! Key schemes: raw request coordinates to tile keys.
//!
//! Each tile service parses `/`-separated path segments with its own scheme:
//!
//! | Kind      | Raw form                        | Example       |
//! |-----------|---------------------------------|---------------|
//! | terrain   | `{res}/{x}/{z}`                 | `64/0/-3`     |
//! | elevation | `{tile}` or `{lat}/{lon}`       | `N37W122`     |
//! | imagery   | `{z}/{x}/{y}`                   | `12/655/1583` |

use std::str::FromStr;

use crate::key::{ElevationKey, KeyError, TileKey, TileKind};
use crate::origin::within_world;

/// Parses raw coordinates for one tile kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyScheme {
    Terrain { version: u32, max_resolution: u16 },
    Elevation,
    Imagery { provider: String, max_zoom: u8 },
}

impl KeyScheme {
    pub fn kind(&self) -> TileKind {
        match self {
            KeyScheme::Terrain { .. } => TileKind::Terrain,
            KeyScheme::Elevation => TileKind::Elevation,
            KeyScheme::Imagery { .. } => TileKind::Imagery,
        }
    }

    /// Parses a raw path such as `64/0/-3` into a key.
    ///
    /// Leading, trailing and doubled slashes are ignored.
    pub fn parse(&self, raw: &str) -> Result<TileKey, KeyError> {
        let segments: Vec<&str> = raw.split('/').filter(|s| !s.is_empty()).collect();

        match self {
            KeyScheme::Terrain {
                version,
                max_resolution,
            } => {
                let [res, x, z] = self.expect_segments::<3>(&segments)?;
                let resolution: u16 = number("resolution", res)?;
                if resolution == 0 || resolution > *max_resolution {
                    return Err(invalid("resolution", res));
                }
                let x: i32 = number("x", x)?;
                let z: i32 = number("z", z)?;
                if !within_world(x) {
                    return Err(invalid("x", &x.to_string()));
                }
                if !within_world(z) {
                    return Err(invalid("z", &z.to_string()));
                }
                Ok(TileKey::terrain(*version, resolution, x, z))
            }
            KeyScheme::Elevation => match segments.as_slice() {
                [name] => TileKey::elevation(name),
                [lat, lon] => {
                    let lat: f64 = number("latitude", lat)?;
                    let lon: f64 = number("longitude", lon)?;
                    if !(-90.0..90.0).contains(&lat) {
                        return Err(invalid("latitude", &lat.to_string()));
                    }
                    if !(-180.0..180.0).contains(&lon) {
                        return Err(invalid("longitude", &lon.to_string()));
                    }
                    ElevationKey::containing(lat, lon).map(TileKey::Elevation)
                }
                _ => Err(KeyError::WrongSegmentCount {
                    kind: TileKind::Elevation,
                    expected: 1,
                    actual: segments.len(),
                }),
            },
            KeyScheme::Imagery { provider, max_zoom } => {
                let [z, x, y] = self.expect_segments::<3>(&segments)?;
                let zoom: u8 = number("zoom", z)?;
                if zoom > *max_zoom {
                    return Err(invalid("zoom", z));
                }
                let x: u32 = number("x", x)?;
                let y: u32 = number("y", y)?;
                let extent = 1u64.checked_shl(u32::from(zoom)).unwrap_or(u64::MAX);
                if u64::from(x) >= extent {
                    return Err(invalid("x", &x.to_string()));
                }
                if u64::from(y) >= extent {
                    return Err(invalid("y", &y.to_string()));
                }
                Ok(TileKey::imagery(provider.clone(), zoom, x, y))
            }
        }
    }

    fn expect_segments<'a, const N: usize>(
        &self,
        segments: &[&'a str],
    ) -> Result<[&'a str; N], KeyError> {
        <[&str; N]>::try_from(segments).map_err(|_| KeyError::WrongSegmentCount {
            kind: self.kind(),
            expected: N,
            actual: segments.len(),
        })
    }
}

fn invalid(name: &'static str, value: &str) -> KeyError {
    KeyError::InvalidCoordinate {
        name,
        value: value.to_string(),
    }
}

fn number<T: FromStr>(name: &'static str, value: &str) -> Result<T, KeyError> {
    value.parse().map_err(|_| invalid(name, value))
}
