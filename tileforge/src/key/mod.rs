//! Tile keys and elevation tile naming.
//!
//! A [`TileKey`] identifies one tile of one kind and derives the object-store
//! path the tile lives under. Elevation tiles use SRTM naming, where the name
//! encodes the south-west corner of a one-degree cell: `N37W122` covers
//! 37°N..38°N, 122°W..121°W.

mod types;

pub use types::{
    ElevationKey, ImageryKey, KeyError, TerrainKey, TileKey, TileKind, MAX_ELEVATION_LAT,
    MAX_ELEVATION_LON, MIN_ELEVATION_LAT, MIN_ELEVATION_LON,
};

use std::sync::OnceLock;

use regex::Regex;

fn elevation_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([NS])(\d{2})([EW])(\d{3})$").expect("elevation name pattern is valid")
    })
}

/// Formats the SRTM tile name for the cell containing a point.
///
/// # Example
///
/// ```
/// use tileforge::key::elevation_tile_name;
///
/// assert_eq!(elevation_tile_name(37.77, -122.42), "N37W123");
/// assert_eq!(elevation_tile_name(-0.5, 0.5), "S01E000");
/// ```
pub fn elevation_tile_name(lat: f64, lon: f64) -> String {
    let lat = lat.floor() as i32;
    let lon = lon.floor() as i32;
    let ns = if lat < 0 { 'S' } else { 'N' };
    let ew = if lon < 0 { 'W' } else { 'E' };
    format!("{}{:02}{}{:03}", ns, lat.abs(), ew, lon.abs())
}

/// Parses an SRTM tile name into the signed latitude and longitude of its
/// south-west corner.
///
/// Only the syntax is checked; range checks belong to the caller.
pub fn parse_elevation_name(name: &str) -> Result<(i16, i16), KeyError> {
    let upper = name.to_ascii_uppercase();
    let caps = elevation_name_pattern()
        .captures(&upper)
        .ok_or_else(|| KeyError::InvalidElevationName(name.to_string()))?;

    // Digit groups are bounded by the pattern, so these fit in i16.
    let lat: i16 = caps[2]
        .parse()
        .map_err(|_| KeyError::InvalidElevationName(name.to_string()))?;
    let lon: i16 = caps[4]
        .parse()
        .map_err(|_| KeyError::InvalidElevationName(name.to_string()))?;

    let lat = if &caps[1] == "S" { -lat } else { lat };
    let lon = if &caps[3] == "W" { -lon } else { lon };
    Ok((lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_north_west() {
        assert_eq!(parse_elevation_name("N37W122").unwrap(), (37, -122));
    }

    #[test]
    fn test_parse_south_east_lowercase() {
        assert_eq!(parse_elevation_name("s33e151").unwrap(), (-33, 151));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "N37", "X37W122", "N3W122", "N37W1222", "N37 W122"] {
            assert!(
                matches!(
                    parse_elevation_name(bad),
                    Err(KeyError::InvalidElevationName(_))
                ),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_name_for_point_on_cell_boundary() {
        assert_eq!(elevation_tile_name(0.0, 0.0), "N00E000");
        assert_eq!(elevation_tile_name(-90.0, -180.0), "S90W180");
    }

    proptest! {
        #[test]
        fn prop_name_round_trips_to_containing_cell(
            lat in -90.0f64..89.999,
            lon in -180.0f64..179.999,
        ) {
            let name = elevation_tile_name(lat, lon);
            let (cell_lat, cell_lon) = parse_elevation_name(&name).unwrap();
            prop_assert!((cell_lat as f64) <= lat && lat < cell_lat as f64 + 1.0);
            prop_assert!((cell_lon as f64) <= lon && lon < cell_lon as f64 + 1.0);
        }
    }
}
