//! Tile index: durable per-tile status bookkeeping.
//!
//! The index records whether a tile is `Ready` in the object store, and with
//! what size and checksum, so the coordinator can serve cache hits without
//! touching the origin. Backends:
//!
//! - [`SqliteTileIndex`] persists records in a SQLite table
//! - [`MemoryTileIndex`] keeps records for the life of the process
//! - [`ListingTileIndex`] is seeded from an object-store listing at startup

mod listing;
mod memory;
mod sqlite;
mod traits;

pub use listing::{ListingTileIndex, ELEVATION_PREFIX};
pub use memory::MemoryTileIndex;
pub use sqlite::SqliteTileIndex;
pub use traits::{IndexError, TileIndex, TileRecord, TileStatus};
