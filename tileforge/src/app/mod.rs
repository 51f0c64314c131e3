//! Application bootstrap.
//!
//! [`TileForgeApp`] turns a [`ConfigFile`](crate::config::ConfigFile) into
//! three ready-to-use tile services sharing one store, one index and one
//! generation coordinator.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        TileForgeApp                          │
//! │                                                              │
//! │  TileService(terrain) ───┐                                   │
//! │  TileService(elevation) ─┼──► GenerationCoordinator          │
//! │  TileService(imagery) ───┘      ├── per-kind limiters        │
//! │                                 └── in-flight table          │
//! │                                                              │
//! │  ObjectStore (disk | memory)   TileIndex (sqlite | memory)   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod bootstrap;
mod error;

pub use bootstrap::TileForgeApp;
pub use error::AppError;
