//! TileForge - fetch-through tile cache
//!
//! Serves three kinds of geospatial tiles from a durable object store,
//! generating each tile at most once on a cache miss:
//!
//! - **terrain**: heightfield chunks synthesized locally
//! - **elevation**: SRTM tiles mirrored from a public bulk bucket
//! - **imagery**: raster tiles from a paid tile API
//!
//! Requests flow through a per-kind [`service::TileService`] into the shared
//! [`coordinator::GenerationCoordinator`], which checks the
//! [`index::TileIndex`], deduplicates concurrent misses, bounds origin
//! concurrency per kind, and writes results to the [`store::ObjectStore`]
//! before marking them ready.

pub mod app;
pub mod config;
pub mod coordinator;
pub mod index;
pub mod key;
pub mod logging;
pub mod origin;
pub mod service;
pub mod store;
pub mod terrain;
