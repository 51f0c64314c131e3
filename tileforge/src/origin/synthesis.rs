//! Local terrain synthesis origin.
//!
//! Produces terrain chunk payloads from a deterministic generator. Generation
//! is CPU-bound, so it runs on the blocking pool and never on a runtime
//! worker thread.

use tracing::debug;

use crate::key::TileKey;
use crate::origin::types::{FetchOutcome, FetchedTile, OriginError, OriginFetcher};
use crate::store::BoxFuture;
use crate::terrain::{TerrainPayload, TerrainSynthesizer};

/// Content type of encoded terrain payloads.
pub const TERRAIN_CONTENT_TYPE: &str = "application/octet-stream";

/// Default maximum samples per chunk edge.
pub const DEFAULT_MAX_RESOLUTION: u16 = 256;

/// Chunk coordinates beyond this magnitude are outside the world.
pub const MAX_CHUNK_COORD: i32 = 1 << 20;

/// Origin that synthesizes terrain chunks on demand.
#[derive(Debug, Clone)]
pub struct SynthesisOrigin {
    synthesizer: TerrainSynthesizer,
    max_resolution: u16,
}

impl SynthesisOrigin {
    pub fn new(synthesizer: TerrainSynthesizer) -> Self {
        Self {
            synthesizer,
            max_resolution: DEFAULT_MAX_RESOLUTION,
        }
    }

    pub fn with_max_resolution(mut self, max_resolution: u16) -> Self {
        self.max_resolution = max_resolution;
        self
    }

    pub fn max_resolution(&self) -> u16 {
        self.max_resolution
    }

    fn check(&self, key: &TileKey) -> Result<(i32, i32, u16), OriginError> {
        let TileKey::Terrain(terrain) = key else {
            return Err(OriginError::InvalidKey(format!(
                "synthesis only serves terrain, got {}",
                key
            )));
        };
        if terrain.resolution == 0 || terrain.resolution > self.max_resolution {
            return Err(OriginError::InvalidKey(format!(
                "resolution {} outside 1..={}",
                terrain.resolution, self.max_resolution
            )));
        }
        if !within_world(terrain.x) || !within_world(terrain.z) {
            return Err(OriginError::InvalidKey(format!(
                "chunk ({}, {}) outside world bounds",
                terrain.x, terrain.z
            )));
        }
        Ok((terrain.x, terrain.z, terrain.resolution))
    }
}

/// `i32::MIN` has no positive counterpart, so compare magnitudes unsigned.
pub fn within_world(coord: i32) -> bool {
    coord.unsigned_abs() <= MAX_CHUNK_COORD.unsigned_abs()
}

impl Default for SynthesisOrigin {
    fn default() -> Self {
        Self::new(TerrainSynthesizer::default())
    }
}

impl OriginFetcher for SynthesisOrigin {
    fn name(&self) -> &str {
        "synthesis"
    }

    fn fetch(&self, key: &TileKey) -> BoxFuture<'_, Result<FetchOutcome, OriginError>> {
        let checked = self.check(key);
        let synthesizer = self.synthesizer;
        Box::pin(async move {
            let (x, z, resolution) = checked?;
            let bytes = tokio::task::spawn_blocking(move || {
                let heights = synthesizer.heightfield(x, z, resolution);
                TerrainPayload::new(resolution, heights).map(|payload| payload.encode())
            })
            .await
            .map_err(|e| OriginError::Transient(format!("synthesis task failed: {}", e)))?
            .map_err(|e| OriginError::InvalidResponse(e.to_string()))?;

            debug!(
                x = x,
                z = z,
                resolution = resolution,
                size_bytes = bytes.len(),
                "Synthesized chunk"
            );
            Ok(FetchOutcome::Found(FetchedTile::new(
                bytes,
                Some(TERRAIN_CONTENT_TYPE),
            )))
        })
    }
}
