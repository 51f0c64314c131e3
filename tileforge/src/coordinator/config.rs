//! Runtime configuration for the generation coordinator.

use std::collections::HashMap;
use std::time::Duration;

use crate::key::TileKind;

/// Default concurrent terrain syntheses.
pub const DEFAULT_TERRAIN_LIMIT: usize = 4;

/// Default concurrent elevation downloads.
pub const DEFAULT_ELEVATION_LIMIT: usize = 8;

/// Default concurrent paid imagery requests.
pub const DEFAULT_IMAGERY_LIMIT: usize = 4;

/// Default bound on how long a caller waits for a generation.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default lifetime of an `Absent` record before the origin is asked again.
pub const DEFAULT_NEGATIVE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Coordinator tuning.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    limits: HashMap<TileKind, usize>,
    /// Per-caller bound on waiting for a generation result.
    pub wait_timeout: Duration,
    /// How long a legitimate absence is trusted.
    pub negative_ttl: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        let limits = HashMap::from([
            (TileKind::Terrain, DEFAULT_TERRAIN_LIMIT),
            (TileKind::Elevation, DEFAULT_ELEVATION_LIMIT),
            (TileKind::Imagery, DEFAULT_IMAGERY_LIMIT),
        ]);
        Self {
            limits,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            negative_ttl: DEFAULT_NEGATIVE_TTL,
        }
    }
}

impl CoordinatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the concurrent origin fetch limit for one tile kind.
    pub fn with_limit(mut self, kind: TileKind, limit: usize) -> Self {
        self.limits.insert(kind, limit);
        self
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn with_negative_ttl(mut self, ttl: Duration) -> Self {
        self.negative_ttl = ttl;
        self
    }

    pub fn limit(&self, kind: TileKind) -> usize {
        self.limits.get(&kind).copied().unwrap_or(1)
    }
}
