//! Application bootstrap implementation.
//!
//! Builds the shared infrastructure in dependency order:
//! 1. Object store (one for all kinds; object keys are kind-prefixed)
//! 2. Tile index, plus the listing-seeded elevation index when configured
//! 3. Origins and the shared generation coordinator
//! 4. One tile service per kind

use std::sync::Arc;

use tracing::info;

use super::error::AppError;
use crate::config::{ConfigFile, DeliveryMode, ElevationIndex, IndexBackend, StoreBackend};
use crate::coordinator::{GenerationCoordinator, TileSources};
use crate::index::{ListingTileIndex, MemoryTileIndex, SqliteTileIndex, TileIndex};
use crate::key::TileKind;
use crate::origin::{AsyncReqwestClient, BulkStoreOrigin, PaidApiOrigin, SynthesisOrigin};
use crate::service::{DeliveryPolicy, KeyScheme, TileService};
use crate::store::{DiskObjectStore, MemoryObjectStore, ObjectStore};
use crate::terrain::TerrainSynthesizer;

/// Fully wired TileForge application.
///
/// # Example
///
/// ```ignore
/// let config = ConfigFile::load()?;
/// let app = TileForgeApp::start(&config).await?;
/// let response = app.terrain().request("64/0/0").await;
/// ```
pub struct TileForgeApp {
    coordinator: Arc<GenerationCoordinator>,
    terrain: TileService,
    elevation: TileService,
    imagery: TileService,
}

impl TileForgeApp {
    /// Assemble every service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the store directory cannot be created, the index
    /// cannot be opened or seeded, or the HTTP client cannot be built.
    pub async fn start(config: &ConfigFile) -> Result<Self, AppError> {
        let store = Self::create_store(config).await?;
        let index = Self::create_index(config)?;
        let elevation_index = match config.elevation.index {
            ElevationIndex::Listing => {
                let seeded = ListingTileIndex::elevation(store.as_ref()).await?;
                Arc::new(seeded) as Arc<dyn TileIndex>
            }
            ElevationIndex::Shared => Arc::clone(&index),
        };

        let coordinator = Arc::new(GenerationCoordinator::new(config.coordinator_config()));
        let delivery = Self::delivery_policy(config);
        let http_client = AsyncReqwestClient::new()?;

        let synthesizer = TerrainSynthesizer::new(config.terrain.seed);
        let terrain_origin = SynthesisOrigin::new(synthesizer)
            .with_max_resolution(config.terrain.max_resolution);
        let terrain = TileService::new(
            KeyScheme::Terrain {
                version: config.terrain.version,
                max_resolution: config.terrain.max_resolution,
            },
            TileSources::new(Arc::new(terrain_origin), Arc::clone(&store), Arc::clone(&index)),
            Arc::clone(&coordinator),
        )
        .with_delivery(delivery.clone());

        let elevation_origin =
            BulkStoreOrigin::new(http_client.clone(), config.elevation.base_url.clone());
        let elevation = TileService::new(
            KeyScheme::Elevation,
            TileSources::new(Arc::new(elevation_origin), Arc::clone(&store), elevation_index),
            Arc::clone(&coordinator),
        )
        .with_delivery(delivery.clone());

        let imagery_origin = PaidApiOrigin::new(http_client, config.paid_api_config());
        let imagery = TileService::new(
            KeyScheme::Imagery {
                provider: config.imagery.provider.clone(),
                max_zoom: config.imagery.max_zoom,
            },
            TileSources::new(Arc::new(imagery_origin), store, index),
            Arc::clone(&coordinator),
        )
        .with_delivery(delivery);

        info!(
            store = ?config.store.backend,
            index = ?config.index.backend,
            elevation_index = ?config.elevation.index,
            delivery = ?config.delivery.mode,
            "TileForge services started"
        );

        Ok(Self {
            coordinator,
            terrain,
            elevation,
            imagery,
        })
    }

    async fn create_store(config: &ConfigFile) -> Result<Arc<dyn ObjectStore>, AppError> {
        match config.store.backend {
            StoreBackend::Disk => {
                let directory = &config.store.directory;
                tokio::fs::create_dir_all(directory)
                    .await
                    .map_err(crate::store::StoreError::Io)?;
                info!(directory = %directory.display(), "Using disk object store");
                Ok(Arc::new(DiskObjectStore::new(directory.clone())))
            }
            StoreBackend::Memory => {
                info!("Using in-memory object store");
                Ok(Arc::new(MemoryObjectStore::new()))
            }
        }
    }

    fn create_index(config: &ConfigFile) -> Result<Arc<dyn TileIndex>, AppError> {
        match config.index.backend {
            IndexBackend::Sqlite => {
                let index = SqliteTileIndex::open(&config.index.path)?;
                info!(path = %config.index.path.display(), "Using SQLite tile index");
                Ok(Arc::new(index))
            }
            IndexBackend::Memory => {
                info!("Using in-memory tile index");
                Ok(Arc::new(MemoryTileIndex::new()))
            }
        }
    }

    fn delivery_policy(config: &ConfigFile) -> DeliveryPolicy {
        match (config.delivery.mode, &config.delivery.cdn_base) {
            (DeliveryMode::Redirect, Some(cdn_base)) => DeliveryPolicy::Redirect {
                cdn_base: cdn_base.clone(),
            },
            _ => DeliveryPolicy::Stream,
        }
    }

    pub fn terrain(&self) -> &TileService {
        &self.terrain
    }

    pub fn elevation(&self) -> &TileService {
        &self.elevation
    }

    pub fn imagery(&self) -> &TileService {
        &self.imagery
    }

    /// Returns the service for a tile kind.
    pub fn service(&self, kind: TileKind) -> &TileService {
        match kind {
            TileKind::Terrain => &self.terrain,
            TileKind::Elevation => &self.elevation,
            TileKind::Imagery => &self.imagery,
        }
    }

    /// The coordinator shared by all three services.
    pub fn coordinator(&self) -> &Arc<GenerationCoordinator> {
        &self.coordinator
    }
}
