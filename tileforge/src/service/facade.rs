//! Per-kind tile service facade.
//!
//! A `TileService` binds a key scheme, an origin, the store and index, and a
//! delivery policy onto the shared coordinator. It translates coordinator
//! outcomes into transport-neutral responses:
//!
//! | Outcome                   | Response                         |
//! |---------------------------|----------------------------------|
//! | Cached (stream)           | 200, body streamed from store    |
//! | Cached (redirect)         | 302, `Location` on the CDN       |
//! | Generated                 | 200, fresh bytes                 |
//! | NotFound                  | 204                              |
//! | Failed(WaitTimeout)       | 202, `Retry-After`               |
//! | Failed(origin)            | 502                              |
//! | Failed(other)             | 500                              |
//! | unparseable coordinates   | 400                              |

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::coordinator::{FailureReason, GenerationCoordinator, Outcome, TileSources};
use crate::index::{IndexError, TileIndex, TileRecord};
use crate::key::{KeyError, TileKey, TileKind};
use crate::origin::{DEFAULT_IMAGERY_CONTENT_TYPE, HGT_CONTENT_TYPE, TERRAIN_CONTENT_TYPE};
use crate::service::response::{
    TileBody, TileResponse, STATUS_ACCEPTED, STATUS_BAD_GATEWAY, STATUS_BAD_REQUEST,
    STATUS_FOUND, STATUS_INTERNAL_ERROR, STATUS_NO_CONTENT, STATUS_OK,
};
use crate::service::scheme::KeyScheme;
use crate::store::{ObjectStore, StoreError};

/// Seconds a client should wait before retrying a still-pending tile.
pub const RETRY_AFTER_SECS: u64 = 2;

/// How cached tiles reach the client.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeliveryPolicy {
    /// Stream the object bytes from the store.
    #[default]
    Stream,
    /// Redirect to `{cdn_base}/{object_key}`.
    Redirect { cdn_base: String },
}

/// Errors from the facade's operational calls.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Index(#[from] IndexError),
}

/// What `purge` removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeReport {
    pub object_deleted: bool,
    pub record_deleted: bool,
}

/// Tile service for one tile kind.
pub struct TileService {
    scheme: KeyScheme,
    sources: TileSources,
    coordinator: Arc<GenerationCoordinator>,
    delivery: DeliveryPolicy,
}

impl TileService {
    pub fn new(
        scheme: KeyScheme,
        sources: TileSources,
        coordinator: Arc<GenerationCoordinator>,
    ) -> Self {
        Self {
            scheme,
            sources,
            coordinator,
            delivery: DeliveryPolicy::default(),
        }
    }

    pub fn with_delivery(mut self, delivery: DeliveryPolicy) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn kind(&self) -> TileKind {
        self.scheme.kind()
    }

    pub fn scheme(&self) -> &KeyScheme {
        &self.scheme
    }

    pub fn delivery(&self) -> &DeliveryPolicy {
        &self.delivery
    }

    pub fn coordinator(&self) -> &GenerationCoordinator {
        &self.coordinator
    }

    /// Parses raw coordinates with this service's scheme.
    pub fn parse_key(&self, raw: &str) -> Result<TileKey, KeyError> {
        self.scheme.parse(raw)
    }

    /// Serves one tile request.
    pub async fn request(&self, raw: &str) -> TileResponse {
        let key = match self.scheme.parse(raw) {
            Ok(key) => key,
            Err(e) => {
                debug!(kind = %self.kind(), raw = raw, error = %e, "Rejected coordinates");
                return TileResponse::error(STATUS_BAD_REQUEST, e.to_string());
            }
        };

        let outcome = self.coordinator.resolve(&key, &self.sources).await;
        debug!(key = %key, outcome = outcome.label(), "Resolved tile request");
        self.respond(&key, outcome).await
    }

    async fn respond(&self, key: &TileKey, outcome: Outcome) -> TileResponse {
        match outcome {
            Outcome::Cached(cached) => {
                let etag = cached.checksum.map(|c| format!("\"{}\"", c));
                match &self.delivery {
                    DeliveryPolicy::Redirect { cdn_base } => {
                        let location =
                            format!("{}/{}", cdn_base.trim_end_matches('/'), cached.object_key);
                        TileResponse::new(STATUS_FOUND).with_header("Location", location)
                    }
                    DeliveryPolicy::Stream => {
                        match self.sources.store.get(&cached.object_key).await {
                            Ok(Some(stream)) => {
                                let response = self
                                    .ok_response(None)
                                    .with_header("Content-Length", cached.size_bytes.to_string())
                                    .with_body(TileBody::Stream(stream));
                                with_etag(response, etag)
                            }
                            Ok(None) => {
                                warn!(key = %key, "Cached object vanished before streaming");
                                TileResponse::error(STATUS_INTERNAL_ERROR, "cached object missing")
                            }
                            Err(e) => {
                                warn!(key = %key, error = %e, "Failed to open cached object");
                                TileResponse::error(STATUS_INTERNAL_ERROR, e.to_string())
                            }
                        }
                    }
                }
            }
            Outcome::Generated(generated) => {
                let response = self
                    .ok_response(generated.content_type.as_deref())
                    .with_header("Content-Length", generated.bytes.len().to_string())
                    .with_body(TileBody::Bytes(generated.bytes));
                with_etag(response, Some(format!("\"{}\"", generated.checksum)))
            }
            Outcome::NotFound => TileResponse::new(STATUS_NO_CONTENT),
            Outcome::Failed(FailureReason::WaitTimeout) => TileResponse::new(STATUS_ACCEPTED)
                .with_header("Retry-After", RETRY_AFTER_SECS.to_string()),
            Outcome::Failed(reason) if reason.is_origin() => {
                TileResponse::error(STATUS_BAD_GATEWAY, reason.to_string())
            }
            Outcome::Failed(reason) => {
                TileResponse::error(STATUS_INTERNAL_ERROR, reason.to_string())
            }
        }
    }

    fn ok_response(&self, content_type: Option<&str>) -> TileResponse {
        let content_type = content_type.unwrap_or_else(|| default_content_type(self.kind()));
        TileResponse::new(STATUS_OK).with_header("Content-Type", content_type)
    }

    /// Returns the index record for a tile, if any.
    pub async fn status(&self, raw: &str) -> Result<Option<TileRecord>, ServiceError> {
        let key = self.scheme.parse(raw)?;
        Ok(self.sources.index.get(&key).await?)
    }

    /// Deletes a tile's object and index record.
    ///
    /// The record goes first so no `Ready` record outlives its object.
    pub async fn purge(&self, raw: &str) -> Result<PurgeReport, ServiceError> {
        let key = self.scheme.parse(raw)?;
        let record_deleted = self.sources.index.delete(&key).await?;
        let object_deleted = self.sources.store.delete(&key.object_key()).await?;
        debug!(
            key = %key,
            record_deleted = record_deleted,
            object_deleted = object_deleted,
            "Purged tile"
        );
        Ok(PurgeReport {
            object_deleted,
            record_deleted,
        })
    }
}

fn with_etag(response: TileResponse, etag: Option<String>) -> TileResponse {
    match etag {
        Some(etag) => response.with_header("ETag", etag),
        None => response,
    }
}

/// Content type used when the origin did not report one.
pub fn default_content_type(kind: TileKind) -> &'static str {
    match kind {
        TileKind::Terrain => TERRAIN_CONTENT_TYPE,
        TileKind::Elevation => HGT_CONTENT_TYPE,
        TileKind::Imagery => DEFAULT_IMAGERY_CONTENT_TYPE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::CoordinatorConfig;
    use crate::index::{MemoryTileIndex, TileStatus};
    use crate::origin::{FetchOutcome, FetchedTile, OriginError, OriginFetcher, RejectReason};
    use crate::store::{BoxFuture, MemoryObjectStore};
    use bytes::Bytes;
    use std::time::Duration;

    struct StaticOrigin(Result<FetchOutcome, OriginError>, Duration);

    impl OriginFetcher for StaticOrigin {
        fn name(&self) -> &str {
            "static"
        }

        fn fetch(&self, _key: &TileKey) -> BoxFuture<'_, Result<FetchOutcome, OriginError>> {
            Box::pin(async move {
                tokio::time::sleep(self.1).await;
                self.0.clone()
            })
        }
    }

    fn imagery_service(
        answer: Result<FetchOutcome, OriginError>,
        delay: Duration,
        config: CoordinatorConfig,
    ) -> (TileService, Arc<MemoryObjectStore>, Arc<MemoryTileIndex>) {
        let store = Arc::new(MemoryObjectStore::new());
        let index = Arc::new(MemoryTileIndex::new());
        let sources = TileSources::new(
            Arc::new(StaticOrigin(answer, delay)),
            store.clone(),
            index.clone(),
        );
        let scheme = KeyScheme::Imagery {
            provider: "acme".into(),
            max_zoom: 19,
        };
        let coordinator = Arc::new(GenerationCoordinator::new(config));
        (TileService::new(scheme, sources, coordinator), store, index)
    }

    fn png() -> Result<FetchOutcome, OriginError> {
        Ok(FetchOutcome::Found(FetchedTile::new(
            Bytes::from_static(b"png!"),
            Some("image/png"),
        )))
    }

    #[tokio::test]
    async fn test_generated_then_streamed() {
        let (service, _, _) = imagery_service(png(), Duration::ZERO, CoordinatorConfig::new());

        let first = service.request("3/1/2").await;
        assert_eq!(first.status, STATUS_OK);
        assert_eq!(first.header("Content-Type"), Some("image/png"));
        assert!(first.header("ETag").is_some());
        assert_eq!(first.body.into_bytes().await.unwrap().as_ref(), b"png!");

        let second = service.request("3/1/2").await;
        assert_eq!(second.status, STATUS_OK);
        assert!(matches!(second.body, TileBody::Stream(_)));
        assert_eq!(second.header("Content-Length"), Some("4"));
        assert_eq!(second.body.into_bytes().await.unwrap().as_ref(), b"png!");
    }

    #[tokio::test]
    async fn test_redirect_delivery() {
        let (service, _, _) = imagery_service(png(), Duration::ZERO, CoordinatorConfig::new());
        let service = service.with_delivery(DeliveryPolicy::Redirect {
            cdn_base: "https://cdn.example.com/".into(),
        });

        assert_eq!(service.request("3/1/2").await.status, STATUS_OK);
        let cached = service.request("3/1/2").await;
        assert_eq!(cached.status, STATUS_FOUND);
        assert_eq!(
            cached.header("Location"),
            Some("https://cdn.example.com/imagery/acme/3/1/2.webp")
        );
    }

    #[tokio::test]
    async fn test_bad_coordinates_are_400() {
        let (service, _, _) = imagery_service(png(), Duration::ZERO, CoordinatorConfig::new());
        assert_eq!(service.request("3/1").await.status, STATUS_BAD_REQUEST);
        assert_eq!(service.request("a/b/c").await.status, STATUS_BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_terrain_chunk_outside_world_is_400_without_generation() {
        let store = Arc::new(MemoryObjectStore::new());
        let index = Arc::new(MemoryTileIndex::new());
        let sources = TileSources::new(
            Arc::new(crate::origin::SynthesisOrigin::default()),
            store.clone(),
            index.clone(),
        );
        let scheme = KeyScheme::Terrain {
            version: 1,
            max_resolution: 256,
        };
        let coordinator = Arc::new(GenerationCoordinator::default());
        let service = TileService::new(scheme, sources, coordinator);

        let response = service.request("8/-2147483648/0").await;
        assert_eq!(response.status, STATUS_BAD_REQUEST);
        assert!(index.is_empty());
        assert_eq!(store.put_count(), 0);
    }

    #[tokio::test]
    async fn test_not_found_is_204() {
        let (service, _, _) = imagery_service(
            Ok(FetchOutcome::NotFound),
            Duration::ZERO,
            CoordinatorConfig::new(),
        );
        assert_eq!(service.request("1/0/0").await.status, STATUS_NO_CONTENT);
    }

    #[tokio::test]
    async fn test_origin_failure_is_502() {
        let (service, _, _) = imagery_service(
            Err(OriginError::Rejected {
                status: Some(401),
                reason: RejectReason::Unauthorized,
            }),
            Duration::ZERO,
            CoordinatorConfig::new(),
        );
        assert_eq!(service.request("1/0/0").await.status, STATUS_BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_slow_generation_is_202_with_retry_after() {
        let (service, _, _) = imagery_service(
            png(),
            Duration::from_millis(300),
            CoordinatorConfig::new().with_wait_timeout(Duration::from_millis(10)),
        );
        let response = service.request("1/0/0").await;
        assert_eq!(response.status, STATUS_ACCEPTED);
        assert_eq!(response.header("Retry-After"), Some("2"));
    }

    #[tokio::test]
    async fn test_status_and_purge() {
        let (service, store, index) =
            imagery_service(png(), Duration::ZERO, CoordinatorConfig::new());
        assert!(service.status("2/1/1").await.unwrap().is_none());

        service.request("2/1/1").await;
        let record = service.status("2/1/1").await.unwrap().unwrap();
        assert_eq!(record.status, TileStatus::Ready);

        let report = service.purge("2/1/1").await.unwrap();
        assert_eq!(
            report,
            PurgeReport {
                object_deleted: true,
                record_deleted: true
            }
        );
        assert!(store.is_empty());
        assert!(index.get(&TileKey::imagery("acme", 2, 1, 1)).await.unwrap().is_none());
        assert!(store.exists("imagery/acme/2/1/1.webp").await.unwrap().is_none());

        assert!(matches!(
            service.status("bad").await,
            Err(ServiceError::Key(_))
        ));
    }
}
