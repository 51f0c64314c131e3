//! Generation coordinator: the fetch-through cache core.
//!
//! For any requested key the coordinator decides whether the tile can be
//! served from the store, and otherwise runs exactly one generation per key
//! no matter how many callers ask concurrently.
//!
//! # Write-through sequence
//!
//! ```text
//! index.get ──► Ready + object present ──────────────────────► Cached
//!     │
//!     └─► miss ──► in-flight table ──► join ───────────────► (shared outcome)
//!                        │
//!                        └─► own ──► spawn generation task
//!                                      re-check index
//!                                      index.upsert(Pending)
//!                                      limiter.acquire
//!                                      origin.fetch
//!                                      validate size
//!                                      store.put
//!                                      index.upsert(Ready)
//!                                      publish ─────────────► Generated
//! ```
//!
//! The store write always precedes the `Ready` index write, so a `Ready`
//! record never points at a missing object. Generation runs in a detached
//! task: a caller that gives up (timeout, dropped request) does not cancel
//! the work other callers may be waiting on.

mod config;
mod inflight;
mod limiter;
mod outcome;

pub use config::{
    CoordinatorConfig, DEFAULT_ELEVATION_LIMIT, DEFAULT_IMAGERY_LIMIT, DEFAULT_NEGATIVE_TTL,
    DEFAULT_TERRAIN_LIMIT, DEFAULT_WAIT_TIMEOUT,
};
pub use inflight::InFlightStats;
pub use limiter::{ConcurrencyLimiter, LimiterPermit};
pub use outcome::{CachedTile, FailureReason, GeneratedTile, Outcome};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::index::{TileIndex, TileRecord, TileStatus};
use crate::key::{TileKey, TileKind};
use crate::origin::{FetchOutcome, OriginFetcher};
use crate::store::ObjectStore;

use inflight::{InFlightTable, PublishGuard, Registration};

/// The collaborators one tile kind resolves against.
#[derive(Clone)]
pub struct TileSources {
    pub origin: Arc<dyn OriginFetcher>,
    pub store: Arc<dyn ObjectStore>,
    pub index: Arc<dyn TileIndex>,
}

impl TileSources {
    pub fn new(
        origin: Arc<dyn OriginFetcher>,
        store: Arc<dyn ObjectStore>,
        index: Arc<dyn TileIndex>,
    ) -> Self {
        Self {
            origin,
            store,
            index,
        }
    }
}

/// Result of consulting the index (and store) for a key.
enum CacheCheck {
    Hit(CachedTile),
    Absent,
    Miss,
}

/// Deduplicating, concurrency-bounded tile generator.
///
/// One instance is shared by every tile service so dedup and limits apply
/// process-wide.
pub struct GenerationCoordinator {
    config: CoordinatorConfig,
    limiters: HashMap<TileKind, Arc<ConcurrencyLimiter>>,
    inflight: Arc<InFlightTable>,
}

impl GenerationCoordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        let limiters = TileKind::ALL
            .iter()
            .map(|kind| {
                let limiter = ConcurrencyLimiter::new(config.limit(*kind), kind.as_str());
                (*kind, Arc::new(limiter))
            })
            .collect();

        Self {
            config,
            limiters,
            inflight: Arc::new(InFlightTable::new()),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Limiter gating origin fetches for one tile kind.
    pub fn limiter(&self, kind: TileKind) -> &ConcurrencyLimiter {
        // Every kind gets a limiter in `new`.
        &self.limiters[&kind]
    }

    pub fn stats(&self) -> InFlightStats {
        self.inflight.stats()
    }

    /// Returns true while a generation for `key` is running.
    pub fn is_in_flight(&self, key: &TileKey) -> bool {
        self.inflight.contains(key)
    }

    /// Resolves a key to a cached object, a fresh payload, or a failure.
    ///
    /// Concurrent calls for the same key share a single generation and all
    /// observe the same outcome. Each call waits at most the configured
    /// wait timeout, after which it alone gets `Failed(WaitTimeout)`.
    pub async fn resolve(&self, key: &TileKey, sources: &TileSources) -> Outcome {
        match check_cache(key, sources, self.config.negative_ttl).await {
            Ok(CacheCheck::Hit(cached)) => {
                debug!(key = %key, "Cache hit");
                return Outcome::Cached(cached);
            }
            Ok(CacheCheck::Absent) => {
                debug!(key = %key, "Known absent");
                return Outcome::NotFound;
            }
            Ok(CacheCheck::Miss) => {}
            Err(reason) => return Outcome::Failed(reason),
        }

        let receiver = match self.inflight.register(key) {
            Registration::Owner(guard, receiver) => {
                let limiter = Arc::clone(&self.limiters[&key.kind()]);
                tokio::spawn(generate(
                    guard,
                    sources.clone(),
                    limiter,
                    self.config.negative_ttl,
                ));
                receiver
            }
            Registration::Joined(receiver) => receiver,
        };

        self.wait(key, receiver).await
    }

    async fn wait(&self, key: &TileKey, mut receiver: broadcast::Receiver<Outcome>) -> Outcome {
        match tokio::time::timeout(self.config.wait_timeout, receiver.recv()).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                warn!(key = %key, error = %e, "Generation channel closed without outcome");
                Outcome::Failed(FailureReason::Aborted)
            }
            Err(_) => {
                warn!(
                    key = %key,
                    timeout_ms = self.config.wait_timeout.as_millis() as u64,
                    "Timed out waiting for generation"
                );
                Outcome::Failed(FailureReason::WaitTimeout)
            }
        }
    }
}

impl Default for GenerationCoordinator {
    fn default() -> Self {
        Self::new(CoordinatorConfig::default())
    }
}

/// Consults the index, confirming `Ready` records against the store.
async fn check_cache(
    key: &TileKey,
    sources: &TileSources,
    negative_ttl: Duration,
) -> Result<CacheCheck, FailureReason> {
    let record = sources
        .index
        .get(key)
        .await
        .map_err(|e| FailureReason::Store(e.to_string()))?;

    let Some(record) = record else {
        return Ok(CacheCheck::Miss);
    };

    match record.status {
        TileStatus::Ready => {
            let object_key = key.object_key();
            let meta = sources
                .store
                .exists(&object_key)
                .await
                .map_err(|e| FailureReason::Store(e.to_string()))?;
            match meta {
                Some(meta) if meta.size == record.size_bytes => {
                    Ok(CacheCheck::Hit(CachedTile {
                        object_key,
                        size_bytes: meta.size,
                        checksum: record.checksum,
                    }))
                }
                Some(meta) => {
                    warn!(
                        key = %key,
                        recorded = record.size_bytes,
                        stored = meta.size,
                        "Ready record size does not match stored object; regenerating"
                    );
                    Ok(CacheCheck::Miss)
                }
                None => {
                    warn!(key = %key, "Ready record has no stored object; regenerating");
                    Ok(CacheCheck::Miss)
                }
            }
        }
        TileStatus::Absent => {
            // A timestamp in the future counts as fresh.
            let fresh = record
                .age(Utc::now())
                .to_std()
                .map_or(true, |age| age < negative_ttl);
            if fresh {
                Ok(CacheCheck::Absent)
            } else {
                Ok(CacheCheck::Miss)
            }
        }
        TileStatus::Pending | TileStatus::Failed => Ok(CacheCheck::Miss),
    }
}

/// Generation task body. Always publishes exactly one outcome.
#[instrument(
    name = "generate",
    skip_all,
    fields(key = %guard.key(), origin = sources.origin.name())
)]
async fn generate(
    guard: PublishGuard,
    sources: TileSources,
    limiter: Arc<ConcurrencyLimiter>,
    negative_ttl: Duration,
) {
    let key = guard.key().clone();
    let outcome = run_generation(&key, &sources, &limiter, negative_ttl).await;
    info!(outcome = outcome.label(), "Generation finished");
    guard.publish(outcome);
}

async fn run_generation(
    key: &TileKey,
    sources: &TileSources,
    limiter: &ConcurrencyLimiter,
    negative_ttl: Duration,
) -> Outcome {
    // A generation may have completed between the caller's check and
    // the in-flight registration.
    match check_cache(key, sources, negative_ttl).await {
        Ok(CacheCheck::Hit(cached)) => return Outcome::Cached(cached),
        Ok(CacheCheck::Absent) => return Outcome::NotFound,
        Ok(CacheCheck::Miss) => {}
        Err(reason) => return Outcome::Failed(reason),
    }

    if let Err(e) = sources.index.upsert(TileRecord::pending(key.clone())).await {
        warn!(error = %e, "Failed to record pending status");
        return Outcome::Failed(FailureReason::Store(e.to_string()));
    }

    let Some(_permit) = limiter.acquire().await else {
        record_failure(key, sources, TileRecord::failed(key.clone())).await;
        return Outcome::Failed(FailureReason::Aborted);
    };
    debug!(in_flight = limiter.in_flight(), "Invoking origin");

    let tile = match sources.origin.fetch(key).await {
        Ok(FetchOutcome::Found(tile)) => tile,
        Ok(FetchOutcome::NotFound) => {
            record_failure(key, sources, TileRecord::absent(key.clone())).await;
            return Outcome::NotFound;
        }
        Err(e) => {
            warn!(error = %e, transient = e.is_transient(), "Origin fetch failed");
            record_failure(key, sources, TileRecord::failed(key.clone())).await;
            return Outcome::Failed(FailureReason::Origin(e));
        }
    };

    if let Some(expected) = key.expected_payload_size() {
        if tile.bytes.len() != expected {
            warn!(
                expected = expected,
                actual = tile.bytes.len(),
                "Origin payload has wrong size"
            );
            record_failure(key, sources, TileRecord::failed(key.clone())).await;
            return Outcome::Failed(FailureReason::Validation {
                expected,
                actual: tile.bytes.len(),
            });
        }
    }

    let object_key = key.object_key();
    let checksum = format!("{:x}", Sha256::digest(&tile.bytes));
    let size_bytes = tile.bytes.len() as u64;

    if let Err(e) = sources.store.put(&object_key, tile.bytes.clone()).await {
        warn!(object_key = %object_key, error = %e, "Store write failed");
        record_failure(key, sources, TileRecord::failed(key.clone())).await;
        return Outcome::Failed(FailureReason::Store(e.to_string()));
    }

    let ready = TileRecord::ready(key.clone(), Some(checksum.clone()), size_bytes);
    if let Err(e) = sources.index.upsert(ready).await {
        // The stored object is left in place; the next generation overwrites it.
        warn!(object_key = %object_key, error = %e, "Index write failed after store write");
        record_failure(key, sources, TileRecord::failed(key.clone())).await;
        return Outcome::Failed(FailureReason::Store(e.to_string()));
    }

    info!(object_key = %object_key, size_bytes = size_bytes, "Tile generated and stored");
    Outcome::Generated(GeneratedTile {
        object_key,
        bytes: tile.bytes,
        content_type: tile.content_type,
        checksum,
    })
}

/// Records a terminal non-Ready status; index errors are logged only.
async fn record_failure(key: &TileKey, sources: &TileSources, record: TileRecord) {
    let status = record.status;
    if let Err(e) = sources.index.upsert(record).await {
        warn!(key = %key, status = %status, error = %e, "Failed to record status");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{IndexError, MemoryTileIndex};
    use crate::origin::{FetchedTile, OriginError};
    use crate::store::{BoxFuture, MemoryObjectStore, ObjectMeta, ObjectStream, StoreError};
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Origin returning a fixed answer and counting calls.
    struct FixedOrigin {
        answer: Result<FetchOutcome, OriginError>,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl FixedOrigin {
        fn new(answer: Result<FetchOutcome, OriginError>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            })
        }

        fn slow(answer: Result<FetchOutcome, OriginError>, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: AtomicUsize::new(0),
                delay,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl OriginFetcher for FixedOrigin {
        fn name(&self) -> &str {
            "fixed"
        }

        fn fetch(&self, _key: &TileKey) -> BoxFuture<'_, Result<FetchOutcome, OriginError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                tokio::time::sleep(self.delay).await;
                self.answer.clone()
            })
        }
    }

    fn found(bytes: &'static [u8]) -> Result<FetchOutcome, OriginError> {
        Ok(FetchOutcome::Found(FetchedTile::new(
            Bytes::from_static(bytes),
            Some("image/webp"),
        )))
    }

    /// Object store whose writes always fail.
    struct ReadOnlyStore(MemoryObjectStore);

    impl ObjectStore for ReadOnlyStore {
        fn exists(&self, key: &str) -> BoxFuture<'_, Result<Option<ObjectMeta>, StoreError>> {
            self.0.exists(key)
        }

        fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<ObjectStream>, StoreError>> {
            self.0.get(key)
        }

        fn put(&self, _key: &str, _data: Bytes) -> BoxFuture<'_, Result<(), StoreError>> {
            Box::pin(async { Err(StoreError::Unavailable("disk full".into())) })
        }

        fn delete(&self, key: &str) -> BoxFuture<'_, Result<bool, StoreError>> {
            self.0.delete(key)
        }

        fn list(&self, prefix: &str) -> BoxFuture<'_, Result<Vec<ObjectMeta>, StoreError>> {
            self.0.list(prefix)
        }
    }

    /// Index that refuses `Ready` records and accepts everything else.
    struct ReadyRejectingIndex(MemoryTileIndex);

    impl TileIndex for ReadyRejectingIndex {
        fn get(&self, key: &TileKey) -> BoxFuture<'_, Result<Option<TileRecord>, IndexError>> {
            self.0.get(key)
        }

        fn upsert(&self, record: TileRecord) -> BoxFuture<'_, Result<(), IndexError>> {
            if record.is_ready() {
                return Box::pin(async { Err(IndexError::Unavailable("locked".into())) });
            }
            self.0.upsert(record)
        }

        fn delete(&self, key: &TileKey) -> BoxFuture<'_, Result<bool, IndexError>> {
            self.0.delete(key)
        }
    }

    struct Fixture {
        store: Arc<MemoryObjectStore>,
        index: Arc<MemoryTileIndex>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: Arc::new(MemoryObjectStore::new()),
                index: Arc::new(MemoryTileIndex::new()),
            }
        }

        fn sources(&self, origin: Arc<dyn OriginFetcher>) -> TileSources {
            TileSources::new(origin, self.store.clone(), self.index.clone())
        }
    }

    #[tokio::test]
    async fn test_generate_then_cached() {
        let fixture = Fixture::new();
        let origin = FixedOrigin::new(found(b"tile-bytes"));
        let sources = fixture.sources(origin.clone());
        let coordinator = GenerationCoordinator::default();
        let key = TileKey::imagery("p", 2, 1, 1);

        let first = coordinator.resolve(&key, &sources).await;
        let Outcome::Generated(generated) = first else {
            panic!("expected Generated, got {:?}", first);
        };
        assert_eq!(generated.bytes, Bytes::from_static(b"tile-bytes"));
        assert_eq!(generated.content_type.as_deref(), Some("image/webp"));

        let second = coordinator.resolve(&key, &sources).await;
        let Outcome::Cached(cached) = second else {
            panic!("expected Cached, got {:?}", second);
        };
        assert_eq!(cached.size_bytes, 10);
        assert_eq!(cached.checksum, Some(generated.checksum));
        assert_eq!(origin.calls(), 1);
    }

    #[tokio::test]
    async fn test_checksum_is_sha256_hex() {
        let fixture = Fixture::new();
        let sources = fixture.sources(FixedOrigin::new(found(b"abc")));
        let coordinator = GenerationCoordinator::default();

        let outcome = coordinator
            .resolve(&TileKey::imagery("p", 0, 0, 0), &sources)
            .await;
        let Outcome::Generated(generated) = outcome else {
            panic!("expected Generated");
        };
        assert_eq!(
            generated.checksum,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_not_found_records_absent_and_skips_origin_while_fresh() {
        let fixture = Fixture::new();
        let origin = FixedOrigin::new(Ok(FetchOutcome::NotFound));
        let sources = fixture.sources(origin.clone());
        let coordinator = GenerationCoordinator::default();
        let key = TileKey::elevation("N10E010").unwrap();

        assert_eq!(coordinator.resolve(&key, &sources).await, Outcome::NotFound);
        assert_eq!(coordinator.resolve(&key, &sources).await, Outcome::NotFound);
        assert_eq!(origin.calls(), 1);

        let record = fixture.index.get(&key).await.unwrap().unwrap();
        assert_eq!(record.status, TileStatus::Absent);
    }

    #[tokio::test]
    async fn test_stale_absent_is_redriven() {
        let fixture = Fixture::new();
        let origin = FixedOrigin::new(Ok(FetchOutcome::NotFound));
        let sources = fixture.sources(origin.clone());
        let coordinator =
            GenerationCoordinator::new(CoordinatorConfig::new().with_negative_ttl(Duration::ZERO));
        let key = TileKey::elevation("N10E010").unwrap();

        coordinator.resolve(&key, &sources).await;
        coordinator.resolve(&key, &sources).await;
        assert_eq!(origin.calls(), 2);
    }

    #[tokio::test]
    async fn test_origin_error_records_failed_and_retries() {
        let fixture = Fixture::new();
        let origin = FixedOrigin::new(Err(OriginError::Transient("503".into())));
        let sources = fixture.sources(origin.clone());
        let coordinator = GenerationCoordinator::default();
        let key = TileKey::imagery("p", 1, 0, 0);

        let outcome = coordinator.resolve(&key, &sources).await;
        assert!(outcome.failure().unwrap().is_origin());

        let record = fixture.index.get(&key).await.unwrap().unwrap();
        assert_eq!(record.status, TileStatus::Failed);
        assert!(fixture.store.is_empty());

        coordinator.resolve(&key, &sources).await;
        assert_eq!(origin.calls(), 2);
    }

    #[tokio::test]
    async fn test_wrong_terrain_size_fails_validation_without_store_write() {
        let fixture = Fixture::new();
        let sources = fixture.sources(FixedOrigin::new(found(b"short")));
        let coordinator = GenerationCoordinator::default();

        let outcome = coordinator
            .resolve(&TileKey::terrain(1, 64, 0, 0), &sources)
            .await;
        assert_eq!(
            outcome,
            Outcome::Failed(FailureReason::Validation {
                expected: 16_919,
                actual: 5
            })
        );
        assert_eq!(fixture.store.put_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_object_is_regenerated() {
        let fixture = Fixture::new();
        let origin = FixedOrigin::new(found(b"again"));
        let sources = fixture.sources(origin.clone());
        let coordinator = GenerationCoordinator::default();
        let key = TileKey::imagery("p", 3, 3, 3);

        fixture
            .index
            .upsert(TileRecord::ready(key.clone(), None, 5))
            .await
            .unwrap();

        assert!(coordinator.resolve(&key, &sources).await.is_generated());
        assert_eq!(origin.calls(), 1);
    }

    #[tokio::test]
    async fn test_wait_timeout_only_affects_caller() {
        let fixture = Fixture::new();
        let origin = FixedOrigin::slow(found(b"slow"), Duration::from_millis(200));
        let sources = fixture.sources(origin.clone());
        let coordinator = GenerationCoordinator::new(
            CoordinatorConfig::new().with_wait_timeout(Duration::from_millis(20)),
        );
        let key = TileKey::imagery("p", 5, 1, 1);

        assert_eq!(
            coordinator.resolve(&key, &sources).await,
            Outcome::Failed(FailureReason::WaitTimeout)
        );

        // The detached generation still completes and populates the cache.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(coordinator.resolve(&key, &sources).await.is_cached());
        assert_eq!(origin.calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_fetch() {
        let fixture = Fixture::new();
        let origin = FixedOrigin::slow(found(b"shared"), Duration::from_millis(50));
        let sources = fixture.sources(origin.clone());
        let coordinator = Arc::new(GenerationCoordinator::default());
        let key = TileKey::imagery("p", 6, 2, 2);

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let coordinator = Arc::clone(&coordinator);
                let sources = sources.clone();
                let key = key.clone();
                tokio::spawn(async move { coordinator.resolve(&key, &sources).await })
            })
            .collect();

        let mut outcomes = Vec::new();
        for task in tasks {
            outcomes.push(task.await.unwrap());
        }

        assert_eq!(origin.calls(), 1);
        assert!(outcomes.iter().all(|o| o == &outcomes[0]));
        assert!(outcomes[0].is_generated());
        assert!(!coordinator.is_in_flight(&key));
    }

    #[tokio::test]
    async fn test_store_write_failure_records_failed() {
        let store = Arc::new(ReadOnlyStore(MemoryObjectStore::new()));
        let index = Arc::new(MemoryTileIndex::new());
        let origin = FixedOrigin::new(found(b"never-stored"));
        let sources = TileSources::new(origin.clone(), store.clone(), index.clone());
        let coordinator = GenerationCoordinator::default();
        let key = TileKey::imagery("p", 4, 2, 2);

        let outcome = coordinator.resolve(&key, &sources).await;
        assert!(matches!(
            outcome,
            Outcome::Failed(FailureReason::Store(_))
        ));

        let record = index.get(&key).await.unwrap().unwrap();
        assert_eq!(record.status, TileStatus::Failed);
        assert!(store.0.is_empty());

        // Failed records are retried on the next request.
        coordinator.resolve(&key, &sources).await;
        assert_eq!(origin.calls(), 2);
    }

    #[tokio::test]
    async fn test_ready_upsert_failure_leaves_no_ready_record() {
        let store = Arc::new(MemoryObjectStore::new());
        let index = Arc::new(ReadyRejectingIndex(MemoryTileIndex::new()));
        let origin = FixedOrigin::new(found(b"orphan"));
        let sources = TileSources::new(origin.clone(), store.clone(), index.clone());
        let coordinator = GenerationCoordinator::default();
        let key = TileKey::imagery("p", 4, 3, 3);

        let outcome = coordinator.resolve(&key, &sources).await;
        assert!(matches!(
            outcome,
            Outcome::Failed(FailureReason::Store(_))
        ));

        // The object was written first, but the index never claims it.
        assert_eq!(store.put_count(), 1);
        let record = index.get(&key).await.unwrap().unwrap();
        assert_eq!(record.status, TileStatus::Failed);

        assert!(!coordinator.resolve(&key, &sources).await.is_cached());
        assert_eq!(origin.calls(), 2);
    }

    #[tokio::test]
    async fn test_orphaned_pending_record_is_redriven() {
        let fixture = Fixture::new();
        let origin = FixedOrigin::new(found(b"restarted"));
        let sources = fixture.sources(origin.clone());
        let coordinator = GenerationCoordinator::new(
            CoordinatorConfig::new().with_wait_timeout(Duration::from_secs(5)),
        );
        let key = TileKey::imagery("p", 7, 1, 1);

        // Left behind by a process that died mid-generation.
        fixture
            .index
            .upsert(TileRecord::pending(key.clone()))
            .await
            .unwrap();
        assert!(!coordinator.is_in_flight(&key));

        let outcome = coordinator.resolve(&key, &sources).await;
        assert!(outcome.is_generated(), "got {:?}", outcome);
        assert_eq!(origin.calls(), 1);

        let record = fixture.index.get(&key).await.unwrap().unwrap();
        assert_eq!(record.status, TileStatus::Ready);
    }

    #[tokio::test]
    async fn test_out_of_world_terrain_fails_at_origin() {
        let fixture = Fixture::new();
        let sources = fixture.sources(Arc::new(crate::origin::SynthesisOrigin::default()));
        let coordinator = GenerationCoordinator::default();
        let key = TileKey::terrain(1, 8, i32::MIN, 0);

        let outcome = coordinator.resolve(&key, &sources).await;
        assert!(matches!(
            outcome,
            Outcome::Failed(FailureReason::Origin(OriginError::InvalidKey(_)))
        ));

        let record = fixture.index.get(&key).await.unwrap().unwrap();
        assert_eq!(record.status, TileStatus::Failed);
        assert_eq!(fixture.store.put_count(), 0);
    }
}
