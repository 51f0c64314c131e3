//! Index seeded from an object-store listing.
//!
//! The elevation dataset is mirrored object-for-object, so the store itself
//! is the source of truth for which tiles exist. At startup the store is
//! listed once and every recognised object becomes a `Ready` record carrying
//! the listed size. Later writes go to an in-memory overlay.

use tracing::{debug, info};

use crate::index::memory::MemoryTileIndex;
use crate::index::traits::{BoxFuture, IndexError, TileIndex, TileRecord};
use crate::key::TileKey;
use crate::store::{ObjectMeta, ObjectStore};

/// Object-key prefix of mirrored elevation tiles.
pub const ELEVATION_PREFIX: &str = "dem/srtm/";

/// In-memory index populated from a store listing.
#[derive(Debug, Default)]
pub struct ListingTileIndex {
    inner: MemoryTileIndex,
}

impl ListingTileIndex {
    /// Lists `prefix` and records every object `key_for` recognises as `Ready`.
    pub async fn seed<F>(
        store: &dyn ObjectStore,
        prefix: &str,
        key_for: F,
    ) -> Result<Self, IndexError>
    where
        F: Fn(&ObjectMeta) -> Option<TileKey>,
    {
        let listed = store
            .list(prefix)
            .await
            .map_err(|e| IndexError::Unavailable(format!("listing '{}' failed: {}", prefix, e)))?;

        let index = Self::default();
        let mut skipped = 0usize;
        for meta in &listed {
            match key_for(meta) {
                Some(key) => {
                    index
                        .inner
                        .upsert(TileRecord::ready(key, None, meta.size))
                        .await?;
                }
                None => {
                    debug!(object_key = %meta.key, "Skipping unrecognised object");
                    skipped += 1;
                }
            }
        }

        info!(
            prefix = prefix,
            seeded = index.inner.len(),
            skipped = skipped,
            "Seeded index from store listing"
        );
        Ok(index)
    }

    /// Seeds from mirrored `dem/srtm/{tile}.hgt` objects.
    pub async fn elevation(store: &dyn ObjectStore) -> Result<Self, IndexError> {
        Self::seed(store, ELEVATION_PREFIX, elevation_key_for).await
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

fn elevation_key_for(meta: &ObjectMeta) -> Option<TileKey> {
    let name = meta
        .key
        .strip_prefix(ELEVATION_PREFIX)?
        .strip_suffix(".hgt")?;
    TileKey::elevation(name).ok()
}

impl TileIndex for ListingTileIndex {
    fn get(&self, key: &TileKey) -> BoxFuture<'_, Result<Option<TileRecord>, IndexError>> {
        self.inner.get(key)
    }

    fn upsert(&self, record: TileRecord) -> BoxFuture<'_, Result<(), IndexError>> {
        self.inner.upsert(record)
    }

    fn delete(&self, key: &TileKey) -> BoxFuture<'_, Result<bool, IndexError>> {
        self.inner.delete(key)
    }
}
