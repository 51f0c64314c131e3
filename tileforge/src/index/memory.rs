//! In-memory tile index.

use dashmap::DashMap;

use crate::index::traits::{BoxFuture, IndexError, TileIndex, TileRecord};
use crate::key::TileKey;

/// Process-local index backed by a `DashMap`.
#[derive(Debug, Default)]
pub struct MemoryTileIndex {
    records: DashMap<TileKey, TileRecord>,
}

impl MemoryTileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl TileIndex for MemoryTileIndex {
    fn get(&self, key: &TileKey) -> BoxFuture<'_, Result<Option<TileRecord>, IndexError>> {
        let record = self.records.get(key).map(|entry| entry.value().clone());
        Box::pin(async move { Ok(record) })
    }

    fn upsert(&self, record: TileRecord) -> BoxFuture<'_, Result<(), IndexError>> {
        self.records.insert(record.key.clone(), record);
        Box::pin(async { Ok(()) })
    }

    fn delete(&self, key: &TileKey) -> BoxFuture<'_, Result<bool, IndexError>> {
        let removed = self.records.remove(key).is_some();
        Box::pin(async move { Ok(removed) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::TileStatus;

    #[tokio::test]
    async fn test_upsert_replaces() {
        let index = MemoryTileIndex::new();
        let key = TileKey::imagery("p", 3, 1, 2);

        index.upsert(TileRecord::pending(key.clone())).await.unwrap();
        index
            .upsert(TileRecord::ready(key.clone(), Some("00".into()), 9))
            .await
            .unwrap();

        let record = index.get(&key).await.unwrap().unwrap();
        assert_eq!(record.status, TileStatus::Ready);
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let index = MemoryTileIndex::new();
        let key = TileKey::terrain(1, 4, 0, 0);
        assert!(!index.delete(&key).await.unwrap());

        index.upsert(TileRecord::failed(key.clone())).await.unwrap();
        assert!(index.delete(&key).await.unwrap());
        assert!(index.get(&key).await.unwrap().is_none());
    }
}
