//! In-memory object store.
//!
//! Backed by a `DashMap`, so reads and writes for different keys never
//! contend. Used for tests and for ephemeral deployments where tiles only
//! need to survive for the life of the process.

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use dashmap::DashMap;
use futures::StreamExt;

use crate::store::traits::{
    validate_key, BoxFuture, ObjectMeta, ObjectStore, ObjectStream, StoreError,
};

/// In-memory object store.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: DashMap<String, Bytes>,
    puts: AtomicU64,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `put` calls that reached the store.
    pub fn put_count(&self) -> u64 {
        self.puts.load(Ordering::Relaxed)
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn exists(&self, key: &str) -> BoxFuture<'_, Result<Option<ObjectMeta>, StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            validate_key(&key)?;
            Ok(self.objects.get(&key).map(|entry| ObjectMeta {
                key: key.clone(),
                size: entry.len() as u64,
            }))
        })
    }

    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<ObjectStream>, StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            validate_key(&key)?;
            let data = self.objects.get(&key).map(|entry| entry.value().clone());
            Ok(data.map(|data| {
                futures::stream::once(async move { Ok::<_, StoreError>(data) }).boxed()
            }))
        })
    }

    fn put(&self, key: &str, data: Bytes) -> BoxFuture<'_, Result<(), StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            validate_key(&key)?;
            self.puts.fetch_add(1, Ordering::Relaxed);
            self.objects.insert(key, data);
            Ok(())
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, Result<bool, StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            validate_key(&key)?;
            Ok(self.objects.remove(&key).is_some())
        })
    }

    fn list(&self, prefix: &str) -> BoxFuture<'_, Result<Vec<ObjectMeta>, StoreError>> {
        let prefix = prefix.to_string();
        Box::pin(async move {
            let mut listed: Vec<ObjectMeta> = self
                .objects
                .iter()
                .filter(|entry| entry.key().starts_with(&prefix))
                .map(|entry| ObjectMeta {
                    key: entry.key().clone(),
                    size: entry.value().len() as u64,
                })
                .collect();
            listed.sort_by(|a, b| a.key.cmp(&b.key));
            Ok(listed)
        })
    }
}
