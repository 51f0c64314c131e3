//! Object store interface.
//!
//! The `ObjectStore` trait is the durable home of tile payloads. Keys are
//! hierarchical `/`-separated strings derived from tile keys; values are
//! opaque bytes written once and read back as a stream.
//!
//! # Dyn Compatibility
//!
//! Async methods return `Pin<Box<dyn Future>>` so stores can be shared as
//! `Arc<dyn ObjectStore>` between the coordinator and the facades.

use std::future::Future;
use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use futures::stream::BoxStream;
use futures::StreamExt;
use thiserror::Error;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Streamed object body.
pub type ObjectStream = BoxStream<'static, Result<Bytes, StoreError>>;

/// Errors that can occur during object store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error from the backing medium.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Key is empty, absolute, or escapes the store root.
    #[error("Invalid object key: '{0}'")]
    InvalidKey(String),

    /// The store cannot serve requests right now.
    #[error("Object store unavailable: {0}")]
    Unavailable(String),
}

/// Metadata for a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    /// Object key.
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
}

/// Key/value blob store for tile payloads.
pub trait ObjectStore: Send + Sync {
    /// Checks whether an object exists.
    ///
    /// Returns its metadata when present, `None` when absent.
    fn exists(&self, key: &str) -> BoxFuture<'_, Result<Option<ObjectMeta>, StoreError>>;

    /// Opens an object for streaming.
    ///
    /// Returns `None` when the object does not exist.
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<ObjectStream>, StoreError>>;

    /// Writes an object, replacing any existing value.
    ///
    /// Readers never observe a partially written object.
    fn put(&self, key: &str, data: Bytes) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Deletes an object.
    ///
    /// Returns `true` if the object existed. Used for ops cleanup only.
    fn delete(&self, key: &str) -> BoxFuture<'_, Result<bool, StoreError>>;

    /// Lists every object whose key starts with `prefix`, sorted by key.
    fn list(&self, prefix: &str) -> BoxFuture<'_, Result<Vec<ObjectMeta>, StoreError>>;
}

/// Drains an object stream into one contiguous buffer.
pub async fn read_all(mut stream: ObjectStream) -> Result<Bytes, StoreError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        buf.extend_from_slice(&chunk?);
    }
    Ok(buf.freeze())
}

/// Rejects keys that are empty, absolute, or contain `.`/`..`/empty segments.
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if bad {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_accepts_hierarchical_keys() {
        assert!(validate_key("chunks/1/terrain/r64/0/0.bin").is_ok());
        assert!(validate_key("dem/srtm/N37W122.hgt").is_ok());
    }

    #[test]
    fn test_validate_key_rejects_escapes() {
        for key in ["", "/etc/passwd", "a/../b", "a//b", "./a", "a/"] {
            assert!(
                matches!(validate_key(key), Err(StoreError::InvalidKey(_))),
                "{:?} should be rejected",
                key
            );
        }
    }

    #[tokio::test]
    async fn test_read_all_concatenates_chunks() {
        let stream: ObjectStream = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"ab")),
            Ok(Bytes::from_static(b"cd")),
        ])
        .boxed();
        assert_eq!(read_all(stream).await.unwrap(), Bytes::from_static(b"abcd"));
    }

    #[test]
    fn test_store_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err: StoreError = io_err.into();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
