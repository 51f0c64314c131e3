//! Tile index interface and record types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::key::TileKey;
pub use crate::store::BoxFuture;

/// Generation status of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileStatus {
    /// A generation attempt has started but not finished.
    Pending,
    /// The object is stored and matches the recorded size.
    Ready,
    /// The last attempt failed; the next request retries.
    Failed,
    /// The origin has no data for this key.
    Absent,
}

impl TileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TileStatus::Pending => "pending",
            TileStatus::Ready => "ready",
            TileStatus::Failed => "failed",
            TileStatus::Absent => "absent",
        }
    }
}

impl fmt::Display for TileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TileStatus {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TileStatus::Pending),
            "ready" => Ok(TileStatus::Ready),
            "failed" => Ok(TileStatus::Failed),
            "absent" => Ok(TileStatus::Absent),
            other => Err(IndexError::Corrupt(format!("unknown status '{}'", other))),
        }
    }
}

/// Durable bookkeeping for one tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRecord {
    pub key: TileKey,
    pub status: TileStatus,
    /// SHA-256 hex digest of the stored object. Only set for `Ready` records
    /// written by the coordinator.
    pub checksum: Option<String>,
    pub size_bytes: u64,
    pub updated_at: DateTime<Utc>,
}

impl TileRecord {
    pub fn pending(key: TileKey) -> Self {
        Self::with_status(key, TileStatus::Pending)
    }

    pub fn ready(key: TileKey, checksum: Option<String>, size_bytes: u64) -> Self {
        Self {
            key,
            status: TileStatus::Ready,
            checksum,
            size_bytes,
            updated_at: Utc::now(),
        }
    }

    pub fn failed(key: TileKey) -> Self {
        Self::with_status(key, TileStatus::Failed)
    }

    pub fn absent(key: TileKey) -> Self {
        Self::with_status(key, TileStatus::Absent)
    }

    fn with_status(key: TileKey, status: TileStatus) -> Self {
        Self {
            key,
            status,
            checksum: None,
            size_bytes: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == TileStatus::Ready
    }

    /// Time elapsed since the record was last written.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.updated_at)
    }
}

/// Errors that can occur during index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A stored row could not be decoded.
    #[error("Corrupt index row: {0}")]
    Corrupt(String),

    #[error("Index unavailable: {0}")]
    Unavailable(String),
}

/// Durable record store keyed by tile key.
pub trait TileIndex: Send + Sync {
    /// Fetches the record for a key.
    fn get(&self, key: &TileKey) -> BoxFuture<'_, Result<Option<TileRecord>, IndexError>>;

    /// Inserts or replaces the record for `record.key`.
    fn upsert(&self, record: TileRecord) -> BoxFuture<'_, Result<(), IndexError>>;

    /// Removes the record for a key. Returns `true` if one existed.
    fn delete(&self, key: &TileKey) -> BoxFuture<'_, Result<bool, IndexError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            TileStatus::Pending,
            TileStatus::Ready,
            TileStatus::Failed,
            TileStatus::Absent,
        ] {
            assert_eq!(status.as_str().parse::<TileStatus>().unwrap(), status);
        }
        assert!("done".parse::<TileStatus>().is_err());
    }

    #[test]
    fn test_constructors() {
        let key = TileKey::terrain(1, 8, 0, 0);
        assert_eq!(TileRecord::pending(key.clone()).status, TileStatus::Pending);
        assert_eq!(TileRecord::absent(key.clone()).status, TileStatus::Absent);

        let ready = TileRecord::ready(key, Some("ab".into()), 42);
        assert!(ready.is_ready());
        assert_eq!(ready.size_bytes, 42);
    }

    #[test]
    fn test_age() {
        let mut record = TileRecord::failed(TileKey::terrain(1, 8, 0, 0));
        let now = Utc::now();
        record.updated_at = now - chrono::Duration::seconds(90);
        assert_eq!(record.age(now).num_seconds(), 90);
    }
}
