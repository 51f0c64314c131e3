//! SQLite-backed tile index.
//!
//! One row per tile, keyed by `(kind, object_key)`. The connection sits
//! behind a mutex and every statement runs on the blocking pool, so async
//! callers never stall a runtime worker on disk I/O.

use std::path::Path;
use std::sync::Arc;

use chrono::DateTime;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::index::traits::{BoxFuture, IndexError, TileIndex, TileRecord, TileStatus};
use crate::key::TileKey;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS tiles (
    kind        TEXT    NOT NULL,
    object_key  TEXT    NOT NULL,
    status      TEXT    NOT NULL,
    checksum    TEXT,
    size_bytes  INTEGER NOT NULL,
    updated_at  INTEGER NOT NULL,
    PRIMARY KEY (kind, object_key)
);
";

/// Tile index persisted in a SQLite database.
#[derive(Clone)]
pub struct SqliteTileIndex {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqliteTileIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteTileIndex").finish_non_exhaustive()
    }
}

impl SqliteTileIndex {
    /// Opens (or creates) the database at `path` and ensures the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| IndexError::Unavailable(format!("{}: {}", parent.display(), e)))?;
        }
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "Opened tile index");
        Self::init(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self, IndexError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, IndexError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, IndexError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, IndexError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || f(&conn.lock()))
            .await
            .map_err(|e| IndexError::Unavailable(format!("index task failed: {}", e)))?
    }
}

fn decode_row(
    key: TileKey,
    status: String,
    checksum: Option<String>,
    size_bytes: i64,
    updated_at: i64,
) -> Result<TileRecord, IndexError> {
    let updated_at = DateTime::from_timestamp_millis(updated_at)
        .ok_or_else(|| IndexError::Corrupt(format!("timestamp {} out of range", updated_at)))?;
    let size_bytes = u64::try_from(size_bytes)
        .map_err(|_| IndexError::Corrupt(format!("negative size {}", size_bytes)))?;
    Ok(TileRecord {
        key,
        status: status.parse()?,
        checksum,
        size_bytes,
        updated_at,
    })
}

impl TileIndex for SqliteTileIndex {
    fn get(&self, key: &TileKey) -> BoxFuture<'_, Result<Option<TileRecord>, IndexError>> {
        let key = key.clone();
        Box::pin(self.with_conn(move |conn| {
            let row = conn
                .query_row(
                    "SELECT status, checksum, size_bytes, updated_at
                     FROM tiles WHERE kind = ?1 AND object_key = ?2",
                    params![key.kind().as_str(), key.object_key()],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, Option<String>>(1)?,
                            row.get::<_, i64>(2)?,
                            row.get::<_, i64>(3)?,
                        ))
                    },
                )
                .optional()?;

            row.map(|(status, checksum, size, updated)| {
                decode_row(key, status, checksum, size, updated)
            })
            .transpose()
        }))
    }

    fn upsert(&self, record: TileRecord) -> BoxFuture<'_, Result<(), IndexError>> {
        Box::pin(self.with_conn(move |conn| {
            let size = i64::try_from(record.size_bytes).map_err(|_| {
                IndexError::Corrupt(format!("size {} exceeds i64", record.size_bytes))
            })?;
            conn.execute(
                "INSERT INTO tiles (kind, object_key, status, checksum, size_bytes, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (kind, object_key) DO UPDATE SET
                     status = excluded.status,
                     checksum = excluded.checksum,
                     size_bytes = excluded.size_bytes,
                     updated_at = excluded.updated_at",
                params![
                    record.key.kind().as_str(),
                    record.key.object_key(),
                    record.status.as_str(),
                    record.checksum,
                    size,
                    record.updated_at.timestamp_millis(),
                ],
            )?;
            Ok(())
        }))
    }

    fn delete(&self, key: &TileKey) -> BoxFuture<'_, Result<bool, IndexError>> {
        let key = key.clone();
        Box::pin(self.with_conn(move |conn| {
            let removed = conn.execute(
                "DELETE FROM tiles WHERE kind = ?1 AND object_key = ?2",
                params![key.kind().as_str(), key.object_key()],
            )?;
            Ok(removed > 0)
        }))
    }
}
