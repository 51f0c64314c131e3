//! On-disk object store.
//!
//! Each object key maps to a file under the store root, so
//! `chunks/1/terrain/r64/0/0.bin` lives at `{root}/chunks/1/terrain/r64/0/0.bin`.
//!
//! Writes go to a sibling temporary file which is then renamed over the
//! target, so readers see either the old object or the complete new one.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::store::traits::{
    validate_key, BoxFuture, ObjectMeta, ObjectStore, ObjectStream, StoreError,
};

/// Marker embedded in temporary file names; listings skip these files.
const TEMP_MARKER: &str = ".tmp-";

/// Filesystem-backed object store.
#[derive(Debug)]
pub struct DiskObjectStore {
    root: PathBuf,
    temp_counter: AtomicU64,
}

impl DiskObjectStore {
    /// Creates a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            temp_counter: AtomicU64::new(0),
        }
    }

    /// Returns the store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |path, segment| path.join(segment)))
    }

    fn temp_path(&self, path: &Path) -> PathBuf {
        let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        let mut name = path
            .file_name()
            .map(|f| f.to_os_string())
            .unwrap_or_default();
        name.push(format!("{}{}-{}", TEMP_MARKER, std::process::id(), n));
        path.with_file_name(name)
    }
}

fn not_found_to_none<T>(result: io::Result<T>) -> Result<Option<T>, StoreError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::Io(e)),
    }
}

/// Recursively collects regular files under `dir` whose key starts with `prefix`.
fn walk(root: &Path, dir: &Path, prefix: &str, out: &mut Vec<ObjectMeta>) -> io::Result<()> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            walk(root, &path, prefix, out)?;
        } else if file_type.is_file() {
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if key.contains(TEMP_MARKER) || !key.starts_with(prefix) {
                continue;
            }
            out.push(ObjectMeta {
                key,
                size: entry.metadata()?.len(),
            });
        }
    }
    Ok(())
}

impl ObjectStore for DiskObjectStore {
    fn exists(&self, key: &str) -> BoxFuture<'_, Result<Option<ObjectMeta>, StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            let path = self.object_path(&key)?;
            let meta = not_found_to_none(tokio::fs::metadata(&path).await)?;
            Ok(meta
                .filter(|m| m.is_file())
                .map(|m| ObjectMeta { key, size: m.len() }))
        })
    }

    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<ObjectStream>, StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            let path = self.object_path(&key)?;
            let file = not_found_to_none(tokio::fs::File::open(&path).await)?;
            Ok(file.map(|file| {
                ReaderStream::new(file)
                    .map(|chunk| chunk.map_err(StoreError::Io))
                    .boxed()
            }))
        })
    }

    fn put(&self, key: &str, data: Bytes) -> BoxFuture<'_, Result<(), StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            let path = self.object_path(&key)?;
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            let temp = self.temp_path(&path);
            let written = async {
                let mut file = tokio::fs::File::create(&temp).await?;
                file.write_all(&data).await?;
                file.sync_all().await?;
                tokio::fs::rename(&temp, &path).await
            }
            .await;

            if let Err(e) = written {
                warn!(key = %key, error = %e, "Object write failed");
                let _ = tokio::fs::remove_file(&temp).await;
                return Err(StoreError::Io(e));
            }

            debug!(key = %key, size_bytes = data.len(), "Object written");
            Ok(())
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, Result<bool, StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            let path = self.object_path(&key)?;
            Ok(not_found_to_none(tokio::fs::remove_file(&path).await)?.is_some())
        })
    }

    fn list(&self, prefix: &str) -> BoxFuture<'_, Result<Vec<ObjectMeta>, StoreError>> {
        let prefix = prefix.to_string();
        let root = self.root.clone();
        Box::pin(async move {
            // Start from the deepest directory fully named by the prefix.
            let start = match prefix.rfind('/') {
                Some(idx) => prefix[..idx]
                    .split('/')
                    .fold(root.clone(), |path, segment| path.join(segment)),
                None => root.clone(),
            };

            let mut listed = tokio::task::spawn_blocking(move || {
                let mut out = Vec::new();
                walk(&root, &start, &prefix, &mut out).map(|_| out)
            })
            .await
            .map_err(|e| StoreError::Unavailable(format!("listing task failed: {}", e)))??;

            listed.sort_by(|a, b| a.key.cmp(&b.key));
            Ok(listed)
        })
    }
}
