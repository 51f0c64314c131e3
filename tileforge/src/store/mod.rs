//! Durable object storage for tile payloads.
//!
//! Two backends are provided:
//!
//! - [`DiskObjectStore`] maps object keys onto a directory tree
//! - [`MemoryObjectStore`] keeps everything in a concurrent map
//!
//! Both are shared as `Arc<dyn ObjectStore>`.

mod disk;
mod memory;
mod traits;

pub use disk::DiskObjectStore;
pub use memory::MemoryObjectStore;
pub use traits::{read_all, BoxFuture, ObjectMeta, ObjectStore, ObjectStream, StoreError};
pub(crate) use traits::validate_key;
