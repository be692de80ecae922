//! Backend selection with graceful degradation.

use std::path::Path;

use crate::{DiskStore, KvStore, MemoryStore};

/// The storage actually in use for a session.
///
/// Callers hold a `Storage` and never need to know which variant they got:
/// both satisfy the same infallible [`KvStore`] contract.
#[derive(Debug)]
pub enum Storage {
    /// Values persist across processes under a data directory.
    Disk(DiskStore),
    /// Values live only as long as the process.
    Memory(MemoryStore),
}

impl Storage {
    /// Whether values written here outlive the process.
    pub fn is_persistent(&self) -> bool {
        matches!(self, Storage::Disk(_))
    }
}

impl Default for Storage {
    fn default() -> Self {
        Storage::Memory(MemoryStore::new())
    }
}

impl KvStore for Storage {
    fn get(&self, key: &str) -> Option<String> {
        match self {
            Storage::Disk(store) => store.get(key),
            Storage::Memory(store) => store.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) {
        match self {
            Storage::Disk(store) => store.set(key, value),
            Storage::Memory(store) => store.set(key, value),
        }
    }

    fn remove(&mut self, key: &str) {
        match self {
            Storage::Disk(store) => store.remove(key),
            Storage::Memory(store) => store.remove(key),
        }
    }
}

/// Open the best available storage.
///
/// With a usable directory this is disk-backed. With no directory, or one
/// that cannot be created or written, it silently falls back to a
/// process-local map.
pub fn open_store(dir: Option<&Path>) -> Storage {
    let Some(dir) = dir else {
        tracing::debug!("no data directory configured, using in-memory storage");
        return Storage::default();
    };

    match DiskStore::new(dir) {
        Ok(store) => {
            tracing::debug!(root = %store.root().display(), "using disk storage");
            Storage::Disk(store)
        }
        Err(err) => {
            tracing::warn!(
                dir = %dir.display(),
                error = %err,
                "persistent storage unavailable, falling back to memory"
            );
            Storage::default()
        }
    }
}
