//! Key/value storage adapter for codeplay.
//!
//! This is the bottom of the codeplay stack. Everything at this level is a
//! plain string keyed by a plain string - no workspace semantics, no JSON,
//! no namespaces. Higher layers decide what the keys mean.
//!
//! The contract is infallible: `get`, `set` and `remove` never
//! return errors. When the persistent backend is unavailable the adapter
//! degrades to a process-local map so callers stay backend-agnostic.
//!
//! # Example
//!
//! ```rust
//! use codeplay_kv_store::{KvStore, MemoryStore};
//!
//! let mut store = MemoryStore::new();
//! store.set("workspace:python", "{}");
//! assert_eq!(store.get("workspace:python").as_deref(), Some("{}"));
//!
//! store.remove("workspace:python");
//! assert_eq!(store.get("workspace:python"), None);
//! ```
//!
//! # Persistent storage
//!
//! Use [`open_store`] to get a disk-backed [`Storage`] when a data directory
//! is usable, or an in-memory one when it is not:
//!
//! ```rust,no_run
//! use codeplay_kv_store::{open_store, KvStore};
//!
//! let mut storage = open_store(Some(std::path::Path::new("/tmp/codeplay")));
//! storage.set("language", "python");
//! ```

mod fallback;
mod local_disk;
mod memory;
mod traits;

pub use fallback::{open_store, Storage};
pub use local_disk::DiskStore;
pub use memory::MemoryStore;
pub use traits::KvStore;
