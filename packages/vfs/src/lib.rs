//! Virtual filesystem for codeplay.
//!
//! This layer adds meaning to the raw strings of the storage adapter:
//! - `Language`: the namespace tag selecting one workspace
//! - `Entry`: a File or Folder record
//! - `Workspace`: the flat path → Entry map of one namespace
//! - `WorkspaceStore`: load/save with default bootstrap and corruption recovery
//! - `TreeNode`: the hierarchical projection consumed by tree widgets
//!
//! # Example
//!
//! ```rust
//! use codeplay_kv_store::MemoryStore;
//! use codeplay_vfs::{EntryKind, Language, WorkspaceStore};
//!
//! let mut store = WorkspaceStore::new(MemoryStore::new());
//! let mut workspace = store.load_workspace(Language::JavaScript);
//! assert!(workspace.contains("main.js"));
//!
//! let path = workspace.create_entry("util", EntryKind::File, Language::JavaScript).unwrap();
//! assert_eq!(path, "util.js");
//! store.save_workspace(&workspace, Language::JavaScript);
//! ```

mod entry;
mod error;
mod language;
mod store;
pub mod tree;
mod workspace;

pub use entry::{Entry, EntryKind};
pub use error::{Result, VfsError};
pub use language::{Language, ParseLanguageError};
pub use store::{WorkspaceStore, DEFAULT_MAX_WORKSPACE_BYTES};
pub use tree::{project, TreeNode};
pub use workspace::{join_path, Workspace};
