//! Session controller for codeplay.
//!
//! Ties the namespaced workspace, the runner registry, an editor surface
//! and a console together. Front ends drive a `SessionController` and
//! render what it exposes:
//!
//! - `tree()` for the file tree, `open_file` / `delete_item` as its actions
//! - `editor()` for the editing surface, `handle_edit` for user edits
//! - the `Console` it was built with for run output
//! - `create_item` for the creation dialog
//!
//! The controller owns all session state explicitly; there are no globals.

mod console;
mod controller;
mod editor;
mod error;
mod state;

pub use console::{Console, MemoryConsole};
pub use controller::{
    CreateRequest, SessionController, HIGHLIGHTING_READY, HIGHLIGHTING_UNAVAILABLE,
    LOADING_HIGHLIGHTING, NO_FILE_OPEN,
};
pub use editor::{Buffer, ChangeListener, Editor, EditorSurface, Highlighter, HighlighterLoader};
pub use error::{Result, SessionError};
pub use state::SessionState;
