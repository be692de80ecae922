//! Error types for session operations.

use codeplay_vfs::VfsError;
use thiserror::Error;

/// Errors returned to the front end. None of them leave the session in a
/// partially updated state.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A workspace mutation was rejected.
    #[error(transparent)]
    Vfs(#[from] VfsError),

    /// The operation needs an open file and there is none.
    #[error("no file open")]
    NoOpenFile,

    /// The highlighter could not be loaded.
    #[error("syntax highlighting unavailable: {0}")]
    HighlightUnavailable(String),
}

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
