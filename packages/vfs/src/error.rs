//! Error types for workspace mutations.
//!
//! Only user-facing rejections live here. Storage corruption is never an
//! error: the store recovers from it locally.

use thiserror::Error;

/// Errors returned when a workspace mutation is rejected.
///
/// A rejected operation never mutates the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VfsError {
    /// The path is already a key in the workspace.
    #[error("\"{0}\" already exists.")]
    AlreadyExists(String),

    /// The path collides with an existing entry of the other shape, e.g. a
    /// file used as a folder prefix.
    #[error("\"{path}\" conflicts with existing {existing}")]
    PathConflict { path: String, existing: String },

    /// The requested name cannot be used as a path.
    #[error("invalid name '{name}': {message}")]
    InvalidName { name: String, message: String },
}

/// Result type alias for workspace operations.
pub type Result<T> = std::result::Result<T, VfsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_exists_display() {
        let e = VfsError::AlreadyExists("src/app.py".to_string());
        assert_eq!(format!("{}", e), "\"src/app.py\" already exists.");
    }

    #[test]
    fn path_conflict_display() {
        let e = VfsError::PathConflict {
            path: "a/b.py".to_string(),
            existing: "file \"a\"".to_string(),
        };
        let display = format!("{}", e);
        assert!(display.contains("a/b.py"));
        assert!(display.contains("file \"a\""));
    }

    #[test]
    fn invalid_name_display() {
        let e = VfsError::InvalidName {
            name: "..".to_string(),
            message: "relative segments are not allowed".to_string(),
        };
        assert!(format!("{}", e).contains("invalid name '..'"));
    }
}
