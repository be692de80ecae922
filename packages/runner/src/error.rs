//! Error types for the runner layer.

use codeplay_vfs::Language;
use thiserror::Error;

/// Errors that can occur while acquiring or driving an engine.
///
/// Runs never return these: `Runner::run` reports every failure on the
/// stderr channel. They surface from `load` and from engine providers.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The engine could not be acquired, or does not behave like one.
    #[error("{language} runtime unavailable: {reason}")]
    EngineUnavailable { language: Language, reason: String },

    /// `run` was called before a successful `load`.
    #[error("{0} runtime is not loaded")]
    NotLoaded(Language),

    /// The worker task exited and can no longer accept runs.
    #[error("{0} worker is gone")]
    WorkerGone(Language),

    /// An I/O error occurred while talking to an engine.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunnerError {
    pub fn unavailable(language: Language, reason: impl Into<String>) -> Self {
        RunnerError::EngineUnavailable {
            language,
            reason: reason.into(),
        }
    }
}

/// Result type alias for runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_display() {
        let e = RunnerError::unavailable(Language::Clojure, "bb not found");
        assert_eq!(e.to_string(), "clojure runtime unavailable: bb not found");
    }

    #[test]
    fn io_errors_convert() {
        let e: RunnerError = std::io::Error::other("pipe closed").into();
        assert!(matches!(e, RunnerError::Io(_)));
    }
}
