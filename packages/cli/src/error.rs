use std::path::PathBuf;

use crate::io::IoError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid configuration in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Anything that stops the shell from starting or keeps it from running.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to start: {0}")]
    Startup(#[from] std::io::Error),
    #[error(transparent)]
    Io(#[from] IoError),
}

pub type Result<T, E = CliError> = std::result::Result<T, E>;
