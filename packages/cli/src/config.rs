//! Playground configuration.
//!
//! Read from `<data_dir>/config.json`. Every field is optional:
//!
//! ```json
//! {
//!   "default_language": "javascript",
//!   "max_workspace_bytes": 500000,
//!   "run_timeout_ms": 30000,
//!   "runtimes": {
//!     "python": { "kind": "embedded_interpreter", "program": "python3.12", "args": ["-"] }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use codeplay_runner::{RegistryConfig, RuntimeSpec};
use codeplay_vfs::{Language, DEFAULT_MAX_WORKSPACE_BYTES};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Overrides the default data directory.
pub const DATA_DIR_ENV: &str = "CODEPLAY_DATA_DIR";

pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaygroundConfig {
    /// Where workspaces, history and this file live. Not read from the file.
    #[serde(skip)]
    pub data_dir: Option<PathBuf>,
    /// Language to start in when none was recorded.
    pub default_language: Option<Language>,
    pub max_workspace_bytes: usize,
    /// `null` lets runs go on forever.
    pub run_timeout_ms: Option<u64>,
    pub runtimes: BTreeMap<Language, RuntimeSpec>,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            default_language: None,
            max_workspace_bytes: DEFAULT_MAX_WORKSPACE_BYTES,
            run_timeout_ms: Some(30_000),
            runtimes: BTreeMap::new(),
        }
    }
}

impl PlaygroundConfig {
    /// Load `config.json` from `data_dir`, or defaults when there is none.
    pub fn load(data_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(dir) = data_dir else {
            return Ok(Self::default());
        };

        let path = dir.join(CONFIG_FILE);
        let mut config = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str::<Self>(&text)
                .map_err(|source| ConfigError::Parse { path: path.clone(), source })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        tracing::debug!(path = %path.display(), "loaded configuration");
        config.data_dir = Some(dir.to_path_buf());
        Ok(config)
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            runtimes: self.runtimes.clone(),
            run_timeout: self.run_timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn history_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join("history.txt"))
    }
}

/// The data directory: `flag`, else `$CODEPLAY_DATA_DIR`, else the
/// platform's local data directory.
pub fn resolve_data_dir(flag: Option<PathBuf>) -> Option<PathBuf> {
    flag.or_else(|| {
        std::env::var_os(DATA_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    })
    .or_else(|| dirs::data_local_dir().map(|p| p.join("codeplay")))
}
