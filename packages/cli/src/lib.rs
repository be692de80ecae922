//! Terminal front end for codeplay.
//!
//! The shell stands in for the browser playground's widgets: `ls` is the
//! file tree, `edit` and `append` are the editor, `new` and `mkdir` the
//! creation dialog, and run output is printed as the console.
//!
//! # Architecture
//!
//! - `core`: host-independent command loop that owns the session
//! - `io`: the `IoHost` trait between core and host
//! - `host`: the Reedline terminal host
//! - `config`: `config.json` and data directory resolution

pub mod completer;
pub mod config;
pub mod console;
pub mod core;
pub mod error;
pub mod highlighter;
pub mod host;
pub mod io;
pub mod syntax;

use std::path::PathBuf;

use codeplay_kv_store::{open_store, Storage};
use codeplay_runner::RuntimeRegistry;
use codeplay_session::SessionController;
use codeplay_vfs::{Language, WorkspaceStore};

pub use config::PlaygroundConfig;
pub use console::PendingConsole;
pub use crate::core::ShellCore;
pub use error::{CliError, ConfigError, Result};

/// Start-up choices made on the command line.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub data_dir: Option<PathBuf>,
    pub language: Option<Language>,
    /// Wipe every workspace before starting.
    pub reset: bool,
    /// Keep nothing on disk.
    pub memory: bool,
}

/// Build a shell over the storage and runtimes described by `config`.
pub fn build_shell(options: &Options, config: &PlaygroundConfig) -> Result<ShellCore<Storage>> {
    let dir = if options.memory {
        None
    } else {
        config.data_dir.as_deref()
    };
    let storage = open_store(dir);
    let persistent = storage.is_persistent();

    let mut store = WorkspaceStore::with_limit(storage, config.max_workspace_bytes);
    if options.reset {
        tracing::info!("resetting all workspaces");
        store.reset_all();
    }

    let requested = match options.language {
        Some(language) => Some(language),
        None if store.load_language().is_none() => config.default_language,
        None => None,
    };
    let registry = RuntimeRegistry::new(config.registry_config());
    let session = SessionController::boot(store, registry, PendingConsole::new(), requested);

    Ok(ShellCore::new(session)?.with_persistence(persistent))
}

/// Run the interactive shell on the terminal.
pub fn run(options: Options) -> Result<()> {
    let data_dir = config::resolve_data_dir(options.data_dir.clone());
    let config = PlaygroundConfig::load(data_dir.as_deref())?;

    let mut shell = build_shell(&options, &config)?;
    shell.upgrade_editor(&syntax::AnsiLoader::from_env());

    let history = if options.memory {
        None
    } else {
        config.history_path()
    };
    let mut host = host::TerminalHost::new(history)?;
    shell.run(&mut host)?;
    Ok(())
}
