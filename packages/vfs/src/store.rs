//! Persistence of workspaces and open paths over a key/value store.

use codeplay_kv_store::KvStore;
use serde_json::Value as JsonValue;

use crate::language::Language;
use crate::workspace::Workspace;

/// Serialized workspaces longer than this many bytes are treated as corrupt.
pub const DEFAULT_MAX_WORKSPACE_BYTES: usize = 500_000;

const LANGUAGE_KEY: &str = "language";
const LEGACY_WORKSPACE_KEY: &str = "pyplay_fs";
const LEGACY_OPEN_PATH_KEY: &str = "pyplay_open";

fn workspace_key(language: Language) -> String {
    format!("workspace:{}", language.tag())
}

fn open_path_key(language: Language) -> String {
    format!("openpath:{}", language.tag())
}

/// Why a stored workspace was rejected.
#[derive(Debug)]
enum Corruption {
    Oversized(usize),
    Unparseable(serde_json::Error),
    NotAnObject,
    BadEntries(serde_json::Error),
}

impl std::fmt::Display for Corruption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Corruption::Oversized(len) => write!(f, "{} bytes exceeds size limit", len),
            Corruption::Unparseable(e) => write!(f, "unparseable: {}", e),
            Corruption::NotAnObject => write!(f, "not an object"),
            Corruption::BadEntries(e) => write!(f, "malformed entries: {}", e),
        }
    }
}

/// Loads and saves namespaced workspaces.
///
/// Storage layout:
///
/// | key                 | value                      |
/// |---------------------|----------------------------|
/// | `workspace:<lang>`  | JSON workspace map         |
/// | `openpath:<lang>`   | open file path (absent = none) |
/// | `language`          | last active language tag   |
///
/// Loading never fails. Missing state bootstraps the default workspace;
/// oversized or malformed state is wiped and replaced by the default.
pub struct WorkspaceStore<S> {
    storage: S,
    max_bytes: usize,
}

impl<S: KvStore> WorkspaceStore<S> {
    /// Create a store with the default size ceiling.
    pub fn new(storage: S) -> Self {
        Self::with_limit(storage, DEFAULT_MAX_WORKSPACE_BYTES)
    }

    /// Create a store with a custom size ceiling.
    pub fn with_limit(storage: S, max_bytes: usize) -> Self {
        Self { storage, max_bytes }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_inner(self) -> S {
        self.storage
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Load the workspace of `language`.
    ///
    /// - absent: the default workspace is created and persisted
    /// - oversized, unparseable, or not a map of entries: both keys of the
    ///   namespace are removed and the default workspace is persisted in
    ///   their place
    /// - otherwise: the stored map
    pub fn load_workspace(&mut self, language: Language) -> Workspace {
        self.migrate_legacy(language);

        let key = workspace_key(language);
        let Some(raw) = self.storage.get(&key) else {
            tracing::debug!(%language, "no stored workspace, bootstrapping default");
            let workspace = Workspace::default_for(language);
            self.save_workspace(&workspace, language);
            return workspace;
        };

        match self.parse(&raw) {
            Ok(workspace) => workspace,
            Err(corruption) => {
                tracing::warn!(%language, reason = %corruption, "stored workspace is corrupt, resetting");
                self.reset(language);
                let workspace = Workspace::default_for(language);
                self.save_workspace(&workspace, language);
                workspace
            }
        }
    }

    /// Serialize and write `workspace` unconditionally. Last writer wins.
    pub fn save_workspace(&mut self, workspace: &Workspace, language: Language) {
        match serde_json::to_string(workspace) {
            Ok(json) => self.storage.set(&workspace_key(language), &json),
            // Maps of plain strings always serialize; keep the old value if not.
            Err(err) => tracing::error!(%language, error = %err, "failed to serialize workspace"),
        }
    }

    /// The recorded open path of `language`, if any.
    pub fn load_open_path(&mut self, language: Language) -> Option<String> {
        self.migrate_legacy(language);
        self.storage
            .get(&open_path_key(language))
            .filter(|path| !path.is_empty())
    }

    /// Record the open path. `None` or an empty path removes the key.
    pub fn save_open_path(&mut self, path: Option<&str>, language: Language) {
        let key = open_path_key(language);
        match path.filter(|p| !p.is_empty()) {
            Some(path) => self.storage.set(&key, path),
            None => self.storage.remove(&key),
        }
    }

    /// The last active language, if one was recorded and is still known.
    pub fn load_language(&self) -> Option<Language> {
        self.storage
            .get(LANGUAGE_KEY)
            .and_then(|tag| tag.parse().ok())
    }

    pub fn save_language(&mut self, language: Language) {
        self.storage.set(LANGUAGE_KEY, language.tag());
    }

    /// Remove the stored workspace and open path of `language`.
    pub fn reset(&mut self, language: Language) {
        self.storage.remove(&workspace_key(language));
        self.storage.remove(&open_path_key(language));
    }

    /// Remove every key this store knows about, legacy keys included.
    pub fn reset_all(&mut self) {
        for language in Language::ALL {
            self.reset(language);
        }
        self.storage.remove(LANGUAGE_KEY);
        self.storage.remove(LEGACY_WORKSPACE_KEY);
        self.storage.remove(LEGACY_OPEN_PATH_KEY);
    }

    fn parse(&self, raw: &str) -> Result<Workspace, Corruption> {
        if raw.len() > self.max_bytes {
            return Err(Corruption::Oversized(raw.len()));
        }

        let value: JsonValue = serde_json::from_str(raw).map_err(Corruption::Unparseable)?;
        if !value.is_object() {
            return Err(Corruption::NotAnObject);
        }

        let mut workspace: Workspace =
            serde_json::from_value(value).map_err(Corruption::BadEntries)?;
        workspace.normalize();
        Ok(workspace)
    }

    /// Move the single-language predecessor's keys into the legacy
    /// namespace, unless that namespace already has its own state.
    fn migrate_legacy(&mut self, language: Language) {
        if language != Language::LEGACY {
            return;
        }

        let Some(legacy) = self.storage.get(LEGACY_WORKSPACE_KEY) else {
            return;
        };

        let key = workspace_key(language);
        if self.storage.get(&key).is_none() {
            tracing::info!("migrating legacy workspace into the {} namespace", language);
            self.storage.set(&key, &legacy);
            if let Some(open) = self.storage.get(LEGACY_OPEN_PATH_KEY) {
                self.storage.set(&open_path_key(language), &open);
            }
        }

        self.storage.remove(LEGACY_WORKSPACE_KEY);
        self.storage.remove(LEGACY_OPEN_PATH_KEY);
    }
}
