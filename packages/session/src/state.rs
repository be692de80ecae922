use std::collections::BTreeMap;

use codeplay_vfs::{Language, Workspace};

/// Everything the session knows about the active namespace.
///
/// Folder expansion is remembered per language for the lifetime of the
/// session and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub(crate) active_language: Language,
    pub(crate) open_path: Option<String>,
    pub(crate) workspace: Workspace,
    pub(crate) folders: BTreeMap<Language, BTreeMap<String, bool>>,
}

impl SessionState {
    pub fn active_language(&self) -> Language {
        self.active_language
    }

    pub fn open_path(&self) -> Option<&str> {
        self.open_path.as_deref()
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Folders are expanded unless collapsed explicitly.
    pub fn is_folder_open(&self, path: &str) -> bool {
        self.folders
            .get(&self.active_language)
            .and_then(|folders| folders.get(path))
            .copied()
            .unwrap_or(true)
    }

    pub(crate) fn set_folder_open(&mut self, path: &str, open: bool) {
        self.folders
            .entry(self.active_language)
            .or_default()
            .insert(path.to_string(), open);
    }

    /// Whether the open file is `path` or lies below it.
    pub(crate) fn open_path_within(&self, path: &str) -> bool {
        match &self.open_path {
            Some(open) => open == path || open.starts_with(&format!("{}/", path)),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folders_default_open_per_language() {
        let mut state = SessionState::default();
        assert!(state.is_folder_open("src"));

        state.set_folder_open("src", false);
        assert!(!state.is_folder_open("src"));

        state.active_language = Language::Clojure;
        assert!(state.is_folder_open("src"));
    }

    #[test]
    fn open_path_within_respects_segments() {
        let state = SessionState {
            open_path: Some("src/app.py".to_string()),
            ..SessionState::default()
        };
        assert!(state.open_path_within("src"));
        assert!(state.open_path_within("src/app.py"));
        assert!(!state.open_path_within("sr"));
        assert!(!state.open_path_within("src/app"));
    }
}
