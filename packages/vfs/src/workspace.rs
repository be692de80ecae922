//! The flat path → entry map of one namespace.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entry::{Entry, EntryKind};
use crate::error::{Result, VfsError};
use crate::language::Language;

/// A flat mapping from '/'-delimited paths to entries.
///
/// Ancestor folders do not need explicit entries: tree projection
/// synthesizes them from path structure. Explicit folder entries exist only
/// to record folders that have no files yet.
///
/// Iteration order is lexicographic by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Workspace {
    entries: BTreeMap<String, Entry>,
}

impl Workspace {
    /// Create an empty workspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// The workspace a fresh namespace starts with: one hello-world file.
    pub fn default_for(language: Language) -> Self {
        let mut workspace = Self::new();
        workspace.insert(
            language.default_file_name(),
            Entry::file(language.hello_world()),
        );
        workspace
    }

    pub fn get(&self, path: &str) -> Option<&Entry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Whether `path` names a file entry.
    pub fn is_file(&self, path: &str) -> bool {
        self.get(path).is_some_and(Entry::is_file)
    }

    /// Insert or replace an entry without any validation.
    pub fn insert(&mut self, path: impl Into<String>, entry: Entry) -> Option<Entry> {
        self.entries.insert(path.into(), entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    /// The first file in iteration order.
    pub fn first_file(&self) -> Option<&str> {
        self.iter()
            .find(|(_, entry)| entry.is_file())
            .map(|(path, _)| path)
    }

    /// Replace the body of a file. Returns `false` (and changes nothing)
    /// when `path` is not a file.
    pub fn set_content(&mut self, path: &str, content: &str) -> bool {
        match self.entries.get_mut(path) {
            Some(entry) if entry.is_file() => {
                entry.content = Some(content.to_string());
                true
            }
            _ => false,
        }
    }

    /// Create a new empty entry.
    ///
    /// Files whose final segment has no extension get the language's
    /// default extension appended. Returns the final path.
    ///
    /// Rejects, without mutating:
    /// - paths that already exist
    /// - paths below an existing file (`a/b` when `a` is a file)
    /// - files that would shadow an existing folder prefix (`a` when `a/b`
    ///   exists)
    pub fn create_entry(
        &mut self,
        path: &str,
        kind: EntryKind,
        language: Language,
    ) -> Result<String> {
        let mut path = normalize_path(path)?;

        if kind == EntryKind::File {
            let last = path.rsplit('/').next().unwrap_or(path.as_str());
            if !last.contains('.') {
                path.push_str(language.extension());
            }
        }

        if self.contains(&path) {
            return Err(VfsError::AlreadyExists(path));
        }

        for ancestor in ancestors(&path) {
            if self.is_file(ancestor) {
                return Err(VfsError::PathConflict {
                    path: path.clone(),
                    existing: format!("file \"{}\"", ancestor),
                });
            }
        }

        if kind == EntryKind::File {
            let prefix = format!("{}/", path);
            if let Some(child) = self.paths().find(|p| p.starts_with(&prefix)) {
                return Err(VfsError::PathConflict {
                    existing: format!("folder contents \"{}\"", child),
                    path,
                });
            }
        }

        tracing::debug!(path = %path, ?kind, "creating entry");
        self.entries.insert(path.clone(), Entry::empty(kind));
        Ok(path)
    }

    /// Remove `path` and everything below it.
    ///
    /// Keys that merely share a textual prefix (`src2` for `src`) are left
    /// alone. Returns the removed paths in iteration order.
    pub fn delete_entry(&mut self, path: &str) -> Vec<String> {
        let prefix = format!("{}/", path);
        let doomed: Vec<String> = self
            .paths()
            .filter(|p| *p == path || p.starts_with(&prefix))
            .map(str::to_string)
            .collect();

        for key in &doomed {
            self.entries.remove(key);
        }

        tracing::debug!(path, removed = doomed.len(), "deleted entries");
        doomed
    }

    /// Restore entry invariants after loading untrusted data.
    pub(crate) fn normalize(&mut self) {
        for entry in self.entries.values_mut() {
            entry.normalize();
        }
    }
}

impl FromIterator<(String, Entry)> for Workspace {
    fn from_iter<I: IntoIterator<Item = (String, Entry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Join a parent folder path and a child name into one workspace path.
///
/// An empty parent means the workspace root.
pub fn join_path(parent: Option<&str>, name: &str) -> String {
    match parent.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
        Some(parent) => format!("{}/{}", parent, name.trim_start_matches('/')),
        None => name.to_string(),
    }
}

/// Proper ancestor prefixes of `path`, outermost first.
fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices('/').map(move |(i, _)| &path[..i])
}

/// Strip surrounding slashes and validate every segment.
fn normalize_path(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_matches('/');
    let invalid = |message: &str| VfsError::InvalidName {
        name: raw.to_string(),
        message: message.to_string(),
    };

    if trimmed.is_empty() {
        return Err(invalid("name is empty"));
    }

    for segment in trimmed.split('/') {
        if segment.is_empty() {
            return Err(invalid("empty path segment"));
        }
        if segment == "." || segment == ".." {
            return Err(invalid("relative segments are not allowed"));
        }
        if segment.chars().any(char::is_control) {
            return Err(invalid("control characters are not allowed"));
        }
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Workspace {
        [
            ("main.py".to_string(), Entry::file("print(1)")),
            ("src".to_string(), Entry::folder()),
            ("src/app.py".to_string(), Entry::file("print(2)")),
            ("src/utils/helpers.py".to_string(), Entry::file("print(3)")),
            ("src2".to_string(), Entry::file("")),
            ("srcfoo".to_string(), Entry::folder()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn default_workspace() {
        let ws = Workspace::default_for(Language::Python);
        assert_eq!(ws.len(), 1);
        assert_eq!(ws.get("main.py"), Some(&Entry::file("print(\"hello world\")")));
    }

    #[test]
    fn create_file_appends_extension() {
        let mut ws = Workspace::new();
        let path = ws
            .create_entry("x", EntryKind::File, Language::JavaScript)
            .unwrap();
        assert_eq!(path, "x.js");
        assert_eq!(ws.get("x.js"), Some(&Entry::file("")));
    }

    #[test]
    fn create_file_keeps_existing_extension() {
        let mut ws = Workspace::new();
        let path = ws
            .create_entry("notes.txt", EntryKind::File, Language::Python)
            .unwrap();
        assert_eq!(path, "notes.txt");
    }

    #[test]
    fn extension_check_uses_final_segment() {
        let mut ws = Workspace::new();
        let path = ws
            .create_entry("pkg.v1/mod", EntryKind::File, Language::Clojure)
            .unwrap();
        assert_eq!(path, "pkg.v1/mod.clj");
    }

    #[test]
    fn create_folder_has_no_content() {
        let mut ws = Workspace::new();
        let path = ws
            .create_entry("lib", EntryKind::Folder, Language::Python)
            .unwrap();
        assert_eq!(path, "lib");
        assert_eq!(ws.get("lib"), Some(&Entry::folder()));
    }

    #[test]
    fn second_create_is_rejected_without_mutation() {
        let mut ws = Workspace::new();
        ws.create_entry("a.py", EntryKind::File, Language::Python)
            .unwrap();
        ws.set_content("a.py", "x = 1");
        let before = ws.clone();

        let err = ws
            .create_entry("a.py", EntryKind::File, Language::Python)
            .unwrap_err();
        assert_eq!(err, VfsError::AlreadyExists("a.py".to_string()));
        assert_eq!(ws, before);
    }

    #[test]
    fn file_prefix_conflicts_are_rejected() {
        let mut ws = Workspace::new();
        ws.create_entry("a", EntryKind::Folder, Language::Python)
            .unwrap();
        ws.insert("b", Entry::file(""));

        // Folder "a" already exists as a key
        assert!(matches!(
            ws.create_entry("a", EntryKind::Folder, Language::Python),
            Err(VfsError::AlreadyExists(_))
        ));

        // Nothing may live below a file
        assert!(matches!(
            ws.create_entry("b/c.py", EntryKind::File, Language::Python),
            Err(VfsError::PathConflict { .. })
        ));
    }

    #[test]
    fn file_cannot_shadow_implicit_folder() {
        let mut ws = Workspace::new();
        ws.insert("pkg.d/mod.py", Entry::file(""));

        let err = ws
            .create_entry("pkg.d", EntryKind::File, Language::Python)
            .unwrap_err();
        assert!(matches!(err, VfsError::PathConflict { .. }));
        assert_eq!(ws.len(), 1);

        // A sibling with a different name is fine
        assert_eq!(
            ws.create_entry("pkg", EntryKind::File, Language::Python),
            Ok("pkg.py".to_string())
        );
    }

    #[test]
    fn folder_over_implicit_folder_is_allowed() {
        let mut ws = Workspace::new();
        ws.insert("pkg/mod.py", Entry::file(""));

        assert_eq!(
            ws.create_entry("pkg", EntryKind::Folder, Language::Python),
            Ok("pkg".to_string())
        );
    }

    #[test]
    fn invalid_names_are_rejected() {
        let mut ws = Workspace::new();
        for name in ["", "/", "a//b", "../x", "a/./b"] {
            assert!(
                matches!(
                    ws.create_entry(name, EntryKind::Folder, Language::Python),
                    Err(VfsError::InvalidName { .. })
                ),
                "{name:?} should be rejected"
            );
        }
        assert!(ws.is_empty());
    }

    #[test]
    fn surrounding_slashes_are_trimmed() {
        let mut ws = Workspace::new();
        let path = ws
            .create_entry("/src/", EntryKind::Folder, Language::Python)
            .unwrap();
        assert_eq!(path, "src");
    }

    #[test]
    fn delete_cascades_to_descendants_only() {
        let mut ws = sample();
        let removed = ws.delete_entry("src");

        assert_eq!(removed, vec!["src", "src/app.py", "src/utils/helpers.py"]);
        assert!(ws.contains("src2"));
        assert!(ws.contains("srcfoo"));
        assert!(ws.contains("main.py"));
        assert_eq!(ws.len(), 3);
    }

    #[test]
    fn delete_implicit_folder() {
        let mut ws = sample();
        let removed = ws.delete_entry("src/utils");
        assert_eq!(removed, vec!["src/utils/helpers.py"]);
    }

    #[test]
    fn delete_missing_is_noop() {
        let mut ws = sample();
        assert!(ws.delete_entry("nope").is_empty());
        assert_eq!(ws, sample());
    }

    #[test]
    fn first_file_skips_folders() {
        let ws: Workspace = [
            ("a".to_string(), Entry::folder()),
            ("b.py".to_string(), Entry::file("")),
        ]
        .into_iter()
        .collect();
        assert_eq!(ws.first_file(), Some("b.py"));
        assert_eq!(Workspace::new().first_file(), None);
    }

    #[test]
    fn set_content_only_touches_files() {
        let mut ws = sample();
        assert!(ws.set_content("main.py", "print(9)"));
        assert_eq!(ws.get("main.py").unwrap().text(), "print(9)");
        assert!(!ws.set_content("src", "nope"));
        assert!(!ws.set_content("missing.py", "nope"));
        assert_eq!(ws.get("src"), Some(&Entry::folder()));
    }

    #[test]
    fn join_path_handles_root() {
        assert_eq!(join_path(None, "a.py"), "a.py");
        assert_eq!(join_path(Some(""), "a.py"), "a.py");
        assert_eq!(join_path(Some("src/"), "a.py"), "src/a.py");
    }

    #[test]
    fn serializes_as_plain_map() {
        let ws = Workspace::default_for(Language::Python);
        let json = serde_json::to_string(&ws).unwrap();
        assert_eq!(
            json,
            r#"{"main.py":{"type":"file","content":"print(\"hello world\")"}}"#
        );
    }
}
