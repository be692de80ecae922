use serde::{Deserialize, Serialize};

/// The two shapes an entry can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Folder,
}

/// One record of a workspace.
///
/// Folders never carry content. Files always carry their full body, which
/// may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub content: Option<String>,
}

impl Entry {
    /// A file with the given body.
    pub fn file(content: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::File,
            content: Some(content.into()),
        }
    }

    /// An empty folder marker.
    pub fn folder() -> Self {
        Self {
            kind: EntryKind::Folder,
            content: None,
        }
    }

    /// A fresh entry of `kind`: empty body for files, no body for folders.
    pub fn empty(kind: EntryKind) -> Self {
        match kind {
            EntryKind::File => Self::file(""),
            EntryKind::Folder => Self::folder(),
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }

    /// The file body, or `""` for folders.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    /// Restore the kind/content invariant after deserialization.
    pub(crate) fn normalize(&mut self) {
        match self.kind {
            EntryKind::Folder => self.content = None,
            EntryKind::File => {
                if self.content.is_none() {
                    self.content = Some(String::new());
                }
            }
        }
    }
}
