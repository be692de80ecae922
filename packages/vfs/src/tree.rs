//! Hierarchical projection of a flat workspace.
//!
//! The projection is rebuilt from scratch on every structural change and is
//! never persisted. Sibling order is computed here: folders before files,
//! then by name.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::entry::EntryKind;
use crate::workspace::Workspace;

/// One node of the projected tree. The root has an empty name and path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }

    /// Find the node at `path` below this one.
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        if path.is_empty() {
            return Some(self);
        }
        let mut node = self;
        for segment in path.split('/') {
            node = node.children.iter().find(|c| c.name == segment)?;
        }
        Some(node)
    }

    /// Depth-first walk yielding `(depth, node)` for every descendant.
    pub fn walk(&self) -> Vec<(usize, &TreeNode)> {
        fn visit<'a>(node: &'a TreeNode, depth: usize, out: &mut Vec<(usize, &'a TreeNode)>) {
            for child in &node.children {
                out.push((depth, child));
                visit(child, depth + 1, out);
            }
        }

        let mut out = Vec::new();
        visit(self, 0, &mut out);
        out
    }
}

#[derive(Default)]
struct Builder {
    kind: Option<EntryKind>,
    children: BTreeMap<String, Builder>,
}

impl Builder {
    fn into_node(self, name: String, path: String) -> TreeNode {
        // Anything with children is a folder, whatever its entry says.
        let kind = if self.children.is_empty() {
            self.kind.unwrap_or(EntryKind::Folder)
        } else {
            EntryKind::Folder
        };

        let mut children: Vec<TreeNode> = self
            .children
            .into_iter()
            .map(|(child, builder)| {
                let child_path = if path.is_empty() {
                    child.clone()
                } else {
                    format!("{}/{}", path, child)
                };
                builder.into_node(child, child_path)
            })
            .collect();

        children.sort_by(|a, b| {
            b.is_folder()
                .cmp(&a.is_folder())
                .then_with(|| a.name.cmp(&b.name))
        });

        TreeNode {
            name,
            path,
            kind,
            children,
        }
    }
}

/// Project `workspace` into a tree rooted at an unnamed folder.
pub fn project(workspace: &Workspace) -> TreeNode {
    let mut root = Builder::default();

    for (path, entry) in workspace.iter() {
        let mut node = &mut root;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            node = node.children.entry(segment.to_string()).or_default();
        }
        node.kind = Some(entry.kind);
    }

    root.into_node(String::new(), String::new())
}
