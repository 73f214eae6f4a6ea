//! Non-mutating filter over a file tree.
//!
//! Filtering builds a new forest bottom-up. The input is never touched; any
//! subtree that survives unchanged is shared with the input through `Arc`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::query::contains_folded;

/// File or directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Leaf entry.
    File,
    /// Entry with children.
    Directory,
}

/// One entry of the explorer tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    /// Display name (last path component).
    pub name: String,
    /// Absolute path, unique within the tree.
    pub path: String,
    /// File or directory.
    pub kind: NodeKind,
    /// Extension for files, used to pick an icon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    /// Children, empty for files.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<Arc<FileNode>>,
}

impl FileNode {
    /// A file node; the extension is taken from the name.
    #[must_use]
    pub fn file(parent: &str, name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            path: join(parent, name),
            kind: NodeKind::File,
            extension: name.rsplit_once('.').map(|(_, ext)| ext.to_string()),
            children: Vec::new(),
        })
    }

    /// A directory node whose children were built with `path` as parent.
    #[must_use]
    pub fn directory(parent: &str, name: &str, children: Vec<Arc<Self>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            path: join(parent, name),
            kind: NodeKind::Directory,
            extension: None,
            children,
        })
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Number of nodes in this subtree, itself included.
    #[must_use]
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(|c| c.size()).sum::<usize>()
    }

    /// Depth-first search for a node by path.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<&Self> {
        if self.path == path {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(path))
    }
}

fn join(parent: &str, name: &str) -> String {
    format!("{}/{name}", parent.trim_end_matches('/'))
}

/// Filter a forest by case-insensitive name match.
///
/// A file survives when its name matches. A directory survives when its name
/// matches or any descendant survives; its children are then the surviving
/// children only. An empty query returns the input forest as-is.
#[must_use]
pub fn filter_tree(nodes: &[Arc<FileNode>], query: &str) -> Vec<Arc<FileNode>> {
    let query = query.trim();
    if query.is_empty() {
        return nodes.to_vec();
    }
    nodes.iter().filter_map(|n| filter_node(n, query)).collect()
}

fn filter_node(node: &Arc<FileNode>, query: &str) -> Option<Arc<FileNode>> {
    let name_matches = contains_folded(&node.name, query);
    if node.children.is_empty() {
        return name_matches.then(|| Arc::clone(node));
    }

    let kept: Vec<Arc<FileNode>> = node
        .children
        .iter()
        .filter_map(|c| filter_node(c, query))
        .collect();

    if kept.is_empty() {
        // A matching directory is listed, but without unmatched children.
        return name_matches.then(|| {
            Arc::new(FileNode {
                name: node.name.clone(),
                path: node.path.clone(),
                kind: node.kind,
                extension: node.extension.clone(),
                children: Vec::new(),
            })
        });
    }

    let unchanged = kept.len() == node.children.len()
        && kept
            .iter()
            .zip(&node.children)
            .all(|(a, b)| Arc::ptr_eq(a, b));
    if unchanged {
        return Some(Arc::clone(node));
    }

    Some(Arc::new(FileNode {
        name: node.name.clone(),
        path: node.path.clone(),
        kind: node.kind,
        extension: node.extension.clone(),
        children: kept,
    }))
}
