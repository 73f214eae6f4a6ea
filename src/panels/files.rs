//! File explorer: the project tree with search, expansion and selection.

#![allow(missing_docs)]

use std::sync::Arc;

use super::{Cell, Column, Panel, PanelKind, PanelQuery, PanelView, RenderContext, Row, Tile};
use crate::core::errors::{DashError, Result};
use crate::panel::badge::Tone;
use crate::panel::expand::ExpandSet;
use crate::panel::tree::{FileNode, filter_tree};

/// Directory expanded when no other is given.
pub const DEFAULT_DIRECTORY: &str = "/src";

/// Icon for a node. Directories show open or closed.
#[must_use]
pub fn file_icon(node: &FileNode, expanded: bool) -> &'static str {
    if node.is_dir() {
        return if expanded { "▾" } else { "▸" };
    }
    match node.extension.as_deref() {
        Some("js" | "jsx" | "ts" | "tsx") => "ƒ",
        Some("json") => "{",
        Some("md") => "¶",
        _ => "·",
    }
}

fn icon_tone(node: &FileNode) -> Tone {
    if node.is_dir() {
        return Tone::Warning;
    }
    match node.extension.as_deref() {
        Some("js" | "jsx" | "ts" | "tsx") => Tone::Accent,
        Some("json") => Tone::Success,
        Some("md") => Tone::Muted,
        _ => Tone::Neutral,
    }
}

/// `/src/pages/api` → `/src`, `/src/pages`, `/src/pages/api`.
#[must_use]
pub fn ancestors(path: &str) -> Vec<String> {
    let mut current = String::new();
    path.split('/')
        .filter(|p| !p.is_empty())
        .map(|part| {
            current.push('/');
            current.push_str(part);
            current.clone()
        })
        .collect()
}

fn count(nodes: &[Arc<FileNode>], dirs: bool) -> usize {
    nodes
        .iter()
        .map(|n| usize::from(n.is_dir() == dirs) + count(&n.children, dirs))
        .sum()
}

#[derive(Debug, Clone)]
pub struct FileExplorer {
    pub roots: Vec<Arc<FileNode>>,
}

impl FileExplorer {
    #[must_use]
    pub fn seeded() -> Self {
        Self {
            roots: seed_tree(),
        }
    }

    #[must_use]
    pub fn find(&self, path: &str) -> Option<&FileNode> {
        self.roots.iter().find_map(|r| r.find(path))
    }

    /// Forest matching `search`; the stored tree is left as it was.
    #[must_use]
    pub fn filtered(&self, search: &str) -> Vec<Arc<FileNode>> {
        filter_tree(&self.roots, search)
    }

    fn expanded_for(&self, query: &PanelQuery, forest: &[Arc<FileNode>]) -> ExpandSet {
        let mut expanded = ExpandSet::new();
        let directory = query
            .props
            .directory_path
            .as_deref()
            .unwrap_or(DEFAULT_DIRECTORY);
        for path in ancestors(directory) {
            expanded.expand(&path);
        }
        if let Some(file) = &query.props.file_path {
            // The selected file's parents open too.
            let parents = ancestors(file);
            for path in parents.iter().take(parents.len().saturating_sub(1)) {
                expanded.expand(path);
            }
        }
        if query.expand_all || !query.search.is_empty() {
            let mut dirs = Vec::new();
            all_dirs(forest, &mut dirs);
            expanded.expand_all(dirs);
        }
        for id in &query.expand {
            expanded.expand(id);
        }
        for id in &query.collapse {
            expanded.collapse(id);
        }
        expanded
    }
}

fn all_dirs<'a>(nodes: &'a [Arc<FileNode>], out: &mut Vec<&'a str>) {
    for n in nodes.iter().filter(|n| n.is_dir()) {
        out.push(&n.path);
        all_dirs(&n.children, out);
    }
}

fn push_rows(
    nodes: &[Arc<FileNode>],
    depth: usize,
    expanded: &ExpandSet,
    selected: &[&str],
    rows: &mut Vec<Row>,
) {
    for node in nodes {
        let open = node.is_dir() && expanded.is_expanded(&node.path);
        let tone = if selected.contains(&node.path.as_str()) {
            Tone::Accent
        } else {
            Tone::Neutral
        };
        let mut row = Row::new(
            &node.path,
            vec![
                Cell::toned(file_icon(node, open), icon_tone(node)),
                Cell::toned(&node.name, tone),
                Cell::toned(node.extension.as_deref().unwrap_or(""), Tone::Muted),
            ],
        )
        .depth(depth);
        if node.is_dir() {
            row = row.expandable(open, Vec::new());
        }
        rows.push(row);
        if open {
            push_rows(&node.children, depth + 1, expanded, selected, rows);
        }
    }
}

impl Panel for FileExplorer {
    fn kind(&self) -> PanelKind {
        PanelKind::Files
    }

    fn render(&self, query: &PanelQuery, _ctx: &RenderContext) -> Result<PanelView> {
        let unknown = |path: &str| DashError::UnknownRecord {
            panel: PanelKind::Files.token(),
            id: path.to_string(),
        };
        let file = query.props.file_path.as_deref().or(query.focus.as_deref());
        if let Some(path) = file {
            self.find(path).ok_or_else(|| unknown(path))?;
        }
        if let Some(path) = &query.props.directory_path {
            self.find(path)
                .filter(|n| n.is_dir())
                .ok_or_else(|| unknown(path))?;
        }

        let forest = self.filtered(&query.search);
        let mut q = query.clone();
        if let Some(path) = file {
            q.props.file_path = Some(path.to_string());
        }
        let expanded = self.expanded_for(&q, &forest);
        let selected: Vec<&str> = file
            .into_iter()
            .chain(query.props.directory_path.as_deref())
            .collect();

        let mut view = PanelView::new(PanelKind::Files);
        view.tiles = vec![
            Tile::new("Files", count(&self.roots, false), Tone::Neutral),
            Tile::new("Directories", count(&self.roots, true), Tone::Warning),
        ];
        if !query.search.is_empty() {
            view.tiles
                .push(Tile::new("Matches", count(&forest, false), Tone::Accent));
        }
        view.columns = ["", "Name", "Type"]
            .iter()
            .map(|label| Column {
                label: (*label).to_string(),
                sort: None,
                sortable: false,
            })
            .collect();
        push_rows(&forest, 0, &expanded, &selected, &mut view.rows);
        view.matched = forest.iter().map(|n| n.size()).sum();
        view.total = self.roots.iter().map(|n| n.size()).sum();
        if forest.is_empty() {
            view.notes.push("No files match the search.".to_string());
        }
        if let Some(path) = file {
            view.notes.push(format!("Selected: {path}"));
        }
        Ok(view)
    }
}

fn seed_tree() -> Vec<Arc<FileNode>> {
    let components = FileNode::directory(
        "/src",
        "components",
        vec![
            FileNode::file("/src/components", "Button.tsx"),
            FileNode::file("/src/components", "Card.tsx"),
            FileNode::file("/src/components", "Input.tsx"),
        ],
    );
    let pages = FileNode::directory(
        "/src",
        "pages",
        vec![
            FileNode::file("/src/pages", "index.tsx"),
            FileNode::file("/src/pages", "about.tsx"),
            FileNode::directory(
                "/src/pages",
                "api",
                vec![FileNode::file("/src/pages/api", "users.ts")],
            ),
        ],
    );
    let utils = FileNode::directory(
        "/src",
        "utils",
        vec![
            FileNode::file("/src/utils", "helpers.ts"),
            FileNode::file("/src/utils", "constants.ts"),
        ],
    );
    let styles = FileNode::directory(
        "/src",
        "styles",
        vec![FileNode::file("/src/styles", "globals.css")],
    );
    vec![
        FileNode::directory("", "src", vec![components, pages, utils, styles]),
        FileNode::directory(
            "",
            "public",
            vec![
                FileNode::directory(
                    "/public",
                    "images",
                    vec![FileNode::file("/public/images", "logo.png")],
                ),
                FileNode::file("/public", "favicon.ico"),
            ],
        ),
        FileNode::file("", "package.json"),
        FileNode::file("", "tsconfig.json"),
        FileNode::file("", "README.md"),
    ]
}
