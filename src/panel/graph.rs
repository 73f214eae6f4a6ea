//! Dependency graph with group filtering and click-to-highlight.
//!
//! Highlighting is a single-hop scan over the edge list: the selected node,
//! every node it points at, every node pointing at it, and the edges touching
//! it. Selecting another node replaces the highlight.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::errors::{DashError, Result};

/// A file in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    /// Module family (`components`, `hooks`, ...).
    pub group: String,
    /// Relative weight, used for the size column.
    pub size: u32,
    /// Entry points stay visible under every group filter.
    #[serde(default)]
    pub entry: bool,
}

/// Directed "imports" edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
}

impl GraphEdge {
    #[must_use]
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    /// Whether either endpoint is `node`.
    #[must_use]
    pub fn touches(&self, node: &str) -> bool {
        self.source == node || self.target == node
    }
}

/// Node and edge lists. Edges only reference nodes in the same graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl CodeGraph {
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Distinct groups in first-seen order, entry groups excluded.
    #[must_use]
    pub fn groups(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for node in self.nodes.iter().filter(|n| !n.entry) {
            if !seen.contains(&node.group.as_str()) {
                seen.push(node.group.as_str());
            }
        }
        seen
    }

    /// Subgraph of one group plus the entry nodes, keeping only edges whose
    /// endpoints both survive. `None` returns a copy of the whole graph.
    #[must_use]
    pub fn filter_group(&self, group: Option<&str>) -> Self {
        let Some(group) = group else {
            return self.clone();
        };
        let nodes: Vec<GraphNode> = self
            .nodes
            .iter()
            .filter(|n| n.entry || n.group == group)
            .cloned()
            .collect();
        let kept: BTreeSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let edges = self
            .edges
            .iter()
            .filter(|e| kept.contains(e.source.as_str()) && kept.contains(e.target.as_str()))
            .cloned()
            .collect();
        Self { nodes, edges }
    }

    /// Number of edges leaving `id`.
    #[must_use]
    pub fn out_degree(&self, id: &str) -> usize {
        self.edges.iter().filter(|e| e.source == id).count()
    }

    /// Number of edges arriving at `id`.
    #[must_use]
    pub fn in_degree(&self, id: &str) -> usize {
        self.edges.iter().filter(|e| e.target == id).count()
    }
}

/// How a node or edge is drawn given the current highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Treatment {
    /// Part of the highlighted neighborhood.
    Highlighted,
    /// Outside an active highlight.
    Dimmed,
    /// No highlight active.
    Normal,
}

/// Current click-to-highlight selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    selected: Option<String>,
    nodes: BTreeSet<String>,
    edges: BTreeSet<GraphEdge>,
}

impl Highlight {
    /// Highlight `node_id` and its one-hop neighborhood, replacing whatever
    /// was highlighted before.
    pub fn select(&mut self, graph: &CodeGraph, node_id: &str) -> Result<()> {
        if graph.node(node_id).is_none() {
            return Err(DashError::UnknownRecord {
                panel: "code-graph",
                id: node_id.to_string(),
            });
        }
        let mut nodes = BTreeSet::from([node_id.to_string()]);
        let mut edges = BTreeSet::new();
        for edge in graph.edges.iter().filter(|e| e.touches(node_id)) {
            nodes.insert(edge.source.clone());
            nodes.insert(edge.target.clone());
            edges.insert(edge.clone());
        }
        self.selected = Some(node_id.to_string());
        self.nodes = nodes;
        self.edges = edges;
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.selected.is_some()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Highlighted node ids in sorted order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter()
    }

    #[must_use]
    pub fn node_treatment(&self, id: &str) -> Treatment {
        if !self.is_active() {
            Treatment::Normal
        } else if self.nodes.contains(id) {
            Treatment::Highlighted
        } else {
            Treatment::Dimmed
        }
    }

    #[must_use]
    pub fn edge_treatment(&self, edge: &GraphEdge) -> Treatment {
        if !self.is_active() {
            Treatment::Normal
        } else if self.edges.contains(edge) {
            Treatment::Highlighted
        } else {
            Treatment::Dimmed
        }
    }
}
