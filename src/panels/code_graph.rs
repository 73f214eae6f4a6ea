//! Module dependency graph as a table: group filter, search, and the
//! one-hop highlight around a focused node.

#![allow(missing_docs)]

use serde::Serialize;

use super::badges::{BadgeKey, badge};
use super::{Cell, Panel, PanelKind, PanelQuery, PanelSchema, PanelView, RenderContext, Row, Tile};
use crate::core::errors::Result;
use crate::panel::badge::Tone;
use crate::panel::graph::{CodeGraph, GraphEdge, GraphNode, Highlight, Treatment};
use crate::panel::query::{Facet, Record};
use crate::panel::sort::SortValue;
use crate::panel::view::derive_view;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeField {
    Id,
    Group,
    Size,
}

impl Record for GraphNode {
    type Field = NodeField;

    fn record_id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.id.as_str()]
    }

    fn category(&self) -> Option<&str> {
        Some(self.group.as_str())
    }

    fn sort_value(&self, field: NodeField) -> SortValue<'_> {
        match field {
            NodeField::Id => SortValue::Text(&self.id),
            NodeField::Group => SortValue::Text(&self.group),
            NodeField::Size => SortValue::Number(f64::from(self.size)),
        }
    }
}

pub const SCHEMA: PanelSchema<NodeField> = PanelSchema {
    kind: PanelKind::CodeGraph,
    categories: &["components", "hooks", "utils", "api", "contexts", "pages"],
    statuses: &[],
    sort_fields: &[
        ("id", NodeField::Id),
        ("group", NodeField::Group),
        ("size", NodeField::Size),
    ],
    default_sort: None,
    card_rows: None,
};

/// Result of focusing a node, for the `graph` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Neighborhood {
    pub selected: String,
    pub nodes: Vec<String>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone)]
pub struct CodeGraphPanel {
    pub graph: CodeGraph,
}

impl CodeGraphPanel {
    #[must_use]
    pub fn seeded() -> Self {
        Self {
            graph: seed_graph(),
        }
    }

    /// Graph restricted to the selected group, entry points included.
    #[must_use]
    pub fn visible(&self, group: &Facet) -> CodeGraph {
        self.graph.filter_group(group.selected())
    }

    /// Highlight `node` within the group-filtered graph.
    pub fn neighborhood(&self, group: &Facet, node: &str) -> Result<Neighborhood> {
        let visible = self.visible(group);
        let mut highlight = Highlight::default();
        highlight.select(&visible, node)?;
        Ok(Neighborhood {
            selected: node.to_string(),
            nodes: highlight.nodes().map(str::to_string).collect(),
            edges: highlight.edges().cloned().collect(),
        })
    }
}

impl Panel for CodeGraphPanel {
    fn kind(&self) -> PanelKind {
        PanelKind::CodeGraph
    }

    fn facets(&self) -> (&'static [&'static str], &'static [&'static str]) {
        (SCHEMA.categories, SCHEMA.statuses)
    }

    fn sort_fields(&self) -> Vec<&'static str> {
        SCHEMA.sort_fields.iter().map(|(n, _)| *n).collect()
    }

    fn render(&self, query: &PanelQuery, ctx: &RenderContext) -> Result<PanelView> {
        let mut state = SCHEMA.view_state(query, ctx)?;
        let visible = self.visible(&query.category);
        // The group filter already ran and kept the entry points.
        state.filter.category = Facet::All;

        let mut highlight = Highlight::default();
        if let Some(focus) = &query.focus {
            highlight.select(&visible, focus)?;
        }
        let derived = derive_view(&visible.nodes, &state);

        let mut view = PanelView::new(PanelKind::CodeGraph);
        view.tiles = vec![
            Tile::new("Nodes", visible.nodes.len(), Tone::Neutral),
            Tile::new("Edges", visible.edges.len(), Tone::Neutral),
            Tile::new("Groups", self.graph.groups().len(), Tone::Muted),
        ];
        if let Some(selected) = highlight.selected() {
            view.tiles.push(Tile::new("Selected", selected, Tone::Accent));
        }
        view.columns = SCHEMA.columns(
            &[
                ("Module", Some(NodeField::Id)),
                ("Group", Some(NodeField::Group)),
                ("Size", Some(NodeField::Size)),
                ("Imports", None),
                ("Imported by", None),
                ("", None),
            ],
            &state,
        );
        view.rows = derived
            .rows
            .iter()
            .map(|node| {
                let treatment = highlight.node_treatment(&node.id);
                let b = badge(BadgeKey::Graph(treatment));
                let tone = match treatment {
                    Treatment::Normal => Tone::Neutral,
                    _ => b.tone,
                };
                let id_text = if node.entry {
                    format!("{} (entry)", node.id)
                } else {
                    node.id.clone()
                };
                let mut detail: Vec<String> = visible
                    .edges
                    .iter()
                    .filter(|e| e.source == node.id)
                    .map(|e| format!("→ {}", e.target))
                    .collect();
                detail.extend(
                    visible
                        .edges
                        .iter()
                        .filter(|e| e.target == node.id)
                        .map(|e| format!("← {}", e.source)),
                );
                Row::new(
                    &node.id,
                    vec![
                        Cell::toned(id_text, tone),
                        Cell::toned(&node.group, tone),
                        Cell::toned(node.size, tone),
                        Cell::toned(visible.out_degree(&node.id), tone),
                        Cell::toned(visible.in_degree(&node.id), tone),
                        Cell::toned(b.glyph, b.tone),
                    ],
                )
                .expandable(state.expanded.is_expanded(&node.id), detail)
            })
            .collect();
        view.counts_from(&derived);

        if highlight.is_active() {
            let edges: Vec<&GraphEdge> = highlight.edges().collect();
            view.notes.push(format!(
                "Highlighted {} node(s) and {} edge(s) around {}",
                highlight.nodes().count(),
                edges.len(),
                highlight.selected().unwrap_or_default()
            ));
            view.notes
                .extend(edges.iter().map(|e| format!("  {} → {}", e.source, e.target)));
        }
        Ok(view)
    }
}

fn seed_graph() -> CodeGraph {
    let node = |id: &str, group: &str, size: u32| GraphNode {
        id: id.to_string(),
        group: group.to_string(),
        size,
        entry: group == "entry",
    };
    let nodes = vec![
        node("main.ts", "entry", 25),
        node("utils/helpers.ts", "utils", 15),
        node("utils/formatters.ts", "utils", 12),
        node("components/Button.tsx", "components", 18),
        node("components/Card.tsx", "components", 20),
        node("components/Input.tsx", "components", 16),
        node("components/Form.tsx", "components", 22),
        node("hooks/useAuth.ts", "hooks", 14),
        node("hooks/useForm.ts", "hooks", 13),
        node("api/auth.ts", "api", 17),
        node("api/users.ts", "api", 16),
        node("contexts/AuthContext.tsx", "contexts", 19),
        node("contexts/ThemeContext.tsx", "contexts", 15),
        node("pages/Login.tsx", "pages", 21),
        node("pages/Dashboard.tsx", "pages", 24),
        node("pages/Profile.tsx", "pages", 18),
    ];
    let edges = [
        ("main.ts", "pages/Login.tsx"),
        ("main.ts", "pages/Dashboard.tsx"),
        ("main.ts", "pages/Profile.tsx"),
        ("main.ts", "contexts/AuthContext.tsx"),
        ("main.ts", "contexts/ThemeContext.tsx"),
        ("pages/Login.tsx", "components/Form.tsx"),
        ("pages/Login.tsx", "components/Button.tsx"),
        ("pages/Login.tsx", "components/Input.tsx"),
        ("pages/Login.tsx", "hooks/useAuth.ts"),
        ("pages/Login.tsx", "hooks/useForm.ts"),
        ("pages/Dashboard.tsx", "components/Card.tsx"),
        ("pages/Dashboard.tsx", "components/Button.tsx"),
        ("pages/Dashboard.tsx", "utils/helpers.ts"),
        ("pages/Dashboard.tsx", "utils/formatters.ts"),
        ("pages/Profile.tsx", "components/Form.tsx"),
        ("pages/Profile.tsx", "components/Input.tsx"),
        ("pages/Profile.tsx", "hooks/useForm.ts"),
        ("components/Form.tsx", "components/Input.tsx"),
        ("components/Form.tsx", "components/Button.tsx"),
        ("hooks/useAuth.ts", "api/auth.ts"),
        ("hooks/useForm.ts", "utils/helpers.ts"),
        ("api/auth.ts", "utils/helpers.ts"),
        ("api/users.ts", "utils/helpers.ts"),
        ("api/users.ts", "utils/formatters.ts"),
        ("contexts/AuthContext.tsx", "hooks/useAuth.ts"),
        ("contexts/AuthContext.tsx", "api/auth.ts"),
    ]
    .iter()
    .map(|(s, t)| GraphEdge::new(s, t))
    .collect();
    CodeGraph { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ctx() -> RenderContext {
        RenderContext::at(NaiveDate::from_ymd_opt(2025, 4, 10).unwrap())
    }

    #[test]
    fn seed_edges_reference_known_nodes() {
        let g = CodeGraphPanel::seeded().graph;
        assert_eq!(g.nodes.len(), 16);
        assert_eq!(g.edges.len(), 26);
        for e in &g.edges {
            assert!(g.node(&e.source).is_some() && g.node(&e.target).is_some(), "{e:?}");
        }
    }

    #[test]
    fn login_neighborhood() {
        let n = CodeGraphPanel::seeded()
            .neighborhood(&Facet::All, "pages/Login.tsx")
            .unwrap();
        assert_eq!(n.nodes.len(), 7);
        assert_eq!(n.edges.len(), 6);
        assert!(n.nodes.contains(&"main.ts".to_string()));
    }

    #[test]
    fn group_filter_keeps_entry_and_internal_edges() {
        let view = CodeGraphPanel::seeded()
            .render(&PanelQuery::default().category("components"), &ctx())
            .unwrap();
        assert_eq!(view.rows.len(), 5);
        assert!(view.row_ids().contains(&"main.ts"));
        assert_eq!(view.tile("Edges"), Some("2"));
    }

    #[test]
    fn focus_dims_everything_outside_the_neighborhood() {
        let view = CodeGraphPanel::seeded()
            .render(&PanelQuery::default().focus("api/users.ts"), &ctx())
            .unwrap();
        let glyph = |id: &str| {
            view.rows.iter().find(|r| r.id == id).unwrap().cells[5].text.clone()
        };
        assert_eq!(glyph("api/users.ts"), "◆");
        assert_eq!(glyph("utils/formatters.ts"), "◆");
        assert_eq!(glyph("main.ts"), "·");
        assert!(view.notes[0].starts_with("Highlighted 3 node(s) and 2 edge(s)"));
    }

    #[test]
    fn focus_outside_the_filtered_graph_is_unknown() {
        let err = CodeGraphPanel::seeded()
            .render(&PanelQuery::default().category("hooks").focus("api/auth.ts"), &ctx())
            .unwrap_err();
        assert_eq!(err.code(), "C2S-2004");
    }

    #[test]
    fn sort_by_size_descending() {
        let view = CodeGraphPanel::seeded()
            .render(&PanelQuery::default().sort("size").sort("size"), &ctx())
            .unwrap();
        assert_eq!(view.row_ids()[0], "main.ts");
    }
}
