//! Concrete dashboard panels over seeded sample data.
//!
//! Every panel turns a [`PanelQuery`] into a [`PanelView`]: summary tiles
//! computed over the whole source, then the filtered, sorted and paged rows.
//! Views are plain data so the CLI can print them as text or JSON and the
//! interactive dashboard can draw them.

#![allow(missing_docs)]

pub mod accuracy;
pub mod activity;
pub mod badges;
pub mod capabilities;
pub mod code_graph;
pub mod configuration;
pub mod files;
pub mod functions;
pub mod historical;
pub mod report;
pub mod rules;
pub mod security;
pub mod temporal;
pub mod traceability;

#[cfg(test)]
mod test_properties;

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::errors::{DashError, Result};
use crate::panel::action::ActionKind;
use crate::panel::badge::{Badge, Tone};
use crate::panel::expand::ExpandSet;
use crate::panel::query::{Facet, FilterState};
use crate::panel::sort::{SortDirection, SortState, click_optional};
use crate::panel::view::{DerivedView, Page, ViewState};
use crate::panel::window::{TimeWindow, WindowAnchor};

// ──────────────────── panel identity ────────────────────

/// Every panel the dashboard can show, in menu order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PanelKind {
    Traceability,
    Capabilities,
    Security,
    Configuration,
    Accuracy,
    Activity,
    Rules,
    CodeGraph,
    Files,
    Reports,
    TemporalMetrics,
    HistoricalComparison,
}

impl PanelKind {
    pub const ALL: [Self; 12] = [
        Self::Traceability,
        Self::Capabilities,
        Self::Security,
        Self::Configuration,
        Self::Accuracy,
        Self::Activity,
        Self::Rules,
        Self::CodeGraph,
        Self::Files,
        Self::Reports,
        Self::TemporalMetrics,
        Self::HistoricalComparison,
    ];

    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Traceability => "traceability",
            Self::Capabilities => "capabilities",
            Self::Security => "security",
            Self::Configuration => "configuration",
            Self::Accuracy => "accuracy",
            Self::Activity => "activity",
            Self::Rules => "rules",
            Self::CodeGraph => "code-graph",
            Self::Files => "files",
            Self::Reports => "reports",
            Self::TemporalMetrics => "temporal-metrics",
            Self::HistoricalComparison => "historical-comparison",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Traceability => "Traceability Matrix",
            Self::Capabilities => "Business Capability Map",
            Self::Security => "Security Assessment Report",
            Self::Configuration => "Configuration and Environment Variables",
            Self::Accuracy => "Accuracy Trend",
            Self::Activity => "Activity Heatmap",
            Self::Rules => "Architectural Expectations",
            Self::CodeGraph => "Code Dependency Graph",
            Self::Files => "File Explorer",
            Self::Reports => "Report Export",
            Self::TemporalMetrics => "Temporal Metrics",
            Self::HistoricalComparison => "Historical Comparison",
        }
    }

    /// 1-based position, used for number-key navigation.
    #[must_use]
    pub fn number(self) -> usize {
        Self::ALL.iter().position(|k| *k == self).map_or(1, |i| i + 1)
    }

    #[must_use]
    pub fn from_number(n: usize) -> Option<Self> {
        n.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self::ALL[self.number() % Self::ALL.len()]
    }

    #[must_use]
    pub fn prev(self) -> Self {
        let i = self.number() - 1;
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Collaborator actions the panel offers.
    #[must_use]
    pub const fn actions(self) -> &'static [ActionKind] {
        match self {
            Self::Traceability => &[ActionKind::Refresh, ActionKind::Export, ActionKind::RunTests],
            Self::Security
            | Self::CodeGraph
            | Self::TemporalMetrics
            | Self::HistoricalComparison => &[ActionKind::Refresh, ActionKind::Export],
            Self::Configuration => &[ActionKind::Refresh, ActionKind::SyncIntegration],
            Self::Reports => &[ActionKind::GenerateReport, ActionKind::ScheduleReport],
            Self::Capabilities
            | Self::Accuracy
            | Self::Activity
            | Self::Rules
            | Self::Files => &[ActionKind::Refresh],
        }
    }

    /// Reject actions the panel does not offer.
    pub fn check_action(self, kind: ActionKind) -> Result<()> {
        if self.actions().contains(&kind) {
            Ok(())
        } else {
            Err(DashError::InvalidFacet {
                panel: self.token(),
                axis: "action",
                value: kind.token().to_string(),
            })
        }
    }
}

impl fmt::Display for PanelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for PanelKind {
    type Err = DashError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        let alias = match wanted.as_str() {
            "trace" | "matrix" => "traceability",
            "caps" | "capability" => "capabilities",
            "config" => "configuration",
            "graph" => "code-graph",
            "tree" | "explorer" => "files",
            "report" => "reports",
            "temporal" | "metrics" => "temporal-metrics",
            "historical" | "history" | "comparison" => "historical-comparison",
            other => other,
        };
        Self::ALL
            .into_iter()
            .find(|k| k.token() == alias)
            .ok_or_else(|| DashError::UnknownPanel {
                name: s.to_string(),
            })
    }
}

// ──────────────────── inputs ────────────────────

/// Parent-supplied options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelProps {
    /// Full-page layout: every row, extra columns.
    pub full_page: bool,
    /// File the explorer marks as selected.
    pub file_path: Option<String>,
    /// Directory whose ancestors the explorer expands.
    pub directory_path: Option<String>,
}

/// User-facing view state for one panel, as typed on the command line or
/// accumulated by the interactive dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelQuery {
    pub search: String,
    pub category: Facet,
    pub status: Facet,
    /// Column-header clicks, replayed in order on top of the default sort.
    pub sort_clicks: Vec<String>,
    pub window: Option<TimeWindow>,
    pub tab: Option<String>,
    pub expand: Vec<String>,
    pub expand_all: bool,
    pub collapse: Vec<String>,
    pub reveal_secrets: bool,
    /// Selected node for the graph, selected file for the explorer.
    pub focus: Option<String>,
    pub props: PanelProps,
}

impl PanelQuery {
    #[must_use]
    pub fn search(mut self, text: &str) -> Self {
        self.search = text.to_string();
        self
    }

    #[must_use]
    pub fn category(mut self, value: &str) -> Self {
        self.category = Facet::parse(value);
        self
    }

    #[must_use]
    pub fn status(mut self, value: &str) -> Self {
        self.status = Facet::parse(value);
        self
    }

    #[must_use]
    pub fn sort(mut self, field: &str) -> Self {
        self.sort_clicks.push(field.to_string());
        self
    }

    /// Dashboard header click: folded into at most three clicks with the
    /// same outcome, so a long session never grows the list.
    pub fn click_sort(&mut self, field: &str) {
        self.sort_clicks.push(field.to_string());
        let key = |name: &str| name.trim().to_ascii_lowercase().replace('-', "_");
        let Some(last) = self.sort_clicks.last().map(|name| key(name)) else {
            return;
        };
        let run = self
            .sort_clicks
            .iter()
            .rev()
            .take_while(|name| key(name) == last)
            .count();
        let start = self.sort_clicks.len() - run;
        // Only the parity of the trailing run matters, and of what precedes
        // it only the field of the last click.
        let keep_run = if run % 2 == 1 { 1 } else { 2 };
        let mut compacted: Vec<String> = self.sort_clicks[..start].last().cloned().into_iter().collect();
        compacted.extend(self.sort_clicks[start..].iter().take(keep_run).cloned());
        self.sort_clicks = compacted;
    }

    /// Expand-all first, then per-id expands, then collapses: one collapse
    /// closes exactly one id even while everything else is open.
    pub fn apply_expansion<'a>(&self, set: &mut ExpandSet, ids: impl IntoIterator<Item = &'a str>) {
        if self.expand_all {
            set.expand_all(ids);
        }
        for id in &self.expand {
            set.expand(id);
        }
        for id in &self.collapse {
            set.collapse(id);
        }
    }

    #[must_use]
    pub fn expand(mut self, id: &str) -> Self {
        self.expand.push(id.to_string());
        self
    }

    #[must_use]
    pub const fn full_page(mut self) -> Self {
        self.props.full_page = true;
        self
    }

    #[must_use]
    pub const fn window(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }

    #[must_use]
    pub fn tab(mut self, tab: &str) -> Self {
        self.tab = Some(tab.to_string());
        self
    }

    #[must_use]
    pub fn focus(mut self, id: &str) -> Self {
        self.focus = Some(id.to_string());
        self
    }

    /// Action payload: the query itself as plain data.
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Environment a render runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    /// Wall-clock date used for windowing.
    pub today: NaiveDate,
    pub anchor: WindowAnchor,
    pub default_window: TimeWindow,
    /// Overrides each panel's own card-view row count.
    pub card_rows: Option<usize>,
    /// `chrono` format string for dates in rows.
    pub date_format: String,
}

impl RenderContext {
    #[must_use]
    pub fn at(today: NaiveDate) -> Self {
        Self {
            today,
            anchor: WindowAnchor::default(),
            default_window: TimeWindow::default(),
            card_rows: None,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }

    /// Context anchored on the local date.
    #[must_use]
    pub fn now() -> Self {
        Self::at(chrono::Local::now().date_naive())
    }

    #[must_use]
    pub fn format_date(&self, date: NaiveDate) -> String {
        date.format(&self.date_format).to_string()
    }
}

/// Reject column clicks on panels with a fixed row order.
pub fn reject_sort(kind: PanelKind, query: &PanelQuery) -> Result<()> {
    match query.sort_clicks.first() {
        Some(name) => Err(DashError::InvalidFacet {
            panel: kind.token(),
            axis: "sort",
            value: name.clone(),
        }),
        None => Ok(()),
    }
}

/// `Apr 5, 2025`.
pub const DEFAULT_DATE_FORMAT: &str = "%b %-d, %Y";

// ──────────────────── schema → view state ────────────────────

/// Static description of one list panel's filter and sort surface.
#[derive(Debug)]
pub struct PanelSchema<F: 'static> {
    pub kind: PanelKind,
    pub categories: &'static [&'static str],
    pub statuses: &'static [&'static str],
    pub sort_fields: &'static [(&'static str, F)],
    pub default_sort: Option<SortState<F>>,
    /// Card-view row count; `None` shows every row.
    pub card_rows: Option<usize>,
}

impl<F: Copy + PartialEq> PanelSchema<F> {
    /// Resolve a column name.
    pub fn field(&self, name: &str) -> Result<F> {
        let wanted = name.trim().to_ascii_lowercase().replace('-', "_");
        self.sort_fields
            .iter()
            .find(|(token, _)| *token == wanted)
            .map(|(_, f)| *f)
            .ok_or_else(|| DashError::InvalidFacet {
                panel: self.kind.token(),
                axis: "sort",
                value: name.to_string(),
            })
    }

    #[must_use]
    pub fn field_name(&self, field: F) -> &'static str {
        self.sort_fields
            .iter()
            .find(|(_, f)| *f == field)
            .map_or("", |(token, _)| token)
    }

    fn check_facet(&self, axis: &'static str, facet: &Facet, options: &[&str]) -> Result<()> {
        match facet.selected() {
            Some(value) if !options.contains(&value) => Err(DashError::InvalidFacet {
                panel: self.kind.token(),
                axis,
                value: value.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Build the typed view state for a query, validating facet values and
    /// sort columns against this schema.
    pub fn view_state(&self, query: &PanelQuery, ctx: &RenderContext) -> Result<ViewState<F>> {
        self.check_facet("category", &query.category, self.categories)?;
        self.check_facet("status", &query.status, self.statuses)?;

        let mut sort = self.default_sort;
        for name in &query.sort_clicks {
            click_optional(&mut sort, self.field(name)?);
        }

        let page = match (query.props.full_page, ctx.card_rows.or(self.card_rows)) {
            (false, Some(rows)) => Page::first(rows),
            _ => Page::ALL,
        };

        let mut state = ViewState {
            filter: FilterState {
                search: query.search.clone(),
                category: query.category.clone(),
                status: query.status.clone(),
                reveal_secrets: query.reveal_secrets,
            },
            sort,
            page,
            ..ViewState::default()
        };
        query.apply_expansion(&mut state.expanded, std::iter::empty::<&str>());
        state.tab.clone_from(&query.tab);
        Ok(state)
    }

    /// Column headers, with the arrow on the active sort column.
    #[must_use]
    pub fn columns(&self, labels: &[(&str, Option<F>)], state: &ViewState<F>) -> Vec<Column> {
        labels
            .iter()
            .map(|(label, field)| Column {
                label: (*label).to_string(),
                sort: match (field, state.sort) {
                    (Some(f), Some(s)) if s.field == *f => Some(s.direction),
                    _ => None,
                },
                sortable: field.is_some(),
            })
            .collect()
    }
}

// ──────────────────── presentation ────────────────────

/// Summary tile: always computed over the full source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tile {
    pub label: String,
    pub value: String,
    pub tone: Tone,
}

impl Tile {
    pub fn new(label: &str, value: impl ToString, tone: Tone) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
            tone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub label: String,
    /// Direction when this column is the active sort.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortDirection>,
    pub sortable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub text: String,
    pub tone: Tone,
}

impl Cell {
    pub fn plain(text: impl ToString) -> Self {
        Self {
            text: text.to_string(),
            tone: Tone::Neutral,
        }
    }

    pub fn toned(text: impl ToString, tone: Tone) -> Self {
        Self {
            text: text.to_string(),
            tone,
        }
    }

    /// Badge cell, glyph included.
    #[must_use]
    pub fn badge(badge: Badge) -> Self {
        Self {
            text: badge.text(true),
            tone: badge.tone,
        }
    }
}

/// One rendered row. `depth` indents nested rows (subcapabilities, tree nodes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub id: String,
    pub cells: Vec<Cell>,
    #[serde(skip_serializing_if = "is_zero")]
    pub depth: usize,
    /// Whether the row can be expanded at all.
    pub expandable: bool,
    pub expanded: bool,
    /// Detail lines shown while expanded.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub detail: Vec<String>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl Row {
    pub fn new(id: &str, cells: Vec<Cell>) -> Self {
        Self {
            id: id.to_string(),
            cells,
            depth: 0,
            expandable: false,
            expanded: false,
            detail: Vec::new(),
        }
    }

    #[must_use]
    pub const fn depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Mark expandable; the detail is only kept when expanded.
    #[must_use]
    pub fn expandable(mut self, expanded: bool, detail: Vec<String>) -> Self {
        self.expandable = true;
        self.expanded = expanded;
        if expanded {
            self.detail = detail;
        }
        self
    }
}

const EMPTY_NOTE: &str = "No rows match the current filters.";

/// Fully derived panel, ready to print or draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelView {
    pub panel: PanelKind,
    pub title: String,
    pub tiles: Vec<Tile>,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    /// Free-form lines under the table (empty states, legends).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    /// Rows that passed the filter before paging.
    pub matched: usize,
    pub total: usize,
}

impl PanelView {
    pub fn new(panel: PanelKind) -> Self {
        Self {
            panel,
            title: panel.title().to_string(),
            tiles: Vec::new(),
            columns: Vec::new(),
            rows: Vec::new(),
            notes: Vec::new(),
            matched: 0,
            total: 0,
        }
    }

    /// Take counts from a derived view and add the paging hint.
    pub fn counts_from<R>(&mut self, derived: &DerivedView<'_, R>) {
        self.matched = derived.matched;
        self.total = derived.total;
        let hidden = derived.hidden_by_page();
        if hidden > 0 {
            self.notes
                .push(format!("{hidden} more row(s); use --full-page to see all"));
        }
        if derived.matched == 0 {
            self.notes.push(EMPTY_NOTE.to_string());
        }
    }

    /// Swap the generic empty-state note for a panel-specific one.
    pub fn empty_state(&mut self, text: &str) {
        for note in &mut self.notes {
            if note == EMPTY_NOTE {
                *note = text.to_string();
            }
        }
    }

    /// Tile by label, for tests and summaries.
    #[must_use]
    pub fn tile(&self, label: &str) -> Option<&str> {
        self.tiles
            .iter()
            .find(|t| t.label == label)
            .map(|t| t.value.as_str())
    }

    #[must_use]
    pub fn row_ids(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.id.as_str()).collect()
    }
}

/// A renderable panel.
pub trait Panel {
    fn kind(&self) -> PanelKind;

    /// Category and status options, for facet cycling.
    fn facets(&self) -> (&'static [&'static str], &'static [&'static str]) {
        (&[], &[])
    }

    /// Sortable column names.
    fn sort_fields(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Tab tokens, first one selected by default.
    fn tabs(&self) -> &'static [&'static str] {
        &[]
    }

    /// Effective time window, for panels that window their data.
    fn window(&self, _query: &PanelQuery, _ctx: &RenderContext) -> Option<TimeWindow> {
        None
    }

    fn render(&self, query: &PanelQuery, ctx: &RenderContext) -> Result<PanelView>;
}

// ──────────────────── workspace ────────────────────

/// Every panel with its seed data.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub traceability: traceability::TraceabilityPanel,
    pub capabilities: capabilities::CapabilityPanel,
    pub security: security::SecurityPanel,
    pub configuration: configuration::ConfigurationPanel,
    pub accuracy: accuracy::AccuracyPanel,
    pub activity: activity::ActivityPanel,
    pub rules: rules::RuleBook,
    pub code_graph: code_graph::CodeGraphPanel,
    pub files: files::FileExplorer,
    pub reports: report::ReportPanel,
    pub temporal: temporal::TemporalPanel,
    pub historical: historical::HistoricalPanel,
}

impl Workspace {
    /// The sample dataset. Activity history is generated to end on `today`.
    #[must_use]
    pub fn seeded(today: NaiveDate) -> Self {
        Self {
            traceability: traceability::TraceabilityPanel::seeded(),
            capabilities: capabilities::CapabilityPanel::seeded(),
            security: security::SecurityPanel::seeded(),
            configuration: configuration::ConfigurationPanel::seeded(),
            accuracy: accuracy::AccuracyPanel::seeded(),
            activity: activity::ActivityPanel::seeded(today),
            rules: rules::RuleBook::seeded(),
            code_graph: code_graph::CodeGraphPanel::seeded(),
            files: files::FileExplorer::seeded(),
            reports: report::ReportPanel,
            temporal: temporal::TemporalPanel::seeded(),
            historical: historical::HistoricalPanel::seeded(),
        }
    }

    #[must_use]
    pub fn panel(&self, kind: PanelKind) -> &dyn Panel {
        match kind {
            PanelKind::Traceability => &self.traceability,
            PanelKind::Capabilities => &self.capabilities,
            PanelKind::Security => &self.security,
            PanelKind::Configuration => &self.configuration,
            PanelKind::Accuracy => &self.accuracy,
            PanelKind::Activity => &self.activity,
            PanelKind::Rules => &self.rules,
            PanelKind::CodeGraph => &self.code_graph,
            PanelKind::Files => &self.files,
            PanelKind::Reports => &self.reports,
            PanelKind::TemporalMetrics => &self.temporal,
            PanelKind::HistoricalComparison => &self.historical,
        }
    }

    pub fn render(&self, kind: PanelKind, query: &PanelQuery, ctx: &RenderContext) -> Result<PanelView> {
        self.panel(kind).render(query, ctx)
    }
}
