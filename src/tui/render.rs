//! Pure rendering: panel views and dashboard frames become toned text lines.
//!
//! Nothing here touches the terminal. The runtime paints [`Line`]s with
//! crossterm; one-shot CLI output prints the same lines through `colored`.

#![allow(missing_docs)]

use crate::panel::action::{ActionKind, ActionOutcome, ActionState};
use crate::panel::badge::Tone;
use crate::panels::{PanelView, Row};

use super::input::{HELP, InputMode};
use super::model::{DashboardModel, NotificationLevel};

// ──────────────────── spans and lines ────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub tone: Tone,
    pub bold: bool,
}

impl Span {
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
            bold: false,
        }
    }

    #[must_use]
    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// One screen line made of toned spans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    pub spans: Vec<Span>,
}

impl Line {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::toned(text, Tone::Neutral)
    }

    pub fn toned(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            spans: vec![Span::new(text, tone)],
        }
    }

    pub fn push(&mut self, span: Span) {
        self.spans.push(span);
    }

    /// Text without styling.
    #[must_use]
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.spans.iter().map(|s| s.text.chars().count()).sum()
    }

    /// Cut the line to `width` columns, marking the cut with `…`.
    #[must_use]
    pub fn truncate(mut self, width: usize) -> Self {
        if self.width() <= width {
            return self;
        }
        let mut left = width.saturating_sub(1);
        let mut kept = Vec::new();
        for mut span in self.spans.drain(..) {
            if left == 0 {
                break;
            }
            let n = span.text.chars().count();
            if n > left {
                span.text = span.text.chars().take(left).collect();
                left = 0;
            } else {
                left -= n;
            }
            kept.push(span);
        }
        kept.push(Span::new("…", Tone::Muted));
        self.spans = kept;
        self
    }
}

fn pad(text: &str, width: usize) -> String {
    let n = text.chars().count();
    if n >= width {
        text.to_string()
    } else {
        format!("{text}{}", " ".repeat(width - n))
    }
}

// ──────────────────── panel view ────────────────────

/// Lines for one panel view plus, for each row, the index of its line.
struct ViewLines {
    lines: Vec<Line>,
    row_lines: Vec<usize>,
}

fn row_prefix(row: &Row, selected: bool) -> String {
    let marker = match (row.expandable, row.expanded) {
        (true, true) => "▾ ",
        (true, false) => "▸ ",
        (false, _) => "  ",
    };
    let cursor = if selected { "> " } else { "  " };
    format!("{cursor}{}{marker}", "  ".repeat(row.depth))
}

fn column_widths(view: &PanelView) -> Vec<usize> {
    let prefix = view
        .rows
        .iter()
        .map(|r| row_prefix(r, false).chars().count())
        .max()
        .unwrap_or(4);
    view.columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let header = column.label.chars().count() + usize::from(column.sort.is_some()) * 2;
            let cells = view
                .rows
                .iter()
                .filter_map(|r| r.cells.get(i))
                .map(|c| c.text.chars().count())
                .max()
                .unwrap_or(0);
            let extra = if i == 0 { prefix } else { 0 };
            header.max(cells + extra)
        })
        .collect()
}

fn layout_view(view: &PanelView, cursor: Option<usize>) -> ViewLines {
    let mut lines = Vec::new();

    let mut title = Line::default();
    title.push(Span::new(view.title.clone(), Tone::Accent).bold());
    title.push(Span::new(format!("  ({} of {})", view.matched, view.total), Tone::Muted));
    lines.push(title);

    if !view.tiles.is_empty() {
        let mut tiles = Line::default();
        for (i, tile) in view.tiles.iter().enumerate() {
            if i > 0 {
                tiles.push(Span::new("  │  ", Tone::Muted));
            }
            tiles.push(Span::new(format!("{}: ", tile.label), Tone::Muted));
            tiles.push(Span::new(tile.value.clone(), tile.tone).bold());
        }
        lines.push(tiles);
    }
    lines.push(Line::default());

    let widths = column_widths(view);
    if !view.columns.is_empty() {
        let mut header = Line::default();
        for (i, column) in view.columns.iter().enumerate() {
            let label = match column.sort {
                Some(direction) => format!("{} {}", column.label, direction.arrow()),
                None => column.label.clone(),
            };
            let text = if i == 0 { format!("    {label}") } else { label };
            header.push(Span::new(pad(&text, widths[i] + 2), Tone::Muted).bold());
        }
        lines.push(header);
    }

    let mut row_lines = Vec::with_capacity(view.rows.len());
    for (index, row) in view.rows.iter().enumerate() {
        let selected = cursor == Some(index);
        row_lines.push(lines.len());
        let mut line = Line::default();
        for (i, cell) in row.cells.iter().enumerate() {
            let text = if i == 0 {
                format!("{}{}", row_prefix(row, selected), cell.text)
            } else {
                cell.text.clone()
            };
            let width = widths.get(i).copied().unwrap_or(0) + 2;
            let mut span = Span::new(pad(&text, width), cell.tone);
            if selected {
                span = span.bold();
            }
            line.push(span);
        }
        lines.push(line);
        for detail in &row.detail {
            lines.push(Line::toned(
                format!("{}      {detail}", "  ".repeat(row.depth)),
                Tone::Muted,
            ));
        }
    }

    if !view.notes.is_empty() {
        lines.push(Line::default());
        lines.extend(view.notes.iter().map(|n| Line::toned(n.clone(), Tone::Muted)));
    }
    ViewLines { lines, row_lines }
}

/// Text lines for a panel view, cut to `width`. `cursor` marks the
/// selected row.
#[must_use]
pub fn view_lines(view: &PanelView, width: usize, cursor: Option<usize>) -> Vec<Line> {
    layout_view(view, cursor)
        .lines
        .into_iter()
        .map(|l| l.truncate(width))
        .collect()
}

// ──────────────────── dashboard frame ────────────────────

fn tab_bar(model: &DashboardModel) -> Line {
    let mut line = Line::default();
    for kind in crate::panels::PanelKind::ALL {
        // Digits reach the first ten panels; the rest are Tab-only.
        let label = match kind.number() {
            n @ 1..=9 => format!(" {n}:{} ", kind.token()),
            10 => format!(" 0:{} ", kind.token()),
            _ => format!(" {} ", kind.token()),
        };
        if kind == model.panel {
            line.push(Span::new(label, Tone::Accent).bold());
        } else {
            line.push(Span::new(label, Tone::Muted));
        }
    }
    line
}

fn action_span(kind: ActionKind, state: Option<&ActionState<ActionOutcome>>) -> Span {
    match state {
        Some(ActionState::Pending { .. }) => Span::new(kind.busy_label(), Tone::Warning),
        Some(ActionState::Success { .. }) => Span::new(format!("{} ✓", kind.label()), Tone::Success),
        Some(ActionState::Failure { .. }) => Span::new(format!("{} ✗", kind.label()), Tone::Danger),
        Some(ActionState::Idle) | None => Span::new(kind.label(), Tone::Neutral),
    }
}

fn status_line(model: &DashboardModel) -> Line {
    let query = &model.current().query;
    let panel = model.workspace.panel(model.panel);
    let mut line = Line::default();
    let mut field = |label: &str, value: String, tone: Tone| {
        line.push(Span::new(format!(" {label} "), Tone::Muted));
        line.push(Span::new(value, tone));
    };

    let search = if model.mode == InputMode::Search {
        format!("/{}_", query.search)
    } else if query.search.is_empty() {
        "-".to_string()
    } else {
        format!("/{}", query.search)
    };
    let search_tone = if model.mode == InputMode::Search {
        Tone::Accent
    } else {
        Tone::Neutral
    };
    field("search", search, search_tone);

    let (categories, statuses) = panel.facets();
    if !categories.is_empty() {
        field("category", query.category.to_string(), Tone::Neutral);
    }
    if !statuses.is_empty() {
        field("status", query.status.to_string(), Tone::Neutral);
    }
    if let Some(window) = panel.window(query, &model.ctx) {
        field("window", window.label().to_string(), Tone::Neutral);
    }
    let tabs = panel.tabs();
    if let Some(first) = tabs.first() {
        field(
            "tab",
            query.tab.clone().unwrap_or_else(|| (*first).to_string()),
            Tone::Neutral,
        );
    }

    line.push(Span::new("  │", Tone::Muted));
    for kind in model.panel.actions() {
        line.push(Span::new(" ", Tone::Neutral));
        line.push(action_span(*kind, model.action(model.panel, *kind).map(|s| s.state())));
    }
    line
}

fn help_lines() -> Vec<Line> {
    let mut lines = vec![Line::toned("Keys", Tone::Accent), Line::default()];
    lines.extend(HELP.iter().map(|b| {
        let mut line = Line::default();
        line.push(Span::new(pad(b.keys, 22), Tone::Accent).bold());
        line.push(Span::new(b.description, Tone::Neutral));
        line
    }));
    lines
}

fn footer(model: &DashboardModel) -> Line {
    let Some(note) = model.notifications.last() else {
        return Line::toned(" ? help  / search  Enter expand  a action  q quit", Tone::Muted);
    };
    let tone = match note.level {
        NotificationLevel::Info => Tone::Accent,
        NotificationLevel::Warning => Tone::Warning,
        NotificationLevel::Error => Tone::Danger,
    };
    Line::toned(format!(" {}", note.message), tone)
}

/// Every line of the dashboard screen, top to bottom, sized to the terminal.
#[must_use]
pub fn frame(model: &DashboardModel) -> Vec<Line> {
    let width = usize::from(model.terminal_size.0);
    let height = model.body_height();

    let mut lines = vec![tab_bar(model), status_line(model), Line::toned("─".repeat(width), Tone::Muted)];

    let body = if model.help_open {
        help_lines()
    } else {
        match model.view() {
            Ok(view) => {
                let cursor = model.current().cursor;
                let laid = layout_view(&view, Some(cursor));
                let cursor_line = laid.row_lines.get(cursor).copied().unwrap_or(0);
                let skip = (cursor_line + 1).saturating_sub(height);
                laid.lines.into_iter().skip(skip).collect()
            }
            Err(err) => vec![Line::toned(err.to_string(), Tone::Danger)],
        }
    };
    let shown = body.len().min(height);
    lines.extend(body.into_iter().take(height));
    lines.extend(std::iter::repeat_with(Line::default).take(height - shown));

    lines.push(Line::toned("─".repeat(width), Tone::Muted));
    lines.push(footer(model));
    lines.into_iter().map(|l| l.truncate(width)).collect()
}
