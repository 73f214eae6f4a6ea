//! One metric over time, compared against the previous period or a fixed
//! baseline.

#![allow(missing_docs)]

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::temporal::{Change, QualityMetric, Verdict};
use super::{Cell, Column, Panel, PanelKind, PanelQuery, PanelView, RenderContext, Row, Tile, reject_sort};
use crate::core::errors::{DashError, Result};
use crate::panel::badge::Tone;
use crate::panel::query::Facet;
use crate::panel::window::{Dated, TimeWindow, apply_window, resolve_anchor};

/// Metrics offered, first one selected by default.
pub const HISTORICAL_METRICS: [QualityMetric; 5] = [
    QualityMetric::Complexity,
    QualityMetric::CodeSmells,
    QualityMetric::Coverage,
    QualityMetric::Bugs,
    QualityMetric::TechnicalDebt,
];

const METRIC_TABS: [&str; 5] = ["complexity", "code_smells", "coverage", "bugs", "technical_debt"];

/// What the current value is measured against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Basis {
    #[default]
    Previous,
    Baseline,
}

impl Basis {
    pub const TOKENS: [&'static str; 2] = ["previous", "baseline"];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Previous => "Previous period",
            Self::Baseline => "Baseline",
        }
    }

    /// The category facet carries the basis; "all" means previous period.
    pub fn from_facet(facet: &Facet) -> Result<Self> {
        match facet.selected() {
            None | Some("previous") => Ok(Self::Previous),
            Some("baseline") => Ok(Self::Baseline),
            Some(other) => Err(DashError::InvalidFacet {
                panel: PanelKind::HistoricalComparison.token(),
                axis: "category",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonPoint {
    pub date: NaiveDate,
    pub current: f64,
    pub previous: f64,
    pub baseline: f64,
}

impl ComparisonPoint {
    #[must_use]
    pub const fn against(&self, basis: Basis) -> f64 {
        match basis {
            Basis::Previous => self.previous,
            Basis::Baseline => self.baseline,
        }
    }
}

impl Dated for ComparisonPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricHistory {
    pub metric: QualityMetric,
    /// Oldest first.
    pub points: Vec<ComparisonPoint>,
}

#[derive(Debug, Clone)]
pub struct HistoricalPanel {
    pub histories: Vec<MetricHistory>,
}

impl HistoricalPanel {
    #[must_use]
    pub fn seeded() -> Self {
        Self {
            histories: seed_histories(),
        }
    }

    fn history(&self, metric: QualityMetric) -> &[ComparisonPoint] {
        self.histories
            .iter()
            .find(|h| h.metric == metric)
            .map(|h| h.points.as_slice())
            .unwrap_or_default()
    }
}

fn metric_for(tab: Option<&str>) -> Result<QualityMetric> {
    match tab.map(str::trim) {
        None | Some("") => Ok(HISTORICAL_METRICS[0]),
        Some(t) => QualityMetric::parse(PanelKind::HistoricalComparison, &HISTORICAL_METRICS, t),
    }
}

fn change_cell(change: Option<Change>) -> Cell {
    change.map_or_else(
        || Cell::toned("–", Tone::Muted),
        |c| Cell::toned(c.text(), c.verdict.tone()),
    )
}

impl Panel for HistoricalPanel {
    fn kind(&self) -> PanelKind {
        PanelKind::HistoricalComparison
    }

    fn facets(&self) -> (&'static [&'static str], &'static [&'static str]) {
        (&Basis::TOKENS, &[])
    }

    fn tabs(&self) -> &'static [&'static str] {
        &METRIC_TABS
    }

    fn window(&self, query: &PanelQuery, ctx: &RenderContext) -> Option<TimeWindow> {
        Some(query.window.unwrap_or(ctx.default_window))
    }

    fn render(&self, query: &PanelQuery, ctx: &RenderContext) -> Result<PanelView> {
        reject_sort(PanelKind::HistoricalComparison, query)?;
        let metric = metric_for(query.tab.as_deref())?;
        let basis = Basis::from_facet(&query.category)?;
        let window = query.window.unwrap_or(ctx.default_window);
        let all = self.history(metric);
        let shown = apply_window(all, window, ctx.anchor, ctx.today);

        let mut view = PanelView::new(PanelKind::HistoricalComparison);
        view.title = format!("{}: {}", view.title, metric.label());

        // Tiles read the newest point regardless of the window.
        let latest = all.iter().max_by_key(|p| p.date);
        let headline = latest.and_then(|p| Change::between(metric, p.against(basis), p.current));
        view.tiles = vec![
            Tile::new(
                "Current",
                latest.map_or_else(|| "–".to_string(), |p| metric.format(p.current)),
                Tone::Accent,
            ),
            Tile::new(
                basis.label(),
                latest.map_or_else(|| "–".to_string(), |p| metric.format(p.against(basis))),
                Tone::Neutral,
            ),
            Tile::new(
                "Change",
                headline.map_or_else(|| "–".to_string(), |c| c.text()),
                headline.map_or(Tone::Muted, |c| c.verdict.tone()),
            ),
        ];
        view.columns = ["Month", "Current", basis.label(), "Delta", "Change"]
            .iter()
            .map(|label| Column {
                label: (*label).to_string(),
                sort: None,
                sortable: false,
            })
            .collect();

        view.rows = shown
            .iter()
            .map(|p| {
                let against = p.against(basis);
                Row::new(
                    &p.date.to_string(),
                    vec![
                        Cell::plain(p.date.format("%b %Y")),
                        Cell::plain(metric.format(p.current)),
                        Cell::plain(metric.format(against)),
                        Cell::plain(metric.format_delta(p.current - against)),
                        change_cell(Change::between(metric, against, p.current)),
                    ],
                )
            })
            .collect();
        view.matched = view.rows.len();
        view.total = all.len();

        if view.rows.is_empty() {
            let anchor = resolve_anchor(ctx.anchor, ctx.today, all);
            view.notes.push(format!(
                "No data in window ({} ending {}).",
                window.label(),
                ctx.format_date(anchor)
            ));
        } else {
            view.notes.push(window.label().to_string());
        }
        if let Some(change) = headline {
            let verdict = match change.verdict {
                Verdict::Stable => "holding steady",
                Verdict::Improved => "an improvement",
                Verdict::Declined => "a decline",
            };
            view.notes.push(format!(
                "{} is {} against the {}: {verdict}.",
                metric.label(),
                change.text(),
                basis.label().to_lowercase()
            ));
        }
        Ok(view)
    }
}

fn seed_histories() -> Vec<MetricHistory> {
    let history = |metric, rows: [(f64, f64, f64); 4]| MetricHistory {
        metric,
        points: (1u32..)
            .zip(rows)
            .filter_map(|(month, (current, previous, baseline))| {
                NaiveDate::from_ymd_opt(2025, month, 1).map(|date| ComparisonPoint {
                    date,
                    current,
                    previous,
                    baseline,
                })
            })
            .collect(),
    };
    vec![
        history(
            QualityMetric::Complexity,
            [(3.2, 3.8, 3.5), (3.0, 3.6, 3.5), (2.8, 3.4, 3.5), (2.5, 3.2, 3.5)],
        ),
        history(
            QualityMetric::CodeSmells,
            [(245.0, 310.0, 280.0), (220.0, 290.0, 280.0), (195.0, 270.0, 280.0), (175.0, 250.0, 280.0)],
        ),
        history(
            QualityMetric::Coverage,
            [(68.0, 62.0, 70.0), (72.0, 64.0, 70.0), (75.0, 66.0, 70.0), (78.0, 68.0, 70.0)],
        ),
        history(
            QualityMetric::Bugs,
            [(42.0, 56.0, 45.0), (38.0, 52.0, 45.0), (35.0, 48.0, 45.0), (30.0, 45.0, 45.0)],
        ),
        history(
            QualityMetric::TechnicalDebt,
            [(18.0, 22.0, 20.0), (17.0, 21.0, 20.0), (16.0, 20.0, 20.0), (15.0, 19.0, 20.0)],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_at(y: i32, m: u32, d: u32) -> RenderContext {
        RenderContext::at(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn render(query: &PanelQuery) -> PanelView {
        HistoricalPanel::seeded().render(query, &ctx_at(2025, 4, 10)).unwrap()
    }

    #[test]
    fn complexity_against_previous_period_by_default() {
        let view = render(&PanelQuery::default());
        assert_eq!(view.title, "Historical Comparison: Complexity");
        assert_eq!(view.tile("Current"), Some("2.5"));
        assert_eq!(view.tile("Previous period"), Some("3.2"));
        assert_eq!(view.tile("Change"), Some("-21.9%"));
        // Three-month window from Apr 10 drops January.
        assert_eq!(view.row_ids(), vec!["2025-02-01", "2025-03-01", "2025-04-01"]);
        assert_eq!(view.rows[2].cells[3].text, "-0.7");
        assert_eq!(view.rows[2].cells[4].tone, Tone::Success);
    }

    #[test]
    fn baseline_basis_swaps_the_comparison_column() {
        let view = render(&PanelQuery::default().tab("coverage").category("baseline"));
        assert_eq!(view.tile("Baseline"), Some("70"));
        assert_eq!(view.tile("Change"), Some("+11.4%"));
        assert_eq!(view.columns[2].label, "Baseline");
        let feb = &view.rows[0];
        assert_eq!(feb.cells[4].text, "+2.9%");
        assert_eq!(feb.cells[4].tone, Tone::Success);
    }

    #[test]
    fn below_one_percent_is_stable() {
        let view = render(&PanelQuery::default().tab("bugs").category("baseline"));
        // April: 30 vs 45 baseline; January was 42 vs 45.
        assert_eq!(view.tile("Change"), Some("-33.3%"));
        let wide = render(&PanelQuery::default().tab("technical-debt").category("baseline").window(TimeWindow::All));
        assert_eq!(wide.rows.len(), 4);
        assert_eq!(wide.total, 4);
        assert!(Change::between(QualityMetric::Bugs, 45.0, 44.8).is_some_and(|c| c.verdict == Verdict::Stable));
    }

    #[test]
    fn window_trims_rows_but_not_tiles() {
        let narrow = render(&PanelQuery::default().window(TimeWindow::OneMonth));
        let wide = render(&PanelQuery::default().window(TimeWindow::All));
        assert_eq!(narrow.row_ids(), vec!["2025-04-01"]);
        assert_eq!(wide.rows.len(), 4);
        assert_eq!(narrow.tiles, wide.tiles);
    }

    #[test]
    fn stale_wall_clock_empties_rows_only() {
        let view = HistoricalPanel::seeded()
            .render(&PanelQuery::default(), &ctx_at(2026, 10, 19))
            .unwrap();
        assert!(view.rows.is_empty());
        assert!(view.notes[0].starts_with("No data in window"));
        assert_eq!(view.tile("Current"), Some("2.5"));
    }

    #[test]
    fn bad_metric_or_basis_is_rejected() {
        let panel = HistoricalPanel::seeded();
        let ctx = ctx_at(2025, 4, 10);
        for query in [
            PanelQuery::default().tab("duplication"),
            PanelQuery::default().category("forecast"),
            PanelQuery::default().sort("current"),
        ] {
            assert_eq!(panel.render(&query, &ctx).unwrap_err().code(), "C2S-2002");
        }
    }
}
