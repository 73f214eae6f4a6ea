//! Code-quality metrics over time at a selectable granularity.
//!
//! The tab picks the series (daily, weekly, monthly, quarterly) and the time
//! window trims it. Metric rows double as a multi-select: an expanded row is
//! a selected metric, and the selection never drops below one metric.

#![allow(missing_docs)]

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{Cell, Column, Panel, PanelKind, PanelQuery, PanelView, RenderContext, Row, Tile, reject_sort};
use crate::core::errors::{DashError, Result};
use crate::panel::badge::Tone;
use crate::panel::expand::ExpandSet;
use crate::panel::window::{Dated, TimeWindow, apply_window, resolve_anchor};

// ──────────────────── metrics ────────────────────

/// A tracked code-quality measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityMetric {
    Complexity,
    CodeSmells,
    Bugs,
    Coverage,
    Duplication,
    TechnicalDebt,
}

impl QualityMetric {
    pub const ALL: [Self; 6] = [
        Self::Complexity,
        Self::CodeSmells,
        Self::Bugs,
        Self::Coverage,
        Self::Duplication,
        Self::TechnicalDebt,
    ];

    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Complexity => "complexity",
            Self::CodeSmells => "code_smells",
            Self::Bugs => "bugs",
            Self::Coverage => "coverage",
            Self::Duplication => "duplication",
            Self::TechnicalDebt => "technical_debt",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Complexity => "Complexity",
            Self::CodeSmells => "Code Smells",
            Self::Bugs => "Bugs",
            Self::Coverage => "Test Coverage",
            Self::Duplication => "Duplication",
            Self::TechnicalDebt => "Technical Debt",
        }
    }

    /// Coverage is the only metric where a rise is good news.
    #[must_use]
    pub const fn higher_is_better(self) -> bool {
        matches!(self, Self::Coverage)
    }

    /// Complexity keeps one decimal, counts and percentages none.
    #[must_use]
    pub fn format(self, value: f64) -> String {
        match self {
            Self::Complexity => format!("{value:.1}"),
            _ => format!("{value:.0}"),
        }
    }

    /// Signed difference in the metric's own precision.
    #[must_use]
    pub fn format_delta(self, delta: f64) -> String {
        match self {
            Self::Complexity => format!("{delta:+.1}"),
            _ => format!("{delta:+.0}"),
        }
    }

    /// Parse a metric offered by `panel`.
    pub fn parse(panel: PanelKind, offered: &[Self], s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        offered
            .iter()
            .copied()
            .find(|m| m.token() == wanted)
            .ok_or_else(|| DashError::InvalidFacet {
                panel: panel.token(),
                axis: "metric",
                value: s.to_string(),
            })
    }
}

/// How a change reads for a given metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Improved,
    Declined,
    /// Under one percent either way.
    Stable,
}

impl Verdict {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Improved => "Improved",
            Self::Declined => "Declined",
            Self::Stable => "Stable",
        }
    }

    #[must_use]
    pub const fn tone(self) -> Tone {
        match self {
            Self::Improved => Tone::Success,
            Self::Declined => Tone::Danger,
            Self::Stable => Tone::Muted,
        }
    }
}

/// Relative change from `from` to `to`, read in the metric's direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Change {
    pub percent: f64,
    pub verdict: Verdict,
}

impl Change {
    /// `None` when `from` is zero.
    #[must_use]
    pub fn between(metric: QualityMetric, from: f64, to: f64) -> Option<Self> {
        if from == 0.0 {
            return None;
        }
        let percent = (to - from) / from * 100.0;
        let verdict = if percent.abs() < 1.0 {
            Verdict::Stable
        } else if (percent > 0.0) == metric.higher_is_better() {
            Verdict::Improved
        } else {
            Verdict::Declined
        };
        Some(Self { percent, verdict })
    }

    #[must_use]
    pub fn text(&self) -> String {
        format!("{:+.1}%", self.percent)
    }
}

// ──────────────────── series ────────────────────

/// Bucket size of one series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    #[default]
    Weekly,
    Monthly,
    Quarterly,
}

impl Granularity {
    pub const ALL: [Self; 4] = [Self::Daily, Self::Weekly, Self::Monthly, Self::Quarterly];

    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
            Self::Quarterly => "Quarterly",
        }
    }

    /// Tab value; absent or empty means weekly.
    pub fn parse(tab: Option<&str>) -> Result<Self> {
        match tab.map(|t| t.trim().to_ascii_lowercase()) {
            None => Ok(Self::default()),
            Some(t) if t.is_empty() => Ok(Self::default()),
            Some(t) => Self::ALL
                .into_iter()
                .find(|g| g.token() == t)
                .ok_or_else(|| DashError::InvalidFacet {
                    panel: PanelKind::TemporalMetrics.token(),
                    axis: "tab",
                    value: t,
                }),
        }
    }

    /// Period name for a bucket starting on `date`.
    #[must_use]
    pub fn period(self, date: NaiveDate, ctx: &RenderContext) -> String {
        match self {
            Self::Daily => ctx.format_date(date),
            Self::Weekly => format!("Week of {}", ctx.format_date(date)),
            Self::Monthly => date.format("%b %Y").to_string(),
            Self::Quarterly => format!("Q{} {}", date.month0() / 3 + 1, date.year()),
        }
    }
}

/// Every metric's value for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub date: NaiveDate,
    pub values: Vec<(QualityMetric, f64)>,
}

impl MetricSample {
    #[must_use]
    pub fn value(&self, metric: QualityMetric) -> Option<f64> {
        self.values.iter().find(|(m, _)| *m == metric).map(|(_, v)| *v)
    }
}

impl Dated for MetricSample {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GranularSeries {
    pub granularity: Granularity,
    /// Oldest first.
    pub samples: Vec<MetricSample>,
}

/// Metrics this panel charts, in row order.
pub const TEMPORAL_METRICS: [QualityMetric; 5] = [
    QualityMetric::Complexity,
    QualityMetric::CodeSmells,
    QualityMetric::Bugs,
    QualityMetric::Coverage,
    QualityMetric::Duplication,
];

/// Selected when the query says nothing.
pub const DEFAULT_SELECTED: [QualityMetric; 3] = [
    QualityMetric::Complexity,
    QualityMetric::CodeSmells,
    QualityMetric::Coverage,
];

const KEEP_ONE_NOTE: &str = "At least one metric stays selected.";

// ──────────────────── panel ────────────────────

#[derive(Debug, Clone)]
pub struct TemporalPanel {
    pub series: Vec<GranularSeries>,
}

impl TemporalPanel {
    #[must_use]
    pub fn seeded() -> Self {
        Self {
            series: seed_series(),
        }
    }

    fn samples(&self, granularity: Granularity) -> &[MetricSample] {
        self.series
            .iter()
            .find(|s| s.granularity == granularity)
            .map(|s| s.samples.as_slice())
            .unwrap_or_default()
    }

    /// Selected metrics for a query, and whether a collapse was refused to
    /// keep the selection non-empty.
    pub fn selection(query: &PanelQuery) -> Result<(Vec<QualityMetric>, bool)> {
        let mut selected = ExpandSet::with_expanded(DEFAULT_SELECTED.iter().map(|m| m.token()));
        if query.expand_all {
            selected.expand_all(TEMPORAL_METRICS.iter().map(|m| m.token()));
        }
        for id in &query.expand {
            let metric = QualityMetric::parse(PanelKind::TemporalMetrics, &TEMPORAL_METRICS, id)?;
            selected.expand(metric.token());
        }
        let mut refused = false;
        for id in &query.collapse {
            let metric = QualityMetric::parse(PanelKind::TemporalMetrics, &TEMPORAL_METRICS, id)?;
            if selected.is_expanded(metric.token()) && selected.len() == 1 {
                refused = true;
            } else {
                selected.collapse(metric.token());
            }
        }
        let metrics = TEMPORAL_METRICS
            .into_iter()
            .filter(|m| selected.is_expanded(m.token()))
            .collect();
        Ok((metrics, refused))
    }
}

/// First-to-last change of `metric` across `samples`.
fn trend<'a>(metric: QualityMetric, samples: impl IntoIterator<Item = &'a MetricSample>) -> Option<Change> {
    let mut values = samples.into_iter().filter_map(|s| s.value(metric));
    let first = values.next()?;
    let last = values.last().unwrap_or(first);
    Change::between(metric, first, last)
}

impl Panel for TemporalPanel {
    fn kind(&self) -> PanelKind {
        PanelKind::TemporalMetrics
    }

    fn tabs(&self) -> &'static [&'static str] {
        &["weekly", "daily", "monthly", "quarterly"]
    }

    fn window(&self, query: &PanelQuery, ctx: &RenderContext) -> Option<TimeWindow> {
        Some(query.window.unwrap_or(ctx.default_window))
    }

    fn render(&self, query: &PanelQuery, ctx: &RenderContext) -> Result<PanelView> {
        reject_sort(PanelKind::TemporalMetrics, query)?;
        let granularity = Granularity::parse(query.tab.as_deref())?;
        let window = query.window.unwrap_or(ctx.default_window);
        let (selected, refused) = Self::selection(query)?;
        let all = self.samples(granularity);
        let shown = apply_window(all, window, ctx.anchor, ctx.today);

        let mut view = PanelView::new(PanelKind::TemporalMetrics);
        let improving = selected
            .iter()
            .filter(|m| trend(**m, all).is_some_and(|c| c.verdict == Verdict::Improved))
            .count();
        view.tiles = vec![
            Tile::new("Granularity", granularity.label(), Tone::Accent),
            Tile::new("Periods", all.len(), Tone::Neutral),
            Tile::new("Selected", format!("{} of {}", selected.len(), TEMPORAL_METRICS.len()), Tone::Neutral),
            Tile::new("Improving", improving, Tone::Success),
        ];
        view.columns = ["Metric", "Latest", "Change", "Trend"]
            .iter()
            .map(|label| Column {
                label: (*label).to_string(),
                sort: None,
                sortable: false,
            })
            .collect();

        for metric in TEMPORAL_METRICS {
            let is_selected = selected.contains(&metric);
            let latest = shown.last().and_then(|s| s.value(metric));
            let change = trend(metric, shown.iter().copied());
            let detail = shown
                .iter()
                .filter_map(|s| {
                    s.value(metric)
                        .map(|v| format!("{}: {}", granularity.period(s.date, ctx), metric.format(v)))
                })
                .collect();
            view.rows.push(
                Row::new(
                    metric.token(),
                    vec![
                        Cell::plain(metric.label()),
                        latest.map_or_else(|| Cell::toned("–", Tone::Muted), |v| Cell::plain(metric.format(v))),
                        change.map_or_else(|| Cell::toned("–", Tone::Muted), |c| Cell::toned(c.text(), c.verdict.tone())),
                        change.map_or_else(
                            || Cell::toned("–", Tone::Muted),
                            |c| Cell::toned(c.verdict.label(), c.verdict.tone()),
                        ),
                    ],
                )
                .expandable(is_selected, detail),
            );
        }
        view.matched = shown.len();
        view.total = all.len();

        if shown.is_empty() {
            let anchor = resolve_anchor(ctx.anchor, ctx.today, all);
            view.notes.push(format!(
                "No data in window ({} ending {}).",
                window.label(),
                ctx.format_date(anchor)
            ));
        } else {
            view.notes.push(format!(
                "{} · {} of {} periods",
                window.label(),
                shown.len(),
                all.len()
            ));
            for metric in &selected {
                if let Some(change) = trend(*metric, shown.iter().copied()) {
                    view.notes.push(format!(
                        "{}: {} ({}) over the selected period.",
                        metric.label(),
                        change.verdict.label(),
                        change.text()
                    ));
                }
            }
        }
        if refused {
            view.notes.push(KEEP_ONE_NOTE.to_string());
        }
        Ok(view)
    }
}

// ──────────────────── seed data ────────────────────

fn sample(date: Option<NaiveDate>, row: [f64; 5]) -> Option<MetricSample> {
    Some(MetricSample {
        date: date?,
        values: TEMPORAL_METRICS.into_iter().zip(row).collect(),
    })
}

fn seed_series() -> Vec<GranularSeries> {
    let ymd = NaiveDate::from_ymd_opt;
    let daily = [
        [3.2, 245.0, 42.0, 68.0, 12.0],
        [3.2, 248.0, 44.0, 67.0, 12.0],
        [3.1, 240.0, 40.0, 69.0, 11.0],
        [3.0, 235.0, 38.0, 70.0, 11.0],
        [2.9, 230.0, 36.0, 72.0, 10.0],
        [2.8, 220.0, 34.0, 74.0, 10.0],
        [2.7, 210.0, 32.0, 76.0, 9.0],
    ];
    let weekly = [
        [3.5, 280.0, 52.0, 62.0, 14.0],
        [3.3, 260.0, 48.0, 65.0, 13.0],
        [3.1, 240.0, 44.0, 68.0, 12.0],
        [2.9, 220.0, 40.0, 71.0, 11.0],
        [2.7, 200.0, 36.0, 74.0, 10.0],
        [2.5, 180.0, 32.0, 77.0, 9.0],
        [2.3, 160.0, 28.0, 80.0, 8.0],
    ];
    let monthly = [
        (ymd(2024, 10, 1), [4.0, 320.0, 65.0, 55.0, 18.0]),
        (ymd(2024, 11, 1), [3.8, 300.0, 60.0, 58.0, 17.0]),
        (ymd(2024, 12, 1), [3.6, 280.0, 55.0, 61.0, 16.0]),
        (ymd(2025, 1, 1), [3.4, 260.0, 50.0, 64.0, 15.0]),
        (ymd(2025, 2, 1), [3.2, 240.0, 45.0, 67.0, 14.0]),
        (ymd(2025, 3, 1), [3.0, 220.0, 40.0, 70.0, 13.0]),
        (ymd(2025, 4, 1), [2.8, 200.0, 35.0, 73.0, 12.0]),
    ];
    let quarterly = [
        (ymd(2024, 4, 1), [4.5, 380.0, 75.0, 50.0, 20.0]),
        (ymd(2024, 7, 1), [4.2, 350.0, 70.0, 55.0, 19.0]),
        (ymd(2024, 10, 1), [3.9, 320.0, 65.0, 60.0, 18.0]),
        (ymd(2025, 1, 1), [3.6, 290.0, 60.0, 65.0, 17.0]),
        (ymd(2025, 4, 1), [3.3, 260.0, 55.0, 70.0, 16.0]),
    ];

    let first_week = ymd(2025, 2, 17);
    vec![
        GranularSeries {
            granularity: Granularity::Daily,
            samples: (1u32..)
                .zip(daily)
                .filter_map(|(day, row)| sample(ymd(2025, 4, day), row))
                .collect(),
        },
        GranularSeries {
            granularity: Granularity::Weekly,
            samples: (0u64..)
                .zip(weekly)
                .filter_map(|(week, row)| {
                    sample(first_week.and_then(|d| d.checked_add_days(chrono::Days::new(week * 7))), row)
                })
                .collect(),
        },
        GranularSeries {
            granularity: Granularity::Monthly,
            samples: monthly.into_iter().filter_map(|(d, row)| sample(d, row)).collect(),
        },
        GranularSeries {
            granularity: Granularity::Quarterly,
            samples: quarterly.into_iter().filter_map(|(d, row)| sample(d, row)).collect(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::window::WindowAnchor;

    fn ctx_at(y: i32, m: u32, d: u32) -> RenderContext {
        RenderContext::at(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn render(query: &PanelQuery) -> PanelView {
        TemporalPanel::seeded().render(query, &ctx_at(2025, 4, 10)).unwrap()
    }

    fn row<'a>(view: &'a PanelView, id: &str) -> &'a Row {
        view.rows.iter().find(|r| r.id == id).expect("metric row")
    }

    #[test]
    fn weekly_default_selects_three_metrics() {
        let view = render(&PanelQuery::default());
        assert_eq!(view.tile("Granularity"), Some("Weekly"));
        assert_eq!(view.tile("Selected"), Some("3 of 5"));
        assert_eq!(view.rows.len(), 5);
        let open: Vec<&str> = view.rows.iter().filter(|r| r.expanded).map(|r| r.id.as_str()).collect();
        assert_eq!(open, vec!["complexity", "code_smells", "coverage"]);
        assert_eq!((view.matched, view.total), (7, 7));
    }

    #[test]
    fn change_reads_in_metric_direction() {
        let view = render(&PanelQuery::default());
        let complexity = row(&view, "complexity");
        assert_eq!(complexity.cells[1].text, "2.3");
        assert_eq!(complexity.cells[2].text, "-34.3%");
        assert_eq!(complexity.cells[3].text, "Improved");
        let coverage = row(&view, "coverage");
        assert_eq!(coverage.cells[2].text, "+29.0%");
        assert_eq!(coverage.cells[3].text, "Improved");
        assert_eq!(view.tile("Improving"), Some("3"));
    }

    #[test]
    fn granularity_tab_and_window_trim_the_series() {
        let monthly = render(&PanelQuery::default().tab("monthly"));
        assert_eq!((monthly.matched, monthly.total), (3, 7));
        assert_eq!(row(&monthly, "complexity").cells[2].text, "-12.5%");

        let all = render(&PanelQuery::default().tab("monthly").window(TimeWindow::All));
        assert_eq!(row(&all, "complexity").cells[2].text, "-30.0%");
        assert_eq!(
            row(&all, "complexity").detail.first().map(String::as_str),
            Some("Oct 2024: 4.0")
        );

        let quarterly = render(&PanelQuery::default().tab("quarterly"));
        assert_eq!(quarterly.matched, 1);
        assert_eq!(row(&quarterly, "bugs").cells[3].text, "Stable");
    }

    #[test]
    fn toggles_are_independent_and_never_empty() {
        let view = render(&PanelQuery::default().expand("duplication"));
        assert_eq!(view.tile("Selected"), Some("4 of 5"));

        let mut q = PanelQuery::default();
        q.collapse = vec!["complexity".into(), "code_smells".into(), "coverage".into()];
        let view = render(&q);
        assert_eq!(view.tile("Selected"), Some("1 of 5"));
        assert!(row(&view, "coverage").expanded);
        assert!(view.notes.iter().any(|n| n == KEEP_ONE_NOTE));
    }

    #[test]
    fn expand_all_then_collapse_one() {
        let mut q = PanelQuery::default();
        q.expand_all = true;
        q.collapse.push("bugs".into());
        let view = render(&q);
        assert_eq!(view.tile("Selected"), Some("4 of 5"));
        assert!(!row(&view, "bugs").expanded);
    }

    #[test]
    fn quarter_and_week_periods() {
        let ctx = ctx_at(2025, 4, 10);
        let d = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        assert_eq!(Granularity::Quarterly.period(d, &ctx), "Q3 2024");
        assert_eq!(Granularity::Weekly.period(d, &ctx), "Week of Jul 1, 2024");
    }

    #[test]
    fn wall_clock_far_from_data_keeps_rows_but_empties_values() {
        let view = TemporalPanel::seeded()
            .render(&PanelQuery::default(), &ctx_at(2026, 10, 19))
            .unwrap();
        assert_eq!(view.rows.len(), 5);
        assert_eq!(view.matched, 0);
        assert!(view.notes[0].starts_with("No data in window"));

        let mut ctx = ctx_at(2026, 10, 19);
        ctx.anchor = WindowAnchor::LatestSample;
        let view = TemporalPanel::seeded().render(&PanelQuery::default(), &ctx).unwrap();
        assert_eq!(view.matched, 7);
    }

    #[test]
    fn bad_inputs_are_rejected() {
        let panel = TemporalPanel::seeded();
        let ctx = ctx_at(2025, 4, 10);
        for query in [
            PanelQuery::default().tab("hourly"),
            PanelQuery::default().expand("latency"),
            PanelQuery::default().sort("complexity"),
        ] {
            assert_eq!(panel.render(&query, &ctx).unwrap_err().code(), "C2S-2002");
        }
    }

    #[test]
    fn zero_baseline_has_no_change() {
        assert_eq!(Change::between(QualityMetric::Bugs, 0.0, 5.0), None);
        let up = Change::between(QualityMetric::Bugs, 10.0, 12.0).unwrap();
        assert_eq!(up.verdict, Verdict::Declined);
        assert_eq!(up.text(), "+20.0%");
    }
}
