//! Accuracy trend per analysis perspective, windowed by time range.

#![allow(missing_docs)]

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::traceability::coverage_tone;
use super::{Cell, Column, Panel, PanelKind, PanelQuery, PanelView, RenderContext, Row, Tile, reject_sort};
use crate::core::errors::{DashError, Result};
use crate::panel::badge::Tone;
use crate::panel::window::{Dated, TimeWindow, WindowAnchor, apply_window, resolve_anchor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Perspective {
    Engineering,
    Architecture,
    Infrastructure,
    Business,
}

impl Perspective {
    pub const ALL: [Self; 4] = [
        Self::Engineering,
        Self::Architecture,
        Self::Infrastructure,
        Self::Business,
    ];

    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Engineering => "engineering",
            Self::Architecture => "architecture",
            Self::Infrastructure => "infrastructure",
            Self::Business => "business",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Engineering => "Engineering",
            Self::Architecture => "Architecture",
            Self::Infrastructure => "Infrastructure",
            Self::Business => "Business",
        }
    }
}

impl FromStr for Perspective {
    type Err = DashError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.token() == wanted)
            .ok_or_else(|| DashError::InvalidFacet {
                panel: PanelKind::Accuracy.token(),
                axis: "tab",
                value: s.to_string(),
            })
    }
}

/// Which series the chart shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccuracyTab {
    #[default]
    All,
    One(Perspective),
}

impl AccuracyTab {
    pub fn parse(tab: Option<&str>) -> Result<Self> {
        match tab.map(str::trim) {
            None | Some("" | "all") => Ok(Self::All),
            Some(other) => other.parse().map(Self::One),
        }
    }

    fn admits(self, perspective: Perspective) -> bool {
        match self {
            Self::All => true,
            Self::One(p) => p == perspective,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub score: u8,
}

impl Dated for TrendPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub perspective: Perspective,
    /// Oldest first.
    pub points: Vec<TrendPoint>,
}

impl TrendSeries {
    #[must_use]
    pub fn latest(&self) -> Option<&TrendPoint> {
        self.points.iter().max_by_key(|p| p.date)
    }
}

#[derive(Debug, Clone)]
pub struct AccuracyPanel {
    pub series: Vec<TrendSeries>,
}

impl AccuracyPanel {
    #[must_use]
    pub fn seeded() -> Self {
        Self {
            series: seed_series(),
        }
    }

    /// Windowed points of every series the tab shows.
    #[must_use]
    pub fn windowed(
        &self,
        tab: AccuracyTab,
        window: TimeWindow,
        anchor: WindowAnchor,
        today: NaiveDate,
    ) -> Vec<(Perspective, Vec<&TrendPoint>)> {
        self.series
            .iter()
            .filter(|s| tab.admits(s.perspective))
            .map(|s| (s.perspective, apply_window(&s.points, window, anchor, today)))
            .collect()
    }
}

impl Panel for AccuracyPanel {
    fn kind(&self) -> PanelKind {
        PanelKind::Accuracy
    }

    fn tabs(&self) -> &'static [&'static str] {
        &["all", "engineering", "architecture", "infrastructure", "business"]
    }

    fn window(&self, query: &PanelQuery, ctx: &RenderContext) -> Option<TimeWindow> {
        Some(query.window.unwrap_or(ctx.default_window))
    }

    fn render(&self, query: &PanelQuery, ctx: &RenderContext) -> Result<PanelView> {
        reject_sort(PanelKind::Accuracy, query)?;
        let tab = AccuracyTab::parse(query.tab.as_deref())?;
        let window = query.window.unwrap_or(ctx.default_window);
        let shown = self.windowed(tab, window, ctx.anchor, ctx.today);

        let mut view = PanelView::new(PanelKind::Accuracy);
        view.tiles = self
            .series
            .iter()
            .filter_map(|s| {
                s.latest().map(|p| {
                    Tile::new(s.perspective.label(), format!("{}%", p.score), coverage_tone(p.score))
                })
            })
            .collect();

        view.columns = std::iter::once("Date")
            .chain(shown.iter().map(|(p, _)| p.label()))
            .map(|label| Column {
                label: label.to_string(),
                sort: None,
                sortable: false,
            })
            .collect();

        let dates: BTreeSet<NaiveDate> = shown
            .iter()
            .flat_map(|(_, points)| points.iter().map(|p| p.date))
            .collect();
        view.rows = dates
            .iter()
            .map(|date| {
                let mut cells = vec![Cell::plain(ctx.format_date(*date))];
                cells.extend(shown.iter().map(|(_, points)| {
                    points.iter().find(|p| p.date == *date).map_or_else(
                        || Cell::toned("–", Tone::Muted),
                        |p| Cell::toned(format!("{}%", p.score), coverage_tone(p.score)),
                    )
                }));
                Row::new(&date.to_string(), cells)
            })
            .collect();

        let all_dates: BTreeSet<NaiveDate> = self
            .series
            .iter()
            .filter(|s| tab.admits(s.perspective))
            .flat_map(|s| s.points.iter().map(|p| p.date))
            .collect();
        view.matched = view.rows.len();
        view.total = all_dates.len();

        if view.rows.is_empty() {
            let anchor = resolve_anchor(
                ctx.anchor,
                ctx.today,
                &self.series.iter().flat_map(|s| s.points.iter().copied()).collect::<Vec<_>>(),
            );
            view.notes.push(format!(
                "No data in window ({} ending {}).",
                window.label(),
                ctx.format_date(anchor)
            ));
        } else {
            view.notes.push(window.label().to_string());
            for (perspective, points) in &shown {
                if let (Some(first), Some(last)) = (points.first(), points.last()) {
                    let delta = i16::from(last.score) - i16::from(first.score);
                    view.notes.push(format!(
                        "{}: {}% → {}% ({delta:+})",
                        perspective.label(),
                        first.score,
                        last.score
                    ));
                }
            }
        }
        Ok(view)
    }
}

fn seed_series() -> Vec<TrendSeries> {
    const DATES: [(u32, u32); 7] = [(1, 1), (1, 15), (2, 1), (2, 15), (3, 1), (3, 15), (4, 1)];
    let series = |perspective, scores: [u8; 7]| TrendSeries {
        perspective,
        points: DATES
            .iter()
            .zip(scores)
            .filter_map(|(&(m, d), score)| {
                NaiveDate::from_ymd_opt(2025, m, d).map(|date| TrendPoint { date, score })
            })
            .collect(),
    };
    vec![
        series(Perspective::Engineering, [75, 78, 80, 79, 82, 84, 87]),
        series(Perspective::Architecture, [80, 82, 85, 86, 84, 83, 82]),
        series(Perspective::Infrastructure, [82, 84, 85, 87, 88, 90, 91]),
        series(Perspective::Business, [70, 72, 74, 75, 76, 78, 79]),
    ]
}
