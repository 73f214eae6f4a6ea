//! Daily file activity for a directory, bucketed per month with a weekday
//! heatmap.
//!
//! History is synthesized from a hash of the directory and the date, so the
//! same directory and end date always produce the same year of activity.

#![allow(missing_docs)]

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::badges::{BadgeKey, badge};
use super::{Cell, Column, Panel, PanelKind, PanelQuery, PanelView, RenderContext, Row, Tile};
use crate::core::errors::{DashError, Result};
use crate::panel::badge::Tone;
use crate::panel::expand::ExpandSet;
use crate::panel::window::{Dated, TimeWindow, apply_window};

pub const DEFAULT_DIRECTORY: &str = "/src";

/// Most files listed for a single day.
const MAX_FILES_PER_DAY: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub changes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDay {
    pub date: NaiveDate,
    pub commits: u32,
    pub files: Vec<FileChange>,
}

impl ActivityDay {
    #[must_use]
    pub fn files_changed(&self) -> usize {
        self.files.len()
    }
}

impl Dated for ActivityDay {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Heatmap cell level, relative to the busiest day shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    None,
    Low,
    Medium,
    High,
    Peak,
}

impl Intensity {
    #[must_use]
    pub fn of(count: u32, max: u32) -> Self {
        if count == 0 {
            return Self::None;
        }
        let ratio = f64::from(count) / f64::from(max.max(1));
        if ratio < 0.25 {
            Self::Low
        } else if ratio < 0.5 {
            Self::Medium
        } else if ratio < 0.75 {
            Self::High
        } else {
            Self::Peak
        }
    }
}

// ──────────────────── synthesis ────────────────────

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

/// Uniform value in `[0, 1)` for a seed and salt.
#[allow(clippy::cast_precision_loss)]
fn noise(seed: &str, salt: u32) -> f64 {
    let h = fnv1a(format!("{seed}#{salt}").as_bytes());
    (h >> 11) as f64 / (1u64 << 53) as f64
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scaled(unit: f64, span: u32) -> u32 {
    (unit * f64::from(span)).floor() as u32
}

fn synthesize_day(directory: &str, date: NaiveDate) -> ActivityDay {
    const STEMS: [&str; 5] = ["component", "util", "page", "helper", "model"];
    const EXTS: [&str; 5] = ["tsx", "ts", "css", "json", "md"];

    let seed = format!("{directory}|{date}");
    let weekday = !matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
    let factor = if weekday { 0.7 } else { 0.3 };
    let commits = scaled(noise(&seed, 0) * factor, 10);
    let dir = directory.trim_end_matches('/');
    let files = (0..commits.min(MAX_FILES_PER_DAY))
        .map(|i| {
            let stem = STEMS[scaled(noise(&seed, 3 * i + 1), 5) as usize % STEMS.len()];
            let ext = EXTS[scaled(noise(&seed, 3 * i + 2), 5) as usize % EXTS.len()];
            FileChange {
                path: format!("{dir}/{stem}-{}.{ext}", i + 1),
                changes: scaled(noise(&seed, 3 * i + 3), 50) + 1,
            }
        })
        .collect();
    ActivityDay {
        date,
        commits,
        files,
    }
}

/// One year of daily activity ending on `end`, oldest first.
#[must_use]
pub fn synthesize_year(directory: &str, end: NaiveDate) -> Vec<ActivityDay> {
    let start = end.checked_sub_months(Months::new(12)).unwrap_or(end);
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|d| synthesize_day(directory, d))
        .collect()
}

// ──────────────────── buckets ────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthBucket {
    pub year: i32,
    pub month: u32,
    pub commits: u32,
    pub active_days: usize,
    pub files_changed: usize,
    pub busiest: Option<NaiveDate>,
    /// Changes on the busiest day.
    pub peak: u32,
}

impl MonthBucket {
    /// `"2025-04"`, also the row id.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

#[must_use]
pub fn bucket_by_month(days: &[&ActivityDay]) -> Vec<MonthBucket> {
    let mut buckets: BTreeMap<(i32, u32), MonthBucket> = BTreeMap::new();
    for day in days {
        let b = buckets
            .entry((day.date.year(), day.date.month()))
            .or_insert_with(|| MonthBucket {
                year: day.date.year(),
                month: day.date.month(),
                commits: 0,
                active_days: 0,
                files_changed: 0,
                busiest: None,
                peak: 0,
            });
        b.commits += day.commits;
        b.files_changed += day.files_changed();
        if day.commits > 0 {
            b.active_days += 1;
        }
        if day.commits > b.peak {
            b.peak = day.commits;
            b.busiest = Some(day.date);
        }
    }
    buckets.into_values().collect()
}

/// Weekday rows (Sun..Sat) of intensity glyphs, one column per week.
#[must_use]
pub fn weekly_grid(days: &[&ActivityDay]) -> Vec<String> {
    const NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
    let max = days.iter().map(|d| d.commits).max().unwrap_or(0);
    let mut rows: Vec<String> = NAMES.iter().map(|n| format!("{n} ")).collect();
    let Some(first) = days.first() else {
        return rows;
    };
    let lead = first.date.weekday().num_days_from_sunday() as usize;
    for row in rows.iter_mut().take(lead) {
        row.push(' ');
    }
    for day in days {
        let slot = day.date.weekday().num_days_from_sunday() as usize;
        rows[slot].push_str(badge(BadgeKey::Intensity(Intensity::of(day.commits, max))).glyph);
    }
    rows
}

// ──────────────────── panel ────────────────────

#[derive(Debug, Clone)]
pub struct ActivityPanel {
    pub directory: String,
    pub end: NaiveDate,
    pub days: Vec<ActivityDay>,
}

impl ActivityPanel {
    /// A year of history for [`DEFAULT_DIRECTORY`] ending on `end`.
    #[must_use]
    pub fn seeded(end: NaiveDate) -> Self {
        Self::for_directory(DEFAULT_DIRECTORY, end)
    }

    #[must_use]
    pub fn for_directory(directory: &str, end: NaiveDate) -> Self {
        Self {
            directory: directory.to_string(),
            end,
            days: synthesize_year(directory, end),
        }
    }

    fn render_days(&self, days: &[ActivityDay], query: &PanelQuery, ctx: &RenderContext) -> Result<PanelView> {
        let window = query.window.unwrap_or(TimeWindow::OneYear);
        let shown = apply_window(days, window, ctx.anchor, ctx.today);
        let buckets = bucket_by_month(&shown);

        let mut view = PanelView::new(PanelKind::Activity);
        let busiest = shown.iter().max_by_key(|d| (d.commits, std::cmp::Reverse(d.date)));
        view.tiles = vec![
            Tile::new("Changes", shown.iter().map(|d| d.commits).sum::<u32>(), Tone::Accent),
            Tile::new(
                "Active days",
                shown.iter().filter(|d| d.commits > 0).count(),
                Tone::Success,
            ),
            Tile::new(
                "Files changed",
                shown.iter().map(|d| d.files_changed()).sum::<usize>(),
                Tone::Neutral,
            ),
            Tile::new(
                "Busiest day",
                busiest
                    .filter(|d| d.commits > 0)
                    .map_or_else(|| "–".to_string(), |d| ctx.format_date(d.date)),
                Tone::Warning,
            ),
        ];
        view.columns = ["Month", "Changes", "Active days", "Files changed", "Busiest day"]
            .iter()
            .map(|label| Column {
                label: (*label).to_string(),
                sort: None,
                sortable: false,
            })
            .collect();

        let mut expanded = ExpandSet::new();
        let keys: Vec<String> = buckets.iter().map(MonthBucket::key).collect();
        query.apply_expansion(&mut expanded, keys.iter().map(String::as_str));
        for bucket in &buckets {
            let key = bucket.key();
            let label = NaiveDate::from_ymd_opt(bucket.year, bucket.month, 1)
                .map_or_else(|| key.clone(), |d| d.format("%b %Y").to_string());
            let is_open = expanded.is_expanded(&key);
            let detail = if is_open { top_files(&shown, bucket) } else { Vec::new() };
            view.rows.push(
                Row::new(
                    &key,
                    vec![
                        Cell::plain(label),
                        Cell::plain(bucket.commits),
                        Cell::plain(bucket.active_days),
                        Cell::plain(bucket.files_changed),
                        Cell::plain(bucket.busiest.map_or_else(|| "–".to_string(), |d| ctx.format_date(d))),
                    ],
                )
                .expandable(is_open, detail),
            );
        }
        view.matched = view.rows.len();
        view.total = bucket_by_month(&days.iter().collect::<Vec<_>>()).len();

        view.notes.push(format!("File activity over time for {}", self.directory_for(query)));
        if shown.is_empty() {
            view.notes.push(format!("No data in window ({}).", window.label()));
        } else {
            view.notes.extend(weekly_grid(&shown));
            view.notes.push("Less · ░ ▒ ▓ █ More".to_string());
        }
        if let Some(focus) = &query.focus {
            let date: NaiveDate = focus.parse().map_err(|_| DashError::InvalidFacet {
                panel: PanelKind::Activity.token(),
                axis: "day",
                value: focus.clone(),
            })?;
            match shown.iter().find(|d| d.date == date) {
                Some(day) if day.commits > 0 => {
                    view.notes.push(format!(
                        "{}: {} change(s)",
                        ctx.format_date(day.date),
                        day.commits
                    ));
                    view.notes.extend(
                        day.files
                            .iter()
                            .map(|f| format!("  {} (+{})", f.path, f.changes)),
                    );
                }
                _ => view
                    .notes
                    .push(format!("{}: no activity", ctx.format_date(date))),
            }
        }
        Ok(view)
    }

    fn directory_for<'a>(&'a self, query: &'a PanelQuery) -> &'a str {
        query
            .props
            .directory_path
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(&self.directory)
    }
}

fn top_files(shown: &[&ActivityDay], bucket: &MonthBucket) -> Vec<String> {
    let mut per_path: BTreeMap<&str, u32> = BTreeMap::new();
    for day in shown
        .iter()
        .filter(|d| d.date.year() == bucket.year && d.date.month() == bucket.month)
    {
        for f in &day.files {
            *per_path.entry(f.path.as_str()).or_insert(0) += f.changes;
        }
    }
    let mut ranked: Vec<(&str, u32)> = per_path.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(5)
        .map(|(path, changes)| format!("{path} (+{changes})"))
        .collect()
}

impl Panel for ActivityPanel {
    fn kind(&self) -> PanelKind {
        PanelKind::Activity
    }

    fn window(&self, query: &PanelQuery, _ctx: &RenderContext) -> Option<TimeWindow> {
        Some(query.window.unwrap_or(TimeWindow::OneYear))
    }

    fn render(&self, query: &PanelQuery, ctx: &RenderContext) -> Result<PanelView> {
        let directory = self.directory_for(query);
        if directory == self.directory {
            self.render_days(&self.days, query, ctx)
        } else {
            self.render_days(&synthesize_year(directory, self.end), query, ctx)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn synthesis_is_deterministic_and_bounded() {
        let a = synthesize_year("/src", day(2025, 4, 10));
        let b = synthesize_year("/src", day(2025, 4, 10));
        assert_eq!(a, b);
        assert_eq!(a.first().map(|d| d.date), Some(day(2024, 4, 10)));
        assert_eq!(a.last().map(|d| d.date), Some(day(2025, 4, 10)));
        for d in &a {
            let weekend = matches!(d.date.weekday(), Weekday::Sat | Weekday::Sun);
            assert!(d.commits <= if weekend { 2 } else { 6 }, "{d:?}");
            assert_eq!(d.files.len() as u32, d.commits.min(5));
            assert!(d.files.iter().all(|f| f.path.starts_with("/src/") && (1..=50).contains(&f.changes)));
        }
    }

    #[test]
    fn intensity_levels() {
        assert_eq!(Intensity::of(0, 6), Intensity::None);
        assert_eq!(Intensity::of(1, 6), Intensity::Low);
        assert_eq!(Intensity::of(2, 6), Intensity::Medium);
        assert_eq!(Intensity::of(4, 6), Intensity::High);
        assert_eq!(Intensity::of(6, 6), Intensity::Peak);
        assert_eq!(Intensity::of(3, 0), Intensity::Peak);
    }

    #[test]
    fn month_rows_add_up_to_tiles() {
        let today = day(2025, 4, 10);
        let panel = ActivityPanel::seeded(today);
        let view = panel
            .render(&PanelQuery::default(), &RenderContext::at(today))
            .unwrap();
        assert_eq!(view.rows.len(), 13);
        let sum: u32 = view.rows.iter().map(|r| r.cells[1].text.parse::<u32>().unwrap()).sum();
        assert_eq!(view.tile("Changes"), Some(sum.to_string().as_str()));
    }

    #[test]
    fn one_month_window_and_grid() {
        let today = day(2025, 4, 10);
        let view = ActivityPanel::seeded(today)
            .render(
                &PanelQuery::default().window(TimeWindow::OneMonth),
                &RenderContext::at(today),
            )
            .unwrap();
        assert_eq!(view.row_ids(), vec!["2025-03", "2025-04"]);
        assert!(view.notes.iter().any(|n| n.starts_with("Sun ")));
    }

    #[test]
    fn directory_prop_regenerates_paths() {
        let today = day(2025, 4, 10);
        let mut q = PanelQuery::default().expand("2025-04");
        q.props.directory_path = Some("/lib/core".to_string());
        let view = ActivityPanel::seeded(today)
            .render(&q, &RenderContext::at(today))
            .unwrap();
        assert!(view.notes[0].ends_with("/lib/core"));
        let april = view.rows.iter().find(|r| r.id == "2025-04").unwrap();
        assert!(april.detail.iter().all(|l| l.starts_with("/lib/core/")));
    }

    #[test]
    fn focus_day_lists_files_or_reports_quiet_day() {
        let today = day(2025, 4, 10);
        let panel = ActivityPanel::seeded(today);
        let busy = panel.days.iter().find(|d| d.commits > 0).unwrap().date;
        let view = panel
            .render(&PanelQuery::default().focus(&busy.to_string()), &RenderContext::at(today))
            .unwrap();
        assert!(view.notes.iter().any(|n| n.contains("change(s)")));
        let err = panel
            .render(&PanelQuery::default().focus("yesterday"), &RenderContext::at(today))
            .unwrap_err();
        assert_eq!(err.code(), "C2S-2002");
    }

    #[test]
    fn collapse_closes_one_month_under_expand_all() {
        let today = day(2025, 4, 10);
        let mut q = PanelQuery::default().window(TimeWindow::OneMonth);
        q.expand_all = true;
        q.collapse.push("2025-03".to_string());
        let view = ActivityPanel::seeded(today)
            .render(&q, &RenderContext::at(today))
            .unwrap();
        let open: Vec<(&str, bool)> = view.rows.iter().map(|r| (r.id.as_str(), r.expanded)).collect();
        assert_eq!(open, vec![("2025-03", false), ("2025-04", true)]);
    }
}
