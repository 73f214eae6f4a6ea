//! Time-range windowing for date-stamped series.
//!
//! A window keeps the points dated on or after `anchor - window`. The anchor is
//! today's wall-clock date unless the configuration asks for the newest sample
//! in the series, which keeps fixed sample data visible as real time advances.

#![allow(missing_docs)]

use std::fmt;
use std::str::FromStr;

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::core::errors::DashError;

/// Selectable look-back window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeWindow {
    #[serde(rename = "1m")]
    OneMonth,
    #[default]
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "all")]
    All,
}

impl TimeWindow {
    /// Every window in menu order.
    pub const ALL: [Self; 5] = [
        Self::OneMonth,
        Self::ThreeMonths,
        Self::SixMonths,
        Self::OneYear,
        Self::All,
    ];

    /// Short token used on the command line and in config files.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::OneMonth => "1m",
            Self::ThreeMonths => "3m",
            Self::SixMonths => "6m",
            Self::OneYear => "1y",
            Self::All => "all",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OneMonth => "Last month",
            Self::ThreeMonths => "Last 3 months",
            Self::SixMonths => "Last 6 months",
            Self::OneYear => "Last year",
            Self::All => "All time",
        }
    }

    /// Calendar months covered, `None` for an unbounded window.
    #[must_use]
    pub const fn months(self) -> Option<u32> {
        match self {
            Self::OneMonth => Some(1),
            Self::ThreeMonths => Some(3),
            Self::SixMonths => Some(6),
            Self::OneYear => Some(12),
            Self::All => None,
        }
    }

    /// Next window in menu order, wrapping.
    #[must_use]
    pub const fn cycle(self) -> Self {
        match self {
            Self::OneMonth => Self::ThreeMonths,
            Self::ThreeMonths => Self::SixMonths,
            Self::SixMonths => Self::OneYear,
            Self::OneYear => Self::All,
            Self::All => Self::OneMonth,
        }
    }

    /// First date inside the window for a given anchor. Month subtraction
    /// clamps to the end of shorter months (May 31 minus 3 months is Feb 28).
    #[must_use]
    pub fn cutoff(self, anchor: NaiveDate) -> Option<NaiveDate> {
        let months = self.months()?;
        Some(
            anchor
                .checked_sub_months(Months::new(months))
                .unwrap_or(NaiveDate::MIN),
        )
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for TimeWindow {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1m" | "month" => Ok(Self::OneMonth),
            "3m" | "quarter" => Ok(Self::ThreeMonths),
            "6m" => Ok(Self::SixMonths),
            "1y" | "12m" | "year" => Ok(Self::OneYear),
            "all" => Ok(Self::All),
            _ => Err(DashError::InvalidWindow {
                value: s.to_string(),
            }),
        }
    }
}

/// What "now" means when computing a cutoff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowAnchor {
    /// Today's date from the system clock.
    #[default]
    WallClock,
    /// The newest date present in the series being windowed.
    LatestSample,
}

impl FromStr for WindowAnchor {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wall_clock" | "wall-clock" | "now" => Ok(Self::WallClock),
            "latest_sample" | "latest-sample" | "latest" => Ok(Self::LatestSample),
            _ => Err(DashError::InvalidConfig {
                details: format!("unknown window anchor {s:?}"),
            }),
        }
    }
}

/// Anything carrying a calendar day.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

/// Resolve the anchor date for a series. An empty series under
/// `LatestSample` falls back to `today`.
#[must_use]
pub fn resolve_anchor<T: Dated>(anchor: WindowAnchor, today: NaiveDate, series: &[T]) -> NaiveDate {
    match anchor {
        WindowAnchor::WallClock => today,
        WindowAnchor::LatestSample => series.iter().map(Dated::date).max().unwrap_or(today),
    }
}

/// Points of `series` inside `window`, in their original order.
#[must_use]
pub fn apply_window<'a, T: Dated>(
    series: &'a [T],
    window: TimeWindow,
    anchor: WindowAnchor,
    today: NaiveDate,
) -> Vec<&'a T> {
    let anchor_date = resolve_anchor(anchor, today, series);
    match window.cutoff(anchor_date) {
        Some(cutoff) => series.iter().filter(|p| p.date() >= cutoff).collect(),
        None => series.iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Point(NaiveDate);

    impl Dated for Point {
        fn date(&self) -> NaiveDate {
            self.0
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series() -> Vec<Point> {
        vec![
            Point(day(2025, 1, 1)),
            Point(day(2025, 2, 1)),
            Point(day(2025, 3, 1)),
            Point(day(2025, 4, 1)),
        ]
    }

    #[test]
    fn parse_tokens_and_aliases() {
        assert_eq!("1m".parse::<TimeWindow>().unwrap(), TimeWindow::OneMonth);
        assert_eq!("3M".parse::<TimeWindow>().unwrap(), TimeWindow::ThreeMonths);
        assert_eq!("year".parse::<TimeWindow>().unwrap(), TimeWindow::OneYear);
        assert_eq!("all".parse::<TimeWindow>().unwrap(), TimeWindow::All);
        let err = "2w".parse::<TimeWindow>().unwrap_err();
        assert_eq!(err.code(), "C2S-2003");
    }

    #[test]
    fn cutoff_clamps_to_month_end() {
        assert_eq!(
            TimeWindow::ThreeMonths.cutoff(day(2025, 5, 31)),
            Some(day(2025, 2, 28))
        );
        assert_eq!(TimeWindow::All.cutoff(day(2025, 5, 31)), None);
    }

    #[test]
    fn wall_clock_anchor_can_empty_a_narrow_window() {
        let data = series();
        let kept = apply_window(
            &data,
            TimeWindow::OneMonth,
            WindowAnchor::WallClock,
            day(2026, 10, 19),
        );
        assert!(kept.is_empty());
    }

    #[test]
    fn latest_sample_anchor_keeps_recent_points() {
        let data = series();
        let kept = apply_window(
            &data,
            TimeWindow::OneMonth,
            WindowAnchor::LatestSample,
            day(2026, 10, 19),
        );
        let dates: Vec<NaiveDate> = kept.iter().map(|p| p.date()).collect();
        assert_eq!(dates, vec![day(2025, 3, 1), day(2025, 4, 1)]);
    }

    #[test]
    fn cutoff_is_inclusive() {
        let data = series();
        let kept = apply_window(
            &data,
            TimeWindow::ThreeMonths,
            WindowAnchor::WallClock,
            day(2025, 4, 1),
        );
        assert_eq!(kept.len(), 4);
    }

    #[test]
    fn all_window_keeps_everything_in_order() {
        let data = series();
        let kept = apply_window(&data, TimeWindow::All, WindowAnchor::WallClock, day(2030, 1, 1));
        assert_eq!(kept.len(), data.len());
        assert_eq!(kept[0].date(), day(2025, 1, 1));
    }

    #[test]
    fn cycle_visits_every_window() {
        let mut seen = vec![TimeWindow::OneMonth];
        let mut w = TimeWindow::OneMonth.cycle();
        while w != TimeWindow::OneMonth {
            seen.push(w);
            w = w.cycle();
        }
        assert_eq!(seen, TimeWindow::ALL.to_vec());
    }
}
