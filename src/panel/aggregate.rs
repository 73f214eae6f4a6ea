//! Roll-up statistics for summary tiles.
//!
//! Summaries are always computed over the full source collection, never the
//! filtered view, so tiles stay put while the list below them is filtered.

#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Lower bound (inclusive) of the "good" coverage band.
pub const GOOD_COVERAGE: u8 = 80;
/// Lower bound (inclusive) of the "partial" coverage band.
pub const PARTIAL_COVERAGE: u8 = 50;

/// Three-way banding of a 0–100 coverage percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageBand {
    /// `>= 80`.
    Good,
    /// `50..=79`.
    Partial,
    /// `< 50`.
    Missing,
}

impl CoverageBand {
    /// Band for a coverage percentage.
    #[must_use]
    pub const fn of(coverage: u8) -> Self {
        if coverage >= GOOD_COVERAGE {
            Self::Good
        } else if coverage >= PARTIAL_COVERAGE {
            Self::Partial
        } else {
            Self::Missing
        }
    }
}

/// Count records per key. Keys come back sorted.
pub fn count_by<'a, T: 'a, K: Ord>(
    items: impl IntoIterator<Item = &'a T>,
    key: impl Fn(&T) -> K,
) -> BTreeMap<K, usize> {
    let mut counts = BTreeMap::new();
    for item in items {
        *counts.entry(key(item)).or_insert(0) += 1;
    }
    counts
}

/// Round half away from zero, matching a UI's `Math.round` for the
/// non-negative values summaries produce.
#[must_use]
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// `(implemented + 0.5 × partial) / total × 100`, rounded to the nearest
/// integer. An empty total yields 0.
#[must_use]
pub fn weighted_coverage(implemented: usize, partial: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let score = (implemented as f64 + partial as f64 * 0.5) / total as f64 * 100.0;
    round_half_up(score).clamp(0, 100) as u8
}

/// Arithmetic mean rounded to the nearest integer; `None` for no values.
pub fn rounded_mean(values: impl IntoIterator<Item = f64>) -> Option<i64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| round_half_up(sum / n as f64))
}

/// Percentage of `part` in `whole`, rounded; 0 when `whole` is 0.
#[must_use]
pub fn percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    round_half_up(part as f64 / whole as f64 * 100.0).clamp(0, 100) as u8
}
