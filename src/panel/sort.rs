//! Column sort state and comparator.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Direction of a column sort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl SortDirection {
    /// The opposite direction.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    /// Arrow glyph shown next to the active column header.
    #[must_use]
    pub const fn arrow(self) -> char {
        match self {
            Self::Asc => '↑',
            Self::Desc => '↓',
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// A value a record exposes for sorting on one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortValue<'a> {
    /// Compared case-insensitively, then by exact text.
    Text(&'a str),
    /// Compared numerically; NaN sorts after every number.
    Number(f64),
}

/// Active sort column plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortState<F> {
    /// Column being sorted.
    pub field: F,
    /// Current direction.
    pub direction: SortDirection,
}

impl<F: Copy + PartialEq> SortState<F> {
    /// Ascending sort on `field`.
    #[must_use]
    pub const fn ascending(field: F) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }

    /// Column-header click: the same field flips direction, a new field
    /// starts ascending.
    pub fn click(&mut self, field: F) {
        if self.field == field {
            self.direction = self.direction.flip();
        } else {
            self.field = field;
            self.direction = SortDirection::Asc;
        }
    }

    /// Replay a sequence of header clicks from an unsorted state.
    #[must_use]
    pub fn from_clicks(clicks: &[F]) -> Option<Self> {
        let (first, rest) = clicks.split_first()?;
        let mut state = Self::ascending(*first);
        for field in rest {
            state.click(*field);
        }
        Some(state)
    }
}

/// Click handler for an optional sort: the first click sorts ascending.
pub fn click_optional<F: Copy + PartialEq>(sort: &mut Option<SortState<F>>, field: F) {
    match sort {
        Some(state) => state.click(field),
        None => *sort = Some(SortState::ascending(field)),
    }
}

/// Case-folded comparison with a byte-order tiebreak, so "alpha" and "Alpha"
/// sit together but still order deterministically.
#[must_use]
pub fn compare_text(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

/// Compare two sort values. Mismatched kinds compare equal, leaving the
/// stable sort to keep their source order.
#[must_use]
pub fn compare_values(a: SortValue<'_>, b: SortValue<'_>) -> Ordering {
    match (a, b) {
        (SortValue::Text(x), SortValue::Text(y)) => compare_text(x, y),
        (SortValue::Number(x), SortValue::Number(y)) => match (x.is_nan(), y.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        },
        _ => Ordering::Equal,
    }
}

/// Sort `rows` in place by `state`, using `value` to pull the sort key.
/// The sort is stable.
pub fn sort_by_state<T, F, V>(rows: &mut [T], state: SortState<F>, value: V)
where
    F: Copy,
    V: for<'r> Fn(&'r T, F) -> SortValue<'r>,
{
    rows.sort_by(|a, b| {
        state
            .direction
            .apply(compare_values(value(a, state.field), value(b, state.field)))
    });
}
