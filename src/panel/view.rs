//! View state and the derived view: filter → sort → page.
//!
//! **Design invariant:** `derive_view` is a pure function of the source slice and
//! the view state. Nothing is cached between calls.

use serde::{Deserialize, Serialize};

use super::expand::ExpandSet;
use super::query::{FilterState, Record};
use super::sort::{SortState, click_optional, sort_by_state};

/// Slice of the derived rows to show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Rows skipped from the top.
    pub offset: usize,
    /// Maximum rows shown; `None` shows the rest.
    pub limit: Option<usize>,
}

impl Page {
    /// Everything, unpaged.
    pub const ALL: Self = Self {
        offset: 0,
        limit: None,
    };

    /// First `n` rows.
    #[must_use]
    pub const fn first(n: usize) -> Self {
        Self {
            offset: 0,
            limit: Some(n),
        }
    }

    /// Card view shows the first `card_rows`; full-page view shows everything.
    #[must_use]
    pub const fn for_layout(full_page: bool, card_rows: usize) -> Self {
        if full_page {
            Self::ALL
        } else {
            Self::first(card_rows)
        }
    }

    fn apply<T>(self, rows: Vec<T>) -> Vec<T> {
        let iter = rows.into_iter().skip(self.offset);
        match self.limit {
            Some(n) => iter.take(n).collect(),
            None => iter.collect(),
        }
    }
}

/// Full local state of one panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState<F> {
    pub filter: FilterState,
    pub sort: Option<SortState<F>>,
    pub page: Page,
    pub expanded: ExpandSet,
    /// Selected tab, for panels that have tabs.
    pub tab: Option<String>,
}

impl<F> Default for ViewState<F> {
    fn default() -> Self {
        Self {
            filter: FilterState::default(),
            sort: None,
            page: Page::ALL,
            expanded: ExpandSet::default(),
            tab: None,
        }
    }
}

impl<F: Copy + PartialEq> ViewState<F> {
    /// Column-header click.
    pub fn click_sort(&mut self, field: F) {
        click_optional(&mut self.sort, field);
    }
}

/// Rows currently shown, plus the counts a footer needs.
#[derive(Debug, Clone)]
pub struct DerivedView<'a, R> {
    /// Filtered, sorted, paged rows.
    pub rows: Vec<&'a R>,
    /// Rows that passed the filter before paging.
    pub matched: usize,
    /// Size of the source collection.
    pub total: usize,
}

impl<R> DerivedView<'_, R> {
    /// Rows hidden by paging.
    #[must_use]
    pub fn hidden_by_page(&self) -> usize {
        self.matched.saturating_sub(self.rows.len())
    }
}

/// Compute the derived view of `source` under `state`.
pub fn derive_view<'a, R: Record>(source: &'a [R], state: &ViewState<R::Field>) -> DerivedView<'a, R> {
    let mut rows: Vec<&R> = source.iter().filter(|r| state.filter.matches(*r)).collect();
    if let Some(sort) = state.sort {
        sort_by_state(&mut rows, sort, |r, field| r.sort_value(field));
    }
    let matched = rows.len();
    DerivedView {
        rows: state.page.apply(rows),
        matched,
        total: source.len(),
    }
}
