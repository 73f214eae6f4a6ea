//! Filter/search predicate shared by every list panel.
//!
//! A record is kept when it passes all three axes:
//! 1. **Text**: case-insensitive substring of any search field (empty matches)
//! 2. **Category**: exact match, or pass-through for [`Facet::All`]
//! 3. **Status**: same convention as category

use std::fmt;

use serde::{Deserialize, Serialize};

use super::sort::SortValue;

/// Selection on one categorical axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    /// The `"all"` pseudo-value: every record passes.
    #[default]
    All,
    /// Only records whose value equals this one pass.
    Only(String),
}

impl Facet {
    /// Parse a facet from user input. `""` and `"all"` mean pass-through.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Only(trimmed.to_string())
        }
    }

    /// Whether a record value passes this facet. Records without a value on
    /// this axis only pass [`Facet::All`].
    #[must_use]
    pub fn admits(&self, value: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => value == Some(wanted.as_str()),
        }
    }

    /// The selected value, if any.
    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Only(v) => Some(v),
        }
    }

    /// Step through `options` the way a dropdown would: all → first → … → last → all.
    #[must_use]
    pub fn cycle(&self, options: &[&str]) -> Self {
        let next = match self {
            Self::All => options.first(),
            Self::Only(current) => options
                .iter()
                .position(|o| o == current)
                .and_then(|i| options.get(i + 1)),
        };
        next.map_or(Self::All, |o| Self::Only((*o).to_string()))
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(v) => f.write_str(v),
        }
    }
}

/// A row type a panel can filter and sort.
pub trait Record {
    /// Sortable columns of this record.
    type Field: Copy + PartialEq + fmt::Debug;

    /// Id unique within the panel's collection.
    fn record_id(&self) -> &str;

    /// Fields the free-text search looks at.
    fn search_fields(&self) -> Vec<&str>;

    /// Fields that are only searchable once secrets are revealed.
    fn secret_fields(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Value on the category axis, if the panel has one.
    fn category(&self) -> Option<&str> {
        None
    }

    /// Value on the status axis, if the panel has one.
    fn status(&self) -> Option<&str> {
        None
    }

    /// Sort key for `field`.
    fn sort_value(&self, field: Self::Field) -> SortValue<'_>;
}

/// The filtering part of a panel's view state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    /// Free-text search.
    pub search: String,
    /// Category axis selection.
    pub category: Facet,
    /// Status axis selection.
    pub status: Facet,
    /// Include secret fields in text search.
    pub reveal_secrets: bool,
}

impl FilterState {
    /// Whether the state filters nothing out.
    #[must_use]
    pub fn is_pass_through(&self) -> bool {
        self.search.is_empty() && self.category == Facet::All && self.status == Facet::All
    }

    /// Predicate: AND across text, category, and status.
    pub fn matches<R: Record + ?Sized>(&self, record: &R) -> bool {
        self.category.admits(record.category())
            && self.status.admits(record.status())
            && self.matches_text(record)
    }

    fn matches_text<R: Record + ?Sized>(&self, record: &R) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        let hit = |field: &&str| field.to_lowercase().contains(&needle);
        record.search_fields().iter().any(hit)
            || (self.reveal_secrets && record.secret_fields().iter().any(hit))
    }
}

/// Case-insensitive substring test used by the tree and graph filters too.
#[must_use]
pub fn contains_folded(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}
