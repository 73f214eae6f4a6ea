//! Per-record expand/collapse membership.
//!
//! Every panel uses multi-expand semantics: toggling one record never changes
//! the state of another.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Set of expanded record ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpandSet {
    ids: BTreeSet<String>,
}

impl ExpandSet {
    /// Empty set: everything collapsed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A set with every given id expanded.
    pub fn with_expanded<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Flip one id. Returns the new state for that id.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    pub fn expand(&mut self, id: &str) {
        self.ids.insert(id.to_string());
    }

    pub fn collapse(&mut self, id: &str) {
        self.ids.remove(id);
    }

    /// Expand every id yielded by `ids`.
    pub fn expand_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        self.ids.extend(ids.into_iter().map(str::to_string));
    }

    pub fn collapse_all(&mut self) {
        self.ids.clear();
    }

    #[must_use]
    pub fn is_expanded(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Expanded ids in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}
