//! Generic panel pipeline: records are filtered, sorted and paged into a
//! derived view, with summaries computed over the untouched source.
//!
//! ```text
//! DataSource ──► ViewState ──► DerivedView ──► Presentation
//!  (static)      (filters,      (pure fn)       (badges,
//!                 sort, page,                    rows)
//!                 expand, tab)
//! ```

pub mod action;
pub mod aggregate;
pub mod badge;
pub mod expand;
pub mod form;
pub mod graph;
pub mod query;
pub mod sort;
pub mod tree;
pub mod view;
pub mod window;
