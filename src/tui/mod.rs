//! Interactive dashboard: Elm-style model, pure update and render, and a
//! crossterm runtime that ties them to the terminal.
//!
//! `input`, `model`, `update`, `render` and `theme` are terminal-free and are
//! also used by one-shot CLI output; `runtime` and `terminal_guard` need the
//! `cli` feature.

#![allow(missing_docs)]

pub mod input;
pub mod model;
pub mod render;
#[cfg(feature = "cli")]
pub mod runtime;
#[cfg(feature = "cli")]
pub mod terminal_guard;
pub mod theme;
pub mod update;

#[cfg(test)]
mod test_properties;

#[cfg(feature = "cli")]
pub use runtime::{DashboardRuntimeConfig, run_dashboard};
