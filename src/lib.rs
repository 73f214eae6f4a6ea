#![forbid(unsafe_code)]

//! c2s: terminal dashboard for code-to-specification analysis.
//!
//! Twelve panels over a seeded sample project: requirement traceability,
//! capability coverage, security findings, configuration, accuracy trends,
//! file activity, architectural rules, the module graph, the file explorer,
//! the report builder, temporal quality metrics and the historical
//! comparison. Each panel derives a filtered, sorted and paged view from
//! an immutable source; summaries always cover the whole source.
//!
//! Panel actions (refresh, export, report generation) run on a background
//! worker and come back as ticketed completions, so a cancelled or superseded
//! request can never overwrite newer state.
//!
//! # Library usage
//!
//! ```rust,no_run
//! use c2s_dashboard::prelude::*;
//!
//! let today = chrono::Local::now().date_naive();
//! let workspace = Workspace::seeded(today);
//! let query = PanelQuery::default().search("auth").status("partial");
//! let view = workspace.render(PanelKind::Traceability, &query, &RenderContext::at(today))?;
//! println!("{} of {} requirements", view.matched, view.total);
//! # Ok::<(), DashError>(())
//! ```

pub mod prelude;

pub mod core;
pub mod logger;
pub mod panel;
pub mod panels;
pub mod tui;
