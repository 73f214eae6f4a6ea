//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use c2s_dashboard::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{DashError, Result};

// Logging
pub use crate::logger::ActivityLog;
pub use crate::logger::jsonl::{EventType, LogEntry, Severity};

// Pipeline
pub use crate::panel::action::{
    ActionKind, ActionOutcome, ActionRequest, ActionRunner, ActionSlot, ActionState,
    Collaborator, StubCollaborator, Ticket,
};
pub use crate::panel::form::{FieldError, ValidationErrors};
pub use crate::panel::query::Facet;
pub use crate::panel::sort::SortDirection;
pub use crate::panel::window::{TimeWindow, WindowAnchor};

// Panels
pub use crate::panels::report::{ReportRequest, ScheduleRequest};
pub use crate::panels::{Panel, PanelKind, PanelQuery, PanelView, RenderContext, Row, Workspace};
