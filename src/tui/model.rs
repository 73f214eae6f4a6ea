//! Elm-style state model for the dashboard.
//!
//! All display state lives in [`DashboardModel`]. Input and action results
//! arrive as [`DashboardMsg`] values; side-effects are described by
//! [`DashboardCmd`] values returned from the update function. No I/O happens
//! here.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::time::Duration;

use crate::core::errors::Result;
use crate::panel::action::{ActionCompletion, ActionKind, ActionOutcome, ActionRequest, ActionSlot};
use crate::panels::{PanelKind, PanelQuery, PanelView, RenderContext, Workspace};

use super::input::{InputMode, Key};

// ──────────────────── per-panel state ────────────────────

/// Everything the dashboard remembers about one panel between visits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelState {
    pub query: PanelQuery,
    /// Selected row index in the rendered view.
    pub cursor: usize,
    /// Index into the panel's sort fields of the last column clicked.
    pub sort_column: Option<usize>,
}

// ──────────────────── notifications ────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// Toast shown in the footer until its tick passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
    pub expires_at_tick: u64,
}

/// Ticks a toast stays visible.
pub const NOTIFICATION_TICKS: u64 = 5;
const MAX_NOTIFICATIONS: usize = 3;

// ──────────────────── messages and commands ────────────────────

#[derive(Debug, Clone)]
pub enum DashboardMsg {
    Tick,
    Key(Key),
    Resize { cols: u16, rows: u16 },
    ActionCompleted(ActionCompletion),
}

/// Side-effects for the runtime to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardCmd {
    None,
    Quit,
    ScheduleTick(Duration),
    /// Hand a request to the action runner.
    StartAction { panel: PanelKind, request: ActionRequest },
    CancelAction { panel: PanelKind, kind: ActionKind },
    /// A completion arrived for a ticket that is no longer live.
    DiscardStale { panel: PanelKind, kind: ActionKind, ticket: u64 },
    ValidationFailed { form: &'static str, messages: usize },
    Batch(Vec<Self>),
}

// ──────────────────── model ────────────────────

/// Complete display state for the dashboard.
#[derive(Debug)]
pub struct DashboardModel {
    pub workspace: Workspace,
    pub ctx: RenderContext,
    pub panel: PanelKind,
    panels: Vec<PanelState>,
    actions: HashMap<(PanelKind, ActionKind), ActionSlot<ActionOutcome>>,
    pub mode: InputMode,
    pub help_open: bool,
    pub notifications: Vec<Notification>,
    next_notification_id: u64,
    pub terminal_size: (u16, u16),
    pub refresh: Duration,
    pub tick: u64,
    pub quit: bool,
}

fn slot_of(kind: PanelKind) -> usize {
    kind.number() - 1
}

impl DashboardModel {
    #[must_use]
    pub fn new(workspace: Workspace, ctx: RenderContext, start: PanelKind, refresh: Duration) -> Self {
        Self {
            workspace,
            ctx,
            panel: start,
            panels: vec![PanelState::default(); PanelKind::ALL.len()],
            actions: HashMap::new(),
            mode: InputMode::Normal,
            help_open: false,
            notifications: Vec::new(),
            next_notification_id: 1,
            terminal_size: (80, 24),
            refresh,
            tick: 0,
            quit: false,
        }
    }

    /// Start every panel in full-page layout.
    pub fn set_full_page(&mut self, full_page: bool) {
        for state in &mut self.panels {
            state.query.props.full_page = full_page;
        }
    }

    #[must_use]
    pub fn state(&self, kind: PanelKind) -> &PanelState {
        &self.panels[slot_of(kind)]
    }

    pub fn state_mut(&mut self, kind: PanelKind) -> &mut PanelState {
        &mut self.panels[slot_of(kind)]
    }

    #[must_use]
    pub fn current(&self) -> &PanelState {
        self.state(self.panel)
    }

    pub fn current_mut(&mut self) -> &mut PanelState {
        self.state_mut(self.panel)
    }

    /// Render the active panel with its stored query.
    pub fn view(&self) -> Result<PanelView> {
        self.workspace
            .render(self.panel, &self.current().query, &self.ctx)
    }

    #[must_use]
    pub fn action(&self, panel: PanelKind, kind: ActionKind) -> Option<&ActionSlot<ActionOutcome>> {
        self.actions.get(&(panel, kind))
    }

    pub fn action_mut(&mut self, panel: PanelKind, kind: ActionKind) -> &mut ActionSlot<ActionOutcome> {
        self.actions.entry((panel, kind)).or_default()
    }

    pub fn navigate_to(&mut self, panel: PanelKind) {
        self.panel = panel;
        self.mode = InputMode::Normal;
    }

    /// Push a toast, dropping the oldest beyond the visible limit.
    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) -> u64 {
        let id = self.next_notification_id;
        self.next_notification_id += 1;
        self.notifications.push(Notification {
            id,
            level,
            message: message.into(),
            expires_at_tick: self.tick + NOTIFICATION_TICKS,
        });
        while self.notifications.len() > MAX_NOTIFICATIONS {
            self.notifications.remove(0);
        }
        id
    }

    pub fn expire_notifications(&mut self) {
        let tick = self.tick;
        self.notifications.retain(|n| n.expires_at_tick > tick);
    }

    /// Rows of the body that fit on screen below the chrome.
    #[must_use]
    pub fn body_height(&self) -> usize {
        usize::from(self.terminal_size.1).saturating_sub(5).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn model() -> DashboardModel {
        let today = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
        DashboardModel::new(
            Workspace::seeded(today),
            RenderContext::at(today),
            PanelKind::Traceability,
            Duration::from_millis(500),
        )
    }

    #[test]
    fn panels_keep_separate_queries() {
        let mut m = model();
        m.current_mut().query.search = "auth".into();
        m.navigate_to(PanelKind::Security);
        assert!(m.current().query.search.is_empty());
        assert_eq!(m.state(PanelKind::Traceability).query.search, "auth");
    }

    #[test]
    fn notifications_cap_and_expire() {
        let mut m = model();
        for i in 0..5 {
            m.notify(NotificationLevel::Info, format!("n{i}"));
        }
        assert_eq!(m.notifications.len(), 3);
        assert_eq!(m.notifications[0].message, "n2");
        m.tick += NOTIFICATION_TICKS;
        m.expire_notifications();
        assert!(m.notifications.is_empty());
    }

    #[test]
    fn full_page_applies_to_every_panel() {
        let mut m = model();
        m.set_full_page(true);
        assert!(PanelKind::ALL.iter().all(|k| m.state(*k).query.props.full_page));
    }

    #[test]
    fn view_renders_the_active_panel() {
        let mut m = model();
        m.navigate_to(PanelKind::Files);
        assert_eq!(m.view().unwrap().panel, PanelKind::Files);
    }
}
