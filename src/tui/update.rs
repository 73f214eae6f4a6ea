//! Pure update function for the dashboard.
//!
//! `update()` takes the current model and a message, mutates the model, and
//! returns a command describing any side-effects the runtime should execute.
//! This module performs no I/O.

#![allow(missing_docs)]

use crate::panel::action::{ActionKind, ActionRequest, ActionSlot};
use crate::panels::report::{ReportPanel, ScheduleRequest};
use crate::panels::{PanelKind, PanelQuery, Row};

use super::input::{InputAction, InputContext, InputMode, resolve_key};
use super::model::{DashboardCmd, DashboardModel, DashboardMsg, NotificationLevel};

/// Apply a message to the model and return the next command for the runtime.
pub fn update(model: &mut DashboardModel, msg: DashboardMsg) -> DashboardCmd {
    match msg {
        DashboardMsg::Tick => {
            model.tick = model.tick.wrapping_add(1);
            model.expire_notifications();
            DashboardCmd::ScheduleTick(model.refresh)
        }
        DashboardMsg::Key(key) => {
            let context = InputContext {
                mode: model.mode,
                help_open: model.help_open,
            };
            resolve_key(key, context).map_or(DashboardCmd::None, |action| {
                apply_input_action(model, action)
            })
        }
        DashboardMsg::Resize { cols, rows } => {
            model.terminal_size = (cols, rows);
            DashboardCmd::None
        }
        DashboardMsg::ActionCompleted(completion) => {
            let Ok(panel) = completion.request.panel.parse::<PanelKind>() else {
                return DashboardCmd::None;
            };
            let kind = completion.request.kind;
            let ticket = completion.ticket;
            let message = match &completion.result {
                Ok(outcome) => (NotificationLevel::Info, outcome.message.clone()),
                Err(error) => (
                    NotificationLevel::Error,
                    format!("{} failed: {error}", kind.label()),
                ),
            };
            if !model.action_mut(panel, kind).complete(ticket, completion.result) {
                return DashboardCmd::DiscardStale {
                    panel,
                    kind,
                    ticket: ticket.0,
                };
            }
            model.notify(message.0, message.1);
            DashboardCmd::None
        }
    }
}

fn apply_input_action(model: &mut DashboardModel, action: InputAction) -> DashboardCmd {
    match action {
        InputAction::Quit => quit(model),
        InputAction::BackOrQuit => back_or_quit(model),
        InputAction::ToggleHelp => {
            model.help_open = !model.help_open;
            DashboardCmd::None
        }
        InputAction::CloseHelp => {
            model.help_open = false;
            DashboardCmd::None
        }
        InputAction::SelectPanel(kind) => {
            model.navigate_to(kind);
            DashboardCmd::None
        }
        InputAction::NextPanel => {
            model.navigate_to(model.panel.next());
            DashboardCmd::None
        }
        InputAction::PrevPanel => {
            model.navigate_to(model.panel.prev());
            DashboardCmd::None
        }
        InputAction::CursorUp
        | InputAction::CursorDown
        | InputAction::CursorTop
        | InputAction::CursorBottom
        | InputAction::PageUp
        | InputAction::PageDown => {
            move_cursor(model, action);
            DashboardCmd::None
        }
        InputAction::Activate => activate(model),
        InputAction::BeginSearch => {
            model.mode = InputMode::Search;
            DashboardCmd::None
        }
        InputAction::SearchInput(c) => edit_query_reset(model, |q| q.search.push(c)),
        InputAction::SearchBackspace => edit_query_reset(model, |q| {
            q.search.pop();
        }),
        InputAction::SearchCommit => {
            model.mode = InputMode::Normal;
            DashboardCmd::None
        }
        InputAction::SearchCancel => {
            model.mode = InputMode::Normal;
            edit_query_reset(model, |q| q.search.clear())
        }
        InputAction::CycleCategory => cycle_facet(model, true),
        InputAction::CycleStatus => cycle_facet(model, false),
        InputAction::NextSort => cycle_sort(model, false),
        InputAction::ReverseSort => cycle_sort(model, true),
        InputAction::CycleWindow => cycle_window(model),
        InputAction::CycleTab => cycle_tab(model),
        InputAction::ToggleFullPage => edit_query(model, |q| q.props.full_page = !q.props.full_page),
        InputAction::ToggleSecrets => edit_query(model, |q| q.reveal_secrets = !q.reveal_secrets),
        InputAction::ToggleExpandAll => edit_query(model, |q| {
            q.expand_all = !q.expand_all;
            q.collapse.clear();
            if !q.expand_all {
                q.expand.clear();
            }
        }),
        InputAction::RunAction(index) => run_action(model, index),
        InputAction::Refresh => {
            match model.panel.actions().iter().position(|k| *k == ActionKind::Refresh) {
                Some(index) => run_action(model, index),
                None => DashboardCmd::None,
            }
        }
        InputAction::CancelActions => cancel_actions(model),
        InputAction::ToggleEdit => toggle_edit(model),
    }
}

fn quit(model: &mut DashboardModel) -> DashboardCmd {
    model.quit = true;
    DashboardCmd::Quit
}

/// Esc peels state off one layer at a time: help, search, focus, then quit.
fn back_or_quit(model: &mut DashboardModel) -> DashboardCmd {
    if model.help_open {
        model.help_open = false;
        return DashboardCmd::None;
    }
    let query = &model.current().query;
    if !query.search.is_empty() {
        return edit_query_reset(model, |q| q.search.clear());
    }
    if query.focus.is_some() {
        return edit_query(model, |q| q.focus = None);
    }
    quit(model)
}

// ──────────────────── query edits ────────────────────

/// Apply `edit` to the active panel's query. A query the panel rejects is
/// rolled back and reported.
fn edit_query(model: &mut DashboardModel, edit: impl FnOnce(&mut PanelQuery)) -> DashboardCmd {
    let before = model.current().query.clone();
    edit(&mut model.current_mut().query);
    match model.view() {
        Ok(view) => {
            let state = model.current_mut();
            state.cursor = state.cursor.min(view.rows.len().saturating_sub(1));
        }
        Err(err) => {
            model.current_mut().query = before;
            model.notify(NotificationLevel::Error, err.to_string());
        }
    }
    DashboardCmd::None
}

/// Like [`edit_query`], but the selection goes back to the first row.
fn edit_query_reset(model: &mut DashboardModel, edit: impl FnOnce(&mut PanelQuery)) -> DashboardCmd {
    model.current_mut().cursor = 0;
    edit_query(model, edit)
}

fn cycle_facet(model: &mut DashboardModel, category: bool) -> DashboardCmd {
    let (categories, statuses) = model.workspace.panel(model.panel).facets();
    let options = if category { categories } else { statuses };
    if options.is_empty() {
        let axis = if category { "category" } else { "status" };
        model.notify(
            NotificationLevel::Info,
            format!("{} has no {axis} filter", model.panel.title()),
        );
        return DashboardCmd::None;
    }
    edit_query_reset(model, |q| {
        let facet = if category { &mut q.category } else { &mut q.status };
        *facet = facet.cycle(options);
    })
}

/// `o` moves to the next sortable column; `O` clicks the current one again,
/// which reverses it.
fn cycle_sort(model: &mut DashboardModel, reverse: bool) -> DashboardCmd {
    let fields = model.workspace.panel(model.panel).sort_fields();
    if fields.is_empty() {
        model.notify(
            NotificationLevel::Info,
            format!("{} has a fixed order", model.panel.title()),
        );
        return DashboardCmd::None;
    }
    let column = match (model.current().sort_column, reverse) {
        (Some(c), true) => c,
        (Some(c), false) => (c + 1) % fields.len(),
        (None, _) => 0,
    };
    let Some(field) = fields.get(column).copied() else {
        return DashboardCmd::None;
    };
    model.current_mut().sort_column = Some(column);
    edit_query(model, |q| q.click_sort(field))
}

fn cycle_window(model: &mut DashboardModel) -> DashboardCmd {
    let window = model
        .workspace
        .panel(model.panel)
        .window(&model.current().query, &model.ctx);
    match window {
        Some(window) => edit_query(model, |q| q.window = Some(window.cycle())),
        None => {
            model.notify(
                NotificationLevel::Info,
                format!("{} has no time window", model.panel.title()),
            );
            DashboardCmd::None
        }
    }
}

fn cycle_tab(model: &mut DashboardModel) -> DashboardCmd {
    let tabs = model.workspace.panel(model.panel).tabs();
    if tabs.is_empty() {
        return DashboardCmd::None;
    }
    let current = model
        .current()
        .query
        .tab
        .as_deref()
        .and_then(|t| tabs.iter().position(|known| *known == t))
        .unwrap_or(0);
    let next = tabs[(current + 1) % tabs.len()];
    edit_query_reset(model, |q| q.tab = Some(next.to_string()))
}

// ──────────────────── rows ────────────────────

fn move_cursor(model: &mut DashboardModel, action: InputAction) {
    let rows = model.view().map_or(0, |v| v.rows.len());
    let page = model.body_height();
    let last = rows.saturating_sub(1);
    let state = model.current_mut();
    state.cursor = match action {
        InputAction::CursorUp => state.cursor.saturating_sub(1),
        InputAction::CursorDown => (state.cursor + 1).min(last),
        InputAction::CursorTop => 0,
        InputAction::CursorBottom => last,
        InputAction::PageUp => state.cursor.saturating_sub(page),
        InputAction::PageDown => (state.cursor + page).min(last),
        _ => state.cursor,
    };
}

fn selected_row(model: &DashboardModel) -> Option<Row> {
    let view = model.view().ok()?;
    view.rows.get(model.current().cursor).cloned()
}

/// Flip one row against the panel's default expansion.
fn toggle_row(query: &mut PanelQuery, id: &str, expanded: bool) {
    query.expand.retain(|e| e != id);
    query.collapse.retain(|c| c != id);
    if expanded {
        query.collapse.push(id.to_string());
    } else {
        query.expand.push(id.to_string());
    }
}

fn activate(model: &mut DashboardModel) -> DashboardCmd {
    let Some(row) = selected_row(model) else {
        return DashboardCmd::None;
    };
    match model.panel {
        PanelKind::CodeGraph => edit_query(model, |q| {
            q.focus = if q.focus.as_deref() == Some(row.id.as_str()) {
                None
            } else {
                Some(row.id.clone())
            };
        }),
        PanelKind::Files if !row.expandable => edit_query(model, |q| {
            q.props.file_path = None;
            q.focus = Some(row.id.clone());
        }),
        PanelKind::Reports => edit_query(model, |q| {
            if let Some(i) = q.expand.iter().position(|e| *e == row.id) {
                q.expand.remove(i);
            } else {
                q.expand.push(row.id.clone());
            }
        }),
        _ if row.expandable => edit_query(model, |q| toggle_row(q, &row.id, row.expanded)),
        _ => DashboardCmd::None,
    }
}

fn toggle_edit(model: &mut DashboardModel) -> DashboardCmd {
    if model.panel != PanelKind::Rules {
        return DashboardCmd::None;
    }
    let Some(row) = selected_row(model) else {
        return DashboardCmd::None;
    };
    match model.workspace.rules.toggle_edit(&row.id) {
        Ok(true) => model.notify(NotificationLevel::Info, format!("Editing {}", row.id)),
        Ok(false) => model.notify(NotificationLevel::Info, format!("Saved {}", row.id)),
        Err(err) => model.notify(NotificationLevel::Error, err.to_string()),
    };
    DashboardCmd::None
}

// ──────────────────── actions ────────────────────

fn run_action(model: &mut DashboardModel, index: usize) -> DashboardCmd {
    let panel = model.panel;
    let Some(kind) = panel.actions().get(index).copied() else {
        return DashboardCmd::None;
    };
    if model.action(panel, kind).is_some_and(ActionSlot::is_busy) {
        model.notify(NotificationLevel::Info, kind.busy_label());
        return DashboardCmd::None;
    }
    match action_payload(model, kind) {
        Ok(payload) => DashboardCmd::StartAction {
            panel,
            request: ActionRequest::new(panel.token(), kind, payload),
        },
        Err(cmd) => cmd,
    }
}

/// Report actions submit their validated form; every other action sends the
/// panel's query.
fn action_payload(
    model: &mut DashboardModel,
    kind: ActionKind,
) -> std::result::Result<serde_json::Value, DashboardCmd> {
    let query = &model.current().query;
    if !matches!(kind, ActionKind::GenerateReport | ActionKind::ScheduleReport) {
        return Ok(query.to_payload());
    }
    let report = match ReportPanel::request_for(query) {
        Ok(report) => report,
        Err(err) => {
            model.notify(NotificationLevel::Error, err.to_string());
            return Err(DashboardCmd::None);
        }
    };
    let (form, validated) = if kind == ActionKind::ScheduleReport {
        let schedule = ScheduleRequest {
            report,
            ..ScheduleRequest::default()
        };
        ("schedule", schedule.validate().map(serde_json::to_value))
    } else {
        ("report", report.validate().map(serde_json::to_value))
    };
    match validated {
        Ok(value) => Ok(value.unwrap_or(serde_json::Value::Null)),
        Err(errors) => {
            model.notify(NotificationLevel::Warning, format!("{}: {errors}", kind.label()));
            Err(DashboardCmd::ValidationFailed {
                form,
                messages: errors.len(),
            })
        }
    }
}

fn cancel_actions(model: &mut DashboardModel) -> DashboardCmd {
    let panel = model.panel;
    let cmds: Vec<DashboardCmd> = panel
        .actions()
        .iter()
        .filter(|kind| model.action(panel, **kind).is_some_and(ActionSlot::is_busy))
        .map(|kind| DashboardCmd::CancelAction { panel, kind: *kind })
        .collect();
    if cmds.is_empty() {
        DashboardCmd::None
    } else {
        DashboardCmd::Batch(cmds)
    }
}
