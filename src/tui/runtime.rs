//! Event loop for the interactive dashboard.
//!
//! Polls crossterm for keys, feeds them through [`update`], executes the
//! returned commands against the action runner, and paints each frame.

#![allow(missing_docs)]

use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::cursor::MoveTo;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::queue;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};

use crate::logger::ActivityLog;
use crate::logger::jsonl::{EventType, LogEntry, Severity};
use crate::panel::action::{ActionCompletion, ActionRunner, completion_entry};
use crate::panels::{PanelKind, RenderContext, Workspace};

use super::input::Key;
use super::model::{DashboardCmd, DashboardModel, DashboardMsg, NotificationLevel};
use super::render::{Line, frame};
use super::terminal_guard::TerminalGuard;
use super::theme::{AccessibilityProfile, Theme};
use super::update::update;

/// Longest wait for input before checking action results and ticks.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct DashboardRuntimeConfig {
    pub start: PanelKind,
    pub refresh: Duration,
    pub full_page: bool,
    pub no_color: bool,
}

/// Run the dashboard until the user quits.
///
/// # Errors
/// Returns I/O errors from the terminal.
pub fn run_dashboard(
    config: &DashboardRuntimeConfig,
    workspace: Workspace,
    ctx: RenderContext,
    runner: &ActionRunner,
    log: &ActivityLog,
) -> io::Result<()> {
    let theme = Theme::new(AccessibilityProfile::from_environment(config.no_color));
    let mut model = DashboardModel::new(workspace, ctx, config.start, config.refresh);
    model.set_full_page(config.full_page);
    model.terminal_size = TerminalGuard::terminal_size();

    let _guard = TerminalGuard::new()?;
    let mut stdout = io::stdout();
    let mut next_tick = Instant::now() + config.refresh;
    let mut shown_panel = None;

    loop {
        paint(&mut stdout, &frame(&model), theme)?;
        if shown_panel != Some(model.panel) {
            shown_panel = Some(model.panel);
            if let Ok(view) = model.view() {
                log.panel_rendered(model.panel.token(), view.rows.len(), view.total);
            }
        }

        let wait = next_tick
            .saturating_duration_since(Instant::now())
            .min(POLL_INTERVAL);
        if event::poll(wait)? {
            let msg = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => map_key(key).map(DashboardMsg::Key),
                Event::Resize(cols, rows) => Some(DashboardMsg::Resize { cols, rows }),
                _ => None,
            };
            if let Some(msg) = msg {
                let cmd = update(&mut model, msg);
                execute_cmd(&mut model, cmd, runner, log);
            }
        }

        while let Some(completion) = runner.try_recv() {
            deliver_completion(&mut model, completion, runner, log);
        }

        if Instant::now() >= next_tick {
            let cmd = update(&mut model, DashboardMsg::Tick);
            let delay = match cmd {
                DashboardCmd::ScheduleTick(delay) => delay,
                _ => config.refresh,
            };
            next_tick = Instant::now() + delay;
        }

        if model.quit {
            return Ok(());
        }
    }
}

/// Hand a finished action to the model. Its outcome reaches the activity
/// log only when the model accepted it.
pub fn deliver_completion(
    model: &mut DashboardModel,
    completion: ActionCompletion,
    runner: &ActionRunner,
    log: &ActivityLog,
) {
    let entry = completion_entry(&completion);
    let cmd = update(model, DashboardMsg::ActionCompleted(completion));
    if !matches!(cmd, DashboardCmd::DiscardStale { .. }) {
        log.record(&entry);
    }
    execute_cmd(model, cmd, runner, log);
}

/// Carry out one command. Nested batches run in order.
pub fn execute_cmd(
    model: &mut DashboardModel,
    cmd: DashboardCmd,
    runner: &ActionRunner,
    log: &ActivityLog,
) {
    match cmd {
        DashboardCmd::None | DashboardCmd::Quit | DashboardCmd::ScheduleTick(_) => {}
        DashboardCmd::StartAction { panel, request } => {
            let kind = request.kind;
            if let Err(err) = runner.start(model.action_mut(panel, kind), request) {
                model.notify(NotificationLevel::Error, err.to_string());
            }
        }
        DashboardCmd::CancelAction { panel, kind } => {
            runner.cancel(model.action_mut(panel, kind), panel.token(), kind);
        }
        DashboardCmd::DiscardStale {
            panel,
            kind,
            ticket,
        } => log.record(
            &LogEntry::new(EventType::ActionCancelled, Severity::Info)
                .panel(panel.token())
                .action(kind.token())
                .details(format!("stale result for ticket {ticket} discarded")),
        ),
        DashboardCmd::ValidationFailed { form, messages } => log.validation_failed(form, messages),
        DashboardCmd::Batch(cmds) => {
            for cmd in cmds {
                execute_cmd(model, cmd, runner, log);
            }
        }
    }
}

/// Terminal key event to dashboard key.
#[must_use]
pub fn map_key(event: KeyEvent) -> Option<Key> {
    let key = match event.code {
        KeyCode::Char(c) if event.modifiers.contains(KeyModifiers::CONTROL) => Key::Ctrl(c),
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Esc,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => Key::BackTab,
        _ => return None,
    };
    Some(key)
}

/// Palette color tag to a crossterm color.
#[must_use]
pub fn color_for(tag: &str) -> Color {
    match tag {
        "cyan" => Color::DarkCyan,
        "bright-cyan" => Color::Cyan,
        "green" => Color::DarkGreen,
        "bright-green" => Color::Green,
        "yellow" => Color::DarkYellow,
        "bright-yellow" => Color::Yellow,
        "red" => Color::DarkRed,
        "bright-red" => Color::Red,
        "magenta" => Color::DarkMagenta,
        "dark-grey" => Color::DarkGrey,
        "grey" => Color::Grey,
        "bright-white" => Color::White,
        _ => Color::Reset,
    }
}

/// Draw a full frame.
pub fn paint(out: &mut impl Write, lines: &[Line], theme: Theme) -> io::Result<()> {
    queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;
    for (row, line) in lines.iter().enumerate() {
        queue!(out, MoveTo(0, u16::try_from(row).unwrap_or(u16::MAX)))?;
        for span in &line.spans {
            if let Some(tag) = theme.color(span.tone) {
                queue!(out, SetForegroundColor(color_for(tag)))?;
            }
            if span.bold {
                queue!(out, SetAttribute(Attribute::Bold))?;
            }
            queue!(out, Print(&span.text), SetAttribute(Attribute::Reset), ResetColor)?;
        }
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::logger::jsonl::read_entries;
    use crate::panel::action::{ActionKind, ActionRequest, StubCollaborator};
    use crate::panel::badge::Tone;
    use crate::tui::render::Span;

    fn model() -> DashboardModel {
        let today = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
        DashboardModel::new(
            Workspace::seeded(today),
            RenderContext::at(today),
            PanelKind::Security,
            Duration::from_millis(100),
        )
    }

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn key_events_map_to_dashboard_keys() {
        assert_eq!(map_key(press(KeyCode::Char('q'), KeyModifiers::NONE)), Some(Key::Char('q')));
        assert_eq!(
            map_key(press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Key::Ctrl('c'))
        );
        assert_eq!(map_key(press(KeyCode::BackTab, KeyModifiers::SHIFT)), Some(Key::BackTab));
        assert_eq!(map_key(press(KeyCode::F(5), KeyModifiers::NONE)), None);
    }

    #[test]
    fn unknown_color_tags_reset() {
        assert_eq!(color_for("cyan"), Color::DarkCyan);
        assert_eq!(color_for("white"), Color::Reset);
    }

    #[test]
    fn paint_writes_span_text() {
        let mut line = Line::default();
        line.push(Span::new("Security", Tone::Accent).bold());
        line.push(Span::new(" ok", Tone::Success));
        let mut out = Vec::new();
        paint(&mut out, &[line], Theme::new(AccessibilityProfile::default())).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("Security"));
        assert!(text.contains(" ok"));
    }

    #[test]
    fn start_and_complete_through_runner() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");
        let log = ActivityLog::open(Some(path.clone()));
        let runner = ActionRunner::new(Arc::new(StubCollaborator::new(Duration::ZERO)), log.clone());
        let mut m = model();

        let request = ActionRequest::new("security", ActionKind::Export, serde_json::Value::Null);
        execute_cmd(
            &mut m,
            DashboardCmd::StartAction {
                panel: PanelKind::Security,
                request,
            },
            &runner,
            &log,
        );
        assert!(m.action(PanelKind::Security, ActionKind::Export).unwrap().is_busy());

        let completion = runner.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
        deliver_completion(&mut m, completion, &runner, &log);
        let slot = m.action(PanelKind::Security, ActionKind::Export).unwrap();
        assert_eq!(slot.state().label(), "success");

        let events: Vec<EventType> = read_entries(&path).unwrap().iter().map(|e| e.event).collect();
        assert!(events.contains(&EventType::ActionStarted));
        assert!(events.contains(&EventType::ActionCompleted));
    }

    #[test]
    fn cancel_then_stale_completion_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");
        let log = ActivityLog::open(Some(path.clone()));
        let runner = ActionRunner::new(
            Arc::new(StubCollaborator::new(Duration::from_millis(10))),
            log.clone(),
        );
        let mut m = model();
        let request = ActionRequest::new("security", ActionKind::Refresh, serde_json::Value::Null);
        execute_cmd(
            &mut m,
            DashboardCmd::Batch(vec![
                DashboardCmd::StartAction {
                    panel: PanelKind::Security,
                    request,
                },
                DashboardCmd::CancelAction {
                    panel: PanelKind::Security,
                    kind: ActionKind::Refresh,
                },
            ]),
            &runner,
            &log,
        );
        let completion = runner.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
        let cmd = update(&mut m, DashboardMsg::ActionCompleted(completion));
        assert!(matches!(cmd, DashboardCmd::DiscardStale { .. }));
        execute_cmd(&mut m, cmd, &runner, &log);

        let events: Vec<EventType> = read_entries(&path).unwrap().iter().map(|e| e.event).collect();
        let cancelled = events.iter().filter(|e| **e == EventType::ActionCancelled).count();
        assert_eq!(cancelled, 2);
        assert!(!events.contains(&EventType::ActionCompleted));
    }
}
