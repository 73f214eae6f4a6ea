//! Key routing for the dashboard.
//!
//! Keys are resolved with fixed precedence: the help overlay first, then the
//! search line, then global bindings. The terminal layer converts its own
//! events into [`Key`] so this module stays free of terminal types.

#![allow(missing_docs)]

use crate::panels::PanelKind;

/// Terminal-independent key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Ctrl(char),
    Enter,
    Esc,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Home,
    End,
    Tab,
    BackTab,
}

/// What the keyboard is currently driving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Normal,
    /// Typing into the panel's search box.
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputContext {
    pub mode: InputMode,
    pub help_open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Quit,
    /// Close, clear or quit, in that order of preference.
    BackOrQuit,
    ToggleHelp,
    CloseHelp,
    SelectPanel(PanelKind),
    NextPanel,
    PrevPanel,
    CursorUp,
    CursorDown,
    CursorTop,
    CursorBottom,
    PageUp,
    PageDown,
    /// Enter on the selected row: expand, select or toggle.
    Activate,
    BeginSearch,
    SearchInput(char),
    SearchBackspace,
    SearchCommit,
    SearchCancel,
    CycleCategory,
    CycleStatus,
    NextSort,
    ReverseSort,
    CycleWindow,
    CycleTab,
    ToggleFullPage,
    ToggleSecrets,
    ToggleExpandAll,
    /// Run the panel's n-th action.
    RunAction(usize),
    Refresh,
    CancelActions,
    ToggleEdit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelpBinding {
    pub keys: &'static str,
    pub description: &'static str,
}

const fn bind(keys: &'static str, description: &'static str) -> HelpBinding {
    HelpBinding { keys, description }
}

/// Every binding, in the order the help overlay lists them.
pub const HELP: &[HelpBinding] = &[
    bind("1-9 0", "Jump to panel"),
    bind("Tab ] / Shift-Tab [", "Next / previous panel"),
    bind("j k ↑ ↓", "Move selection"),
    bind("g G PgUp PgDn", "Top, bottom, page"),
    bind("Enter Space", "Expand row, select node or file, toggle section"),
    bind("/", "Search (Enter keeps, Esc clears)"),
    bind("c s", "Cycle category / status filter"),
    bind("o O", "Sort by next column / reverse"),
    bind("w", "Cycle time window"),
    bind("t", "Cycle tab"),
    bind("f", "Toggle full page"),
    bind("x", "Reveal or mask secrets"),
    bind("e", "Expand or collapse all"),
    bind("a A r", "Run first / second action, refresh"),
    bind("X", "Cancel running actions"),
    bind("E", "Toggle edit mode on a rule"),
    bind("?", "Toggle this help"),
    bind("Esc q", "Back, quit"),
];

/// Resolve a key press to an action, if it means anything here.
#[must_use]
pub fn resolve_key(key: Key, context: InputContext) -> Option<InputAction> {
    if key == Key::Ctrl('c') {
        return Some(InputAction::Quit);
    }
    if context.help_open {
        return Some(match key {
            Key::Char('?') => InputAction::ToggleHelp,
            _ => InputAction::CloseHelp,
        });
    }
    match context.mode {
        InputMode::Search => resolve_search_key(key),
        InputMode::Normal => resolve_global_key(key),
    }
}

fn resolve_search_key(key: Key) -> Option<InputAction> {
    match key {
        Key::Char(c) => Some(InputAction::SearchInput(c)),
        Key::Backspace => Some(InputAction::SearchBackspace),
        Key::Enter => Some(InputAction::SearchCommit),
        Key::Esc => Some(InputAction::SearchCancel),
        _ => None,
    }
}

fn resolve_global_key(key: Key) -> Option<InputAction> {
    let action = match key {
        Key::Char('q') => InputAction::Quit,
        Key::Esc => InputAction::BackOrQuit,
        Key::Char('?') => InputAction::ToggleHelp,
        Key::Char(c @ '0'..='9') => {
            let n = c.to_digit(10).map_or(0, |d| if d == 0 { 10 } else { d as usize });
            return PanelKind::from_number(n).map(InputAction::SelectPanel);
        }
        Key::Tab | Key::Right | Key::Char(']') => InputAction::NextPanel,
        Key::BackTab | Key::Left | Key::Char('[') => InputAction::PrevPanel,
        Key::Up | Key::Char('k') => InputAction::CursorUp,
        Key::Down | Key::Char('j') => InputAction::CursorDown,
        Key::Home | Key::Char('g') => InputAction::CursorTop,
        Key::End | Key::Char('G') => InputAction::CursorBottom,
        Key::PageUp => InputAction::PageUp,
        Key::PageDown => InputAction::PageDown,
        Key::Enter | Key::Char(' ') => InputAction::Activate,
        Key::Char('/') => InputAction::BeginSearch,
        Key::Char('c') => InputAction::CycleCategory,
        Key::Char('s') => InputAction::CycleStatus,
        Key::Char('o') => InputAction::NextSort,
        Key::Char('O') => InputAction::ReverseSort,
        Key::Char('w') => InputAction::CycleWindow,
        Key::Char('t') => InputAction::CycleTab,
        Key::Char('f') => InputAction::ToggleFullPage,
        Key::Char('x') => InputAction::ToggleSecrets,
        Key::Char('e') => InputAction::ToggleExpandAll,
        Key::Char('a') => InputAction::RunAction(0),
        Key::Char('A') => InputAction::RunAction(1),
        Key::Char('r') => InputAction::Refresh,
        Key::Char('X') => InputAction::CancelActions,
        Key::Char('E') => InputAction::ToggleEdit,
        _ => return None,
    };
    Some(action)
}
