//! Property-based tests for dashboard reducer invariants.
//!
//! Arbitrary key and tick sequences must leave the model renderable: the
//! active panel's query always renders, cursors stay on a row, toasts stay
//! bounded, and every frame fits the terminal.

use std::time::Duration;

use chrono::NaiveDate;
use proptest::prelude::*;

use super::input::{InputMode, Key};
use super::model::{DashboardCmd, DashboardModel, DashboardMsg};
use super::render::frame;
use super::update::update;
use crate::panels::{PanelKind, RenderContext, Workspace};

// ──────────────────── strategies ────────────────────

fn arb_panel() -> impl Strategy<Value = PanelKind> {
    (1usize..=PanelKind::ALL.len()).prop_map(|n| PanelKind::from_number(n).unwrap())
}

fn arb_key() -> impl Strategy<Value = Key> {
    prop_oneof![
        prop::sample::select(vec![
            '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'j', 'k', 'g', 'G', 'c', 's', 'o',
            'O', 'w', 't', 'f', 'x', 'e', 'E', 'a', 'A', 'r', 'X', '/', '?', ' ', '[', ']', 'u',
            '-',
        ])
        .prop_map(Key::Char),
        Just(Key::Enter),
        Just(Key::Esc),
        Just(Key::Backspace),
        Just(Key::Up),
        Just(Key::Down),
        Just(Key::PageUp),
        Just(Key::PageDown),
        Just(Key::Home),
        Just(Key::End),
        Just(Key::Tab),
        Just(Key::BackTab),
    ]
}

/// Keys minus the ones that quit, so sequences keep exercising the panels.
fn arb_live_key() -> impl Strategy<Value = Key> {
    arb_key().prop_filter("no quit", |k| !matches!(k, Key::Char('q') | Key::Esc))
}

fn arb_msg() -> impl Strategy<Value = DashboardMsg> {
    prop_oneof![
        8 => arb_key().prop_map(DashboardMsg::Key),
        1 => Just(DashboardMsg::Tick),
        1 => (20u16..200, 6u16..60).prop_map(|(cols, rows)| DashboardMsg::Resize { cols, rows }),
    ]
}

fn fresh_model(start: PanelKind) -> DashboardModel {
    let today = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
    DashboardModel::new(
        Workspace::seeded(today),
        RenderContext::at(today),
        start,
        Duration::from_millis(250),
    )
}

fn assert_model_invariants(model: &DashboardModel) {
    let view = model
        .view()
        .unwrap_or_else(|e| panic!("active panel {} stopped rendering: {e}", model.panel));
    let cursor = model.current().cursor;
    assert!(
        cursor < view.rows.len().max(1),
        "cursor {cursor} past {} rows on {}",
        view.rows.len(),
        model.panel
    );
    assert!(model.notifications.len() <= 3, "toasts unbounded");

    let (cols, rows) = model.terminal_size;
    let lines = frame(model);
    assert_eq!(lines.len(), usize::from(rows).max(6));
    for line in &lines {
        assert!(line.width() <= usize::from(cols), "line wider than terminal");
    }
}

// ──────────────────── property tests ────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Any sequence of 1-60 messages preserves all model invariants.
    #[test]
    fn reducer_preserves_invariants(
        start in arb_panel(),
        msgs in prop::collection::vec(arb_msg(), 1..60)
    ) {
        let mut model = fresh_model(start);
        model.terminal_size = (100, 30);
        for msg in msgs {
            let _ = update(&mut model, msg);
            assert_model_invariants(&model);
        }
    }

    /// The quit flag only transitions from false to true, never back.
    #[test]
    fn quit_is_monotonic(msgs in prop::collection::vec(arb_msg(), 1..40)) {
        let mut model = fresh_model(PanelKind::Traceability);
        let mut ever_quit = false;
        for msg in msgs {
            let cmd = update(&mut model, msg);
            if cmd == DashboardCmd::Quit {
                prop_assert!(model.quit);
            }
            ever_quit |= model.quit;
            prop_assert_eq!(model.quit, ever_quit, "quit flag reverted");
        }
    }

    /// next().prev() is identity and a full lap comes back around.
    #[test]
    fn panel_cycle_round_trips(panel in arb_panel()) {
        prop_assert_eq!(panel.next().prev(), panel);
        let mut p = panel;
        for _ in 0..PanelKind::ALL.len() {
            p = p.next();
        }
        prop_assert_eq!(p, panel);
    }

    /// Keys on one panel never touch another panel's query.
    #[test]
    fn panel_state_is_isolated(
        start in arb_panel(),
        keys in prop::collection::vec(arb_live_key(), 1..30)
    ) {
        let mut model = fresh_model(start);
        let before: Vec<_> = PanelKind::ALL.iter().map(|k| model.state(*k).query.clone()).collect();
        for key in keys {
            let panel = model.panel;
            let _ = update(&mut model, DashboardMsg::Key(key));
            for (kind, query) in PanelKind::ALL.iter().zip(&before) {
                if *kind != panel && *kind != model.panel {
                    prop_assert_eq!(&model.state(*kind).query, query);
                }
            }
        }
    }

    /// Typed search text lands in the query verbatim and Esc clears it.
    #[test]
    fn search_text_round_trips(text in "[a-z0-9]{1,8}") {
        let mut model = fresh_model(PanelKind::Security);
        let _ = update(&mut model, DashboardMsg::Key(Key::Char('/')));
        for c in text.chars() {
            let _ = update(&mut model, DashboardMsg::Key(Key::Char(c)));
        }
        prop_assert_eq!(model.mode, InputMode::Search);
        prop_assert_eq!(&model.current().query.search, &text);
        let _ = update(&mut model, DashboardMsg::Key(Key::Esc));
        prop_assert_eq!(model.mode, InputMode::Normal);
        prop_assert!(model.current().query.search.is_empty());
        prop_assert!(!model.quit);
    }
}

// ──────────────────── non-proptest invariant tests ────────────────────

#[test]
fn panel_from_number_exhaustive() {
    for n in 0usize..=PanelKind::ALL.len() + 2 {
        let result = PanelKind::from_number(n);
        if (1..=PanelKind::ALL.len()).contains(&n) {
            assert_eq!(result.map(PanelKind::number), Some(n));
        } else {
            assert!(result.is_none(), "from_number({n}) should be None");
        }
    }
}

#[test]
fn tiny_terminal_still_frames() {
    let mut model = fresh_model(PanelKind::Files);
    let _ = update(&mut model, DashboardMsg::Resize { cols: 1, rows: 1 });
    let lines = frame(&model);
    assert_eq!(lines.len(), 6);
    assert!(lines.iter().all(|l| l.width() <= 1));
}
