//! Property-based tests for the panel pipeline.
//!
//! Summary tiles are computed over the untouched source, expansion is
//! additive, a repeated header click reverses the order, and search is a
//! pure filter that never errors.

use chrono::NaiveDate;
use proptest::prelude::*;

use super::{Panel, PanelKind, PanelQuery, PanelView, RenderContext, Workspace};

// ──────────────────── strategies ────────────────────

/// Panels whose filters narrow rows without changing what is summarized.
const TABLE_PANELS: [PanelKind; 5] = [
    PanelKind::Traceability,
    PanelKind::Capabilities,
    PanelKind::Security,
    PanelKind::Configuration,
    PanelKind::Rules,
];

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, 10).unwrap()
}

fn render(kind: PanelKind, query: &PanelQuery) -> PanelView {
    Workspace::seeded(today())
        .render(kind, query, &RenderContext::at(today()))
        .unwrap_or_else(|e| panic!("{kind} failed to render {query:?}: {e}"))
}

fn arb_table_panel() -> impl Strategy<Value = PanelKind> {
    prop::sample::select(TABLE_PANELS.to_vec())
}

/// Index into a facet's option list; `None` selects "all".
fn arb_choice() -> impl Strategy<Value = Option<prop::sample::Index>> {
    prop::option::of(any::<prop::sample::Index>())
}

fn pick(options: &[&str], choice: Option<&prop::sample::Index>) -> String {
    match choice {
        Some(i) if !options.is_empty() => options[i.index(options.len())].to_string(),
        _ => "all".to_string(),
    }
}

fn with_case(text: &str, upper: &[bool]) -> String {
    text.chars()
        .zip(upper.iter().cycle())
        .map(|(c, &up)| if up { c.to_ascii_uppercase() } else { c.to_ascii_lowercase() })
        .collect()
}

// ──────────────────── property tests ────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Tiles never move when search or facets change.
    #[test]
    fn summary_ignores_filters(
        kind in arb_table_panel(),
        search in "[a-z0-9 -]{0,6}",
        category in arb_choice(),
        status in arb_choice(),
    ) {
        let ws = Workspace::seeded(today());
        let (categories, statuses) = ws.panel(kind).facets();
        let baseline = render(kind, &PanelQuery::default());
        let filtered = render(
            kind,
            &PanelQuery::default()
                .search(&search)
                .category(&pick(categories, category.as_ref()))
                .status(&pick(statuses, status.as_ref())),
        );
        prop_assert_eq!(&filtered.tiles, &baseline.tiles);
        prop_assert_eq!(filtered.total, baseline.total);
        prop_assert!(filtered.matched <= filtered.total);
    }

    /// Expanding one capability never closes another.
    #[test]
    fn expansion_is_additive(a in 1usize..=5, b in 1usize..=5) {
        prop_assume!(a != b);
        let (a, b) = (format!("c{a}"), format!("c{b}"));
        let view = render(
            PanelKind::Capabilities,
            &PanelQuery::default().full_page().expand(&a).expand(&b),
        );
        for id in [&a, &b] {
            let row = view.rows.iter().find(|r| &r.id == id);
            prop_assert!(row.is_some_and(|r| r.expanded), "{} not expanded", id);
        }
    }

    /// Two clicks on a column with distinct keys reverse one click.
    #[test]
    fn second_click_reverses_order(field in prop::sample::select(vec!["requirement", "name"])) {
        let once = render(PanelKind::Traceability, &PanelQuery::default().full_page().sort(field));
        let twice = render(
            PanelKind::Traceability,
            &PanelQuery::default().full_page().sort(field).sort(field),
        );
        let mut reversed = once.row_ids();
        reversed.reverse();
        prop_assert_eq!(twice.row_ids(), reversed);
    }

    /// Folding dashboard clicks never changes the resulting order.
    #[test]
    fn folded_sort_clicks_match_full_replay(
        clicks in prop::collection::vec(prop::sample::select(vec!["requirement", "name", "status"]), 0..40),
    ) {
        let mut raw = PanelQuery::default().full_page();
        raw.sort_clicks = clicks.iter().map(ToString::to_string).collect();
        let mut folded = PanelQuery::default().full_page();
        for field in &clicks {
            folded.click_sort(field);
        }
        prop_assert!(folded.sort_clicks.len() <= 3);
        let a = render(PanelKind::Traceability, &raw);
        let b = render(PanelKind::Traceability, &folded);
        prop_assert_eq!(a.row_ids(), b.row_ids());
        prop_assert_eq!(a.columns, b.columns);
    }

    /// A search nothing contains yields zero rows without an error.
    #[test]
    fn unmatched_search_is_empty_not_error(kind in arb_table_panel(), tail in "[a-z]{0,4}") {
        let view = render(kind, &PanelQuery::default().full_page().search(&format!("~{tail}~")));
        prop_assert!(view.rows.is_empty());
        prop_assert_eq!(view.matched, 0);
    }

    /// REQ-005 is partial: visible under "all" and "partial", hidden otherwise,
    /// whatever the search text's case.
    #[test]
    fn req_005_tracks_status_facet(
        status in prop::sample::select(vec!["all", "partial", "complete", "missing"]),
        upper in prop::collection::vec(any::<bool>(), 1..8),
    ) {
        let view = render(
            PanelKind::Traceability,
            &PanelQuery::default()
                .full_page()
                .status(status)
                .search(&with_case("req-005", &upper)),
        );
        let shown = view.row_ids().contains(&"t5");
        prop_assert_eq!(shown, matches!(status, "all" | "partial"));
    }

    /// Payment processing reads 70% collapsed or expanded.
    #[test]
    fn capability_coverage_ignores_expand_state(expanded in any::<bool>(), all in any::<bool>()) {
        let mut query = PanelQuery::default();
        if expanded {
            query = query.expand("c3");
        }
        query.expand_all = all;
        let view = render(PanelKind::Capabilities, &query);
        let row = view.rows.iter().find(|r| r.id == "c3");
        prop_assert_eq!(row.map(|r| r.cells[1].text.as_str()), Some("70%"));
    }
}

// ──────────────────── non-proptest invariant tests ────────────────────

#[test]
fn empty_search_returns_full_list() {
    for kind in TABLE_PANELS {
        let view = render(kind, &PanelQuery::default().full_page().search(""));
        assert_eq!(view.matched, view.total, "{kind}");
    }
}

#[test]
fn every_panel_renders_with_defaults() {
    let ws = Workspace::seeded(today());
    for kind in PanelKind::ALL {
        let view = ws
            .render(kind, &PanelQuery::default(), &RenderContext::at(today()))
            .unwrap();
        assert_eq!(view.panel, kind);
    }
}
