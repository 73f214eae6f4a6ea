//! Requirement ↔ code-module traceability matrix.

#![allow(missing_docs)]

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::badges::{BadgeKey, badge};
use super::{Cell, Panel, PanelKind, PanelQuery, PanelSchema, PanelView, RenderContext, Row, Tile};
use crate::core::errors::Result;
use crate::panel::aggregate::{CoverageBand, count_by, rounded_mean};
use crate::panel::badge::Tone;
use crate::panel::query::Record;
use crate::panel::sort::SortValue;
use crate::panel::view::derive_view;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequirementType {
    Functional,
    NonFunctional,
    BusinessRule,
    UserStory,
}

impl RequirementType {
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Functional => "functional",
            Self::NonFunctional => "non-functional",
            Self::BusinessRule => "business-rule",
            Self::UserStory => "user-story",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceStatus {
    Complete,
    Partial,
    Missing,
}

impl TraceStatus {
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Partial => "partial",
            Self::Missing => "missing",
        }
    }
}

/// One requirement and the modules implementing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceItem {
    pub id: String,
    pub requirement_id: String,
    pub requirement_name: String,
    pub requirement_type: RequirementType,
    pub code_modules: Vec<String>,
    /// Test coverage percentage, 0–100.
    pub test_coverage: u8,
    pub last_updated: DateTime<Utc>,
    pub status: TraceStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceField {
    Requirement,
    Name,
    Type,
    Coverage,
    Status,
    Updated,
}

impl Record for TraceItem {
    type Field = TraceField;

    fn record_id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.requirement_id.as_str(), self.requirement_name.as_str()];
        fields.extend(self.code_modules.iter().map(String::as_str));
        fields
    }

    fn category(&self) -> Option<&str> {
        Some(self.requirement_type.token())
    }

    fn status(&self) -> Option<&str> {
        Some(self.status.token())
    }

    fn sort_value(&self, field: TraceField) -> SortValue<'_> {
        match field {
            TraceField::Requirement => SortValue::Text(&self.requirement_id),
            TraceField::Name => SortValue::Text(&self.requirement_name),
            TraceField::Type => SortValue::Text(self.requirement_type.token()),
            TraceField::Coverage => SortValue::Number(f64::from(self.test_coverage)),
            TraceField::Status => SortValue::Text(self.status.token()),
            #[allow(clippy::cast_precision_loss)]
            TraceField::Updated => SortValue::Number(self.last_updated.timestamp() as f64),
        }
    }
}

pub const SCHEMA: PanelSchema<TraceField> = PanelSchema {
    kind: PanelKind::Traceability,
    categories: &["functional", "non-functional", "business-rule", "user-story"],
    statuses: &["complete", "partial", "missing"],
    sort_fields: &[
        ("requirement", TraceField::Requirement),
        ("name", TraceField::Name),
        ("type", TraceField::Type),
        ("coverage", TraceField::Coverage),
        ("status", TraceField::Status),
        ("updated", TraceField::Updated),
    ],
    default_sort: None,
    card_rows: Some(5),
};

/// Roll-up over every requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceSummary {
    pub total: usize,
    pub complete: usize,
    pub partial: usize,
    pub missing: usize,
    pub mean_coverage: i64,
}

#[derive(Debug, Clone)]
pub struct TraceabilityPanel {
    pub items: Vec<TraceItem>,
}

impl TraceabilityPanel {
    #[must_use]
    pub fn seeded() -> Self {
        Self {
            items: seed_items(),
        }
    }

    #[must_use]
    pub fn summary(&self) -> TraceSummary {
        let by_status = count_by(&self.items, |i| i.status);
        let get = |s| by_status.get(&s).copied().unwrap_or(0);
        TraceSummary {
            total: self.items.len(),
            complete: get(TraceStatus::Complete),
            partial: get(TraceStatus::Partial),
            missing: get(TraceStatus::Missing),
            mean_coverage: rounded_mean(self.items.iter().map(|i| f64::from(i.test_coverage)))
                .unwrap_or(0),
        }
    }
}

impl Panel for TraceabilityPanel {
    fn kind(&self) -> PanelKind {
        PanelKind::Traceability
    }

    fn facets(&self) -> (&'static [&'static str], &'static [&'static str]) {
        (SCHEMA.categories, SCHEMA.statuses)
    }

    fn sort_fields(&self) -> Vec<&'static str> {
        SCHEMA.sort_fields.iter().map(|(n, _)| *n).collect()
    }

    fn render(&self, query: &PanelQuery, ctx: &RenderContext) -> Result<PanelView> {
        let state = SCHEMA.view_state(query, ctx)?;
        let derived = derive_view(&self.items, &state);
        let summary = self.summary();

        let mut view = PanelView::new(PanelKind::Traceability);
        view.tiles = vec![
            Tile::new("Requirements", summary.total, Tone::Neutral),
            Tile::new("Complete", summary.complete, Tone::Success),
            Tile::new("Partial", summary.partial, Tone::Warning),
            Tile::new("Missing", summary.missing, Tone::Danger),
            Tile::new(
                "Mean coverage",
                format!("{}%", summary.mean_coverage),
                coverage_tone(u8::try_from(summary.mean_coverage).unwrap_or(0)),
            ),
        ];
        view.columns = SCHEMA.columns(
            &[
                ("Requirement", Some(TraceField::Requirement)),
                ("Name", Some(TraceField::Name)),
                ("Type", Some(TraceField::Type)),
                ("Code Modules", None),
                ("Coverage", Some(TraceField::Coverage)),
                ("Status", Some(TraceField::Status)),
                ("Last Updated", Some(TraceField::Updated)),
            ],
            &state,
        );
        view.rows = derived
            .rows
            .iter()
            .map(|item| {
                Row::new(
                    &item.id,
                    vec![
                        Cell::plain(&item.requirement_id),
                        Cell::plain(&item.requirement_name),
                        Cell::badge(badge(BadgeKey::Requirement(item.requirement_type))),
                        Cell::plain(item.code_modules.join(", ")),
                        Cell::toned(
                            format!("{}%", item.test_coverage),
                            coverage_tone(item.test_coverage),
                        ),
                        Cell::badge(badge(BadgeKey::Trace(item.status))),
                        Cell::plain(ctx.format_date(item.last_updated.date_naive())),
                    ],
                )
            })
            .collect();
        view.counts_from(&derived);
        Ok(view)
    }
}

/// Tone for a coverage percentage, by band.
#[must_use]
pub fn coverage_tone(coverage: u8) -> Tone {
    badge(BadgeKey::Coverage(CoverageBand::of(coverage))).tone
}

fn item(
    n: u8,
    name: &str,
    kind: RequirementType,
    modules: &[&str],
    coverage: u8,
    updated: (u32, u32, u32, u32),
    status: TraceStatus,
) -> TraceItem {
    let (month, day, hour, minute) = updated;
    let last_updated = NaiveDate::from_ymd_opt(2025, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .map_or_else(Utc::now, |dt| dt.and_utc());
    TraceItem {
        id: format!("t{n}"),
        requirement_id: format!("REQ-{n:03}"),
        requirement_name: name.to_string(),
        requirement_type: kind,
        code_modules: modules.iter().map(|m| (*m).to_string()).collect(),
        test_coverage: coverage,
        last_updated,
        status,
    }
}

fn seed_items() -> Vec<TraceItem> {
    use RequirementType::{BusinessRule, Functional, NonFunctional, UserStory};
    use TraceStatus::{Complete, Partial};
    vec![
        item(1, "User Authentication", Functional, &["auth-service", "user-controller", "login-component"], 95, (4, 5, 14, 30), Complete),
        item(2, "Product Catalog", Functional, &["product-service", "catalog-controller", "product-component"], 85, (4, 4, 11, 15), Complete),
        item(3, "Order Processing", Functional, &["order-service", "payment-service", "checkout-component"], 80, (4, 6, 9, 45), Complete),
        item(4, "Payment Gateway Integration", Functional, &["payment-service", "stripe-adapter", "payment-component"], 90, (4, 3, 16, 20), Complete),
        item(5, "User Profile Management", Functional, &["user-service", "profile-controller", "profile-component"], 75, (4, 2, 13, 10), Partial),
        item(6, "System Performance", NonFunctional, &["caching-service", "optimization-utils"], 60, (4, 1, 10, 30), Partial),
        item(7, "Data Privacy Compliance", BusinessRule, &["data-masking", "consent-manager", "privacy-service"], 85, (4, 4, 15, 45), Complete),
        item(8, "Reporting Dashboard", UserStory, &["reporting-service", "dashboard-component"], 40, (4, 1, 9, 15), Partial),
        item(9, "Multi-language Support", Functional, &["i18n-service", "translation-component"], 30, (3, 30, 14, 20), Partial),
        item(10, "Mobile Responsiveness", NonFunctional, &["responsive-layout", "mobile-utils"], 70, (4, 2, 11, 30), Partial),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RenderContext {
        RenderContext::at(NaiveDate::from_ymd_opt(2025, 4, 10).unwrap())
    }

    fn render(q: &PanelQuery) -> PanelView {
        TraceabilityPanel::seeded().render(q, &ctx()).unwrap()
    }

    #[test]
    fn seed_ids_are_unique() {
        let panel = TraceabilityPanel::seeded();
        let mut ids: Vec<&str> = panel.items.iter().map(|i| i.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), panel.items.len());
    }

    #[test]
    fn req_005_follows_status_facet() {
        let partial = render(&PanelQuery::default().status("partial").full_page());
        assert!(partial.row_ids().contains(&"t5"));
        let complete = render(&PanelQuery::default().status("complete").full_page());
        assert!(!complete.row_ids().contains(&"t5"));
    }

    #[test]
    fn req_005_search_hits_under_all_and_partial() {
        for status in ["all", "partial"] {
            let view = render(&PanelQuery::default().search("REQ-005").status(status));
            assert_eq!(view.row_ids(), vec!["t5"], "status={status}");
        }
        let view = render(&PanelQuery::default().search("REQ-005").status("complete"));
        assert!(view.rows.is_empty());
    }

    #[test]
    fn search_covers_code_modules() {
        let view = render(&PanelQuery::default().search("stripe"));
        assert_eq!(view.row_ids(), vec!["t4"]);
    }

    #[test]
    fn card_view_shows_five_with_hint() {
        let view = render(&PanelQuery::default());
        assert_eq!(view.rows.len(), 5);
        assert_eq!(view.matched, 10);
        assert!(view.notes.iter().any(|n| n.contains("5 more")));
        assert_eq!(render(&PanelQuery::default().full_page()).rows.len(), 10);
    }

    #[test]
    fn summary_ignores_filters() {
        let plain = render(&PanelQuery::default());
        let filtered = render(&PanelQuery::default().search("zzz").category("user-story"));
        assert_eq!(plain.tiles, filtered.tiles);
        assert_eq!(plain.tile("Complete"), Some("5"));
        assert_eq!(plain.tile("Partial"), Some("5"));
        assert_eq!(plain.tile("Mean coverage"), Some("71%"));
    }

    #[test]
    fn sort_by_coverage_then_reverse() {
        let asc = render(&PanelQuery::default().sort("coverage").full_page());
        assert_eq!(asc.row_ids().first(), Some(&"t9"));
        let desc = render(&PanelQuery::default().sort("coverage").sort("coverage").full_page());
        assert_eq!(desc.row_ids().first(), Some(&"t1"));
        assert_eq!(desc.columns[4].sort, Some(crate::panel::sort::SortDirection::Desc));
    }

    #[test]
    fn bad_facet_is_an_error() {
        let err = TraceabilityPanel::seeded()
            .render(&PanelQuery::default().status("done"), &ctx())
            .unwrap_err();
        assert_eq!(err.code(), "C2S-2002");
        let err = TraceabilityPanel::seeded()
            .render(&PanelQuery::default().sort("colour"), &ctx())
            .unwrap_err();
        assert_eq!(err.code(), "C2S-2002");
    }
}
