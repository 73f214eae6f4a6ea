//! Business capability map with nested subcapabilities.
//!
//! A capability's status is never stored: it is derived from coverage with
//! the shared coverage bands, so the two can not disagree.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use super::badges::{BadgeKey, badge};
use super::traceability::coverage_tone;
use super::{Cell, Panel, PanelKind, PanelQuery, PanelSchema, PanelView, RenderContext, Row, Tile};
use crate::core::errors::Result;
use crate::panel::aggregate::{CoverageBand, weighted_coverage};
use crate::panel::badge::Tone;
use crate::panel::query::Record;
use crate::panel::sort::SortValue;
use crate::panel::view::derive_view;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityStatus {
    Implemented,
    Partial,
    Missing,
}

impl CapabilityStatus {
    #[must_use]
    pub const fn from_coverage(coverage: u8) -> Self {
        match CoverageBand::of(coverage) {
            CoverageBand::Good => Self::Implemented,
            CoverageBand::Partial => Self::Partial,
            CoverageBand::Missing => Self::Missing,
        }
    }

    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Implemented => "implemented",
            Self::Partial => "partial",
            Self::Missing => "missing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Coverage percentage, 0–100.
    pub coverage: u8,
    pub modules: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subcapabilities: Vec<Capability>,
}

impl Capability {
    #[must_use]
    pub const fn status(&self) -> CapabilityStatus {
        CapabilityStatus::from_coverage(self.coverage)
    }

    /// Self first, then subcapabilities depth-first.
    pub fn walk(&self) -> Box<dyn Iterator<Item = &Self> + '_> {
        Box::new(std::iter::once(self).chain(self.subcapabilities.iter().flat_map(Self::walk)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityField {
    Name,
    Coverage,
    Status,
}

impl Record for Capability {
    type Field = CapabilityField;

    fn record_id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.description.as_str()];
        fields.extend(self.modules.iter().map(String::as_str));
        fields
    }

    fn status(&self) -> Option<&str> {
        Some(Self::status(self).token())
    }

    fn sort_value(&self, field: CapabilityField) -> SortValue<'_> {
        match field {
            CapabilityField::Name => SortValue::Text(&self.name),
            CapabilityField::Coverage => SortValue::Number(f64::from(self.coverage)),
            CapabilityField::Status => SortValue::Text(Self::status(self).token()),
        }
    }
}

pub const SCHEMA: PanelSchema<CapabilityField> = PanelSchema {
    kind: PanelKind::Capabilities,
    categories: &[],
    statuses: &["implemented", "partial", "missing"],
    sort_fields: &[
        ("name", CapabilityField::Name),
        ("coverage", CapabilityField::Coverage),
        ("status", CapabilityField::Status),
    ],
    default_sort: None,
    card_rows: Some(3),
};

/// Counts over capabilities and subcapabilities together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilitySummary {
    pub total: usize,
    pub implemented: usize,
    pub partial: usize,
    pub missing: usize,
    /// `(implemented + 0.5 × partial) / total × 100`, rounded.
    pub overall: u8,
}

#[derive(Debug, Clone)]
pub struct CapabilityPanel {
    pub capabilities: Vec<Capability>,
}

impl CapabilityPanel {
    #[must_use]
    pub fn seeded() -> Self {
        Self {
            capabilities: seed_capabilities(),
        }
    }

    #[must_use]
    pub fn summary(&self) -> CapabilitySummary {
        let mut s = CapabilitySummary {
            total: 0,
            implemented: 0,
            partial: 0,
            missing: 0,
            overall: 0,
        };
        for cap in self.capabilities.iter().flat_map(Capability::walk) {
            s.total += 1;
            match cap.status() {
                CapabilityStatus::Implemented => s.implemented += 1,
                CapabilityStatus::Partial => s.partial += 1,
                CapabilityStatus::Missing => s.missing += 1,
            }
        }
        s.overall = weighted_coverage(s.implemented, s.partial, s.total);
        s
    }
}

fn capability_cells(cap: &Capability) -> Vec<Cell> {
    vec![
        Cell::plain(&cap.name),
        Cell::toned(format!("{}%", cap.coverage), coverage_tone(cap.coverage)),
        Cell::badge(badge(BadgeKey::Capability(cap.status()))),
        Cell::plain(cap.modules.len()),
    ]
}

impl Panel for CapabilityPanel {
    fn kind(&self) -> PanelKind {
        PanelKind::Capabilities
    }

    fn facets(&self) -> (&'static [&'static str], &'static [&'static str]) {
        (SCHEMA.categories, SCHEMA.statuses)
    }

    fn sort_fields(&self) -> Vec<&'static str> {
        SCHEMA.sort_fields.iter().map(|(n, _)| *n).collect()
    }

    fn render(&self, query: &PanelQuery, ctx: &RenderContext) -> Result<PanelView> {
        let mut state = SCHEMA.view_state(query, ctx)?;
        query.apply_expansion(&mut state.expanded, self.capabilities.iter().map(|c| c.id.as_str()));
        let derived = derive_view(&self.capabilities, &state);
        let summary = self.summary();

        let mut view = PanelView::new(PanelKind::Capabilities);
        view.tiles = vec![
            Tile::new("Overall coverage", format!("{}%", summary.overall), coverage_tone(summary.overall)),
            Tile::new("Implemented", summary.implemented, Tone::Success),
            Tile::new("Partial", summary.partial, Tone::Warning),
            Tile::new("Missing", summary.missing, Tone::Danger),
        ];
        view.columns = SCHEMA.columns(
            &[
                ("Capability", Some(CapabilityField::Name)),
                ("Coverage", Some(CapabilityField::Coverage)),
                ("Status", Some(CapabilityField::Status)),
                ("Modules", None),
            ],
            &state,
        );
        for cap in &derived.rows {
            let expanded = state.expanded.is_expanded(&cap.id);
            let mut detail = vec![cap.description.clone()];
            if !cap.modules.is_empty() {
                detail.push(format!("modules: {}", cap.modules.join(", ")));
            }
            view.rows
                .push(Row::new(&cap.id, capability_cells(cap)).expandable(expanded, detail));
            if expanded {
                view.rows.extend(cap.subcapabilities.iter().map(|sub| {
                    let mut row = Row::new(&sub.id, capability_cells(sub)).depth(1);
                    if !sub.modules.is_empty() {
                        row.detail = vec![sub.modules.join(", ")];
                    }
                    row
                }));
            }
        }
        view.counts_from(&derived);
        Ok(view)
    }
}

fn cap(id: &str, name: &str, description: &str, coverage: u8, modules: &[&str]) -> Capability {
    Capability {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        coverage,
        modules: modules.iter().map(|m| (*m).to_string()).collect(),
        subcapabilities: Vec::new(),
    }
}

fn with_subs(mut parent: Capability, subs: Vec<Capability>) -> Capability {
    parent.subcapabilities = subs;
    parent
}

fn seed_capabilities() -> Vec<Capability> {
    vec![
        with_subs(
            cap("c1", "User Management", "Capabilities related to user accounts and authentication", 85, &["auth", "user-service", "profile-manager"]),
            vec![
                cap("c1-1", "Authentication", "User login and authentication processes", 95, &["auth"]),
                cap("c1-2", "User Profiles", "User profile management", 80, &["profile-manager"]),
                cap("c1-3", "Role Management", "User roles and permissions", 75, &["auth", "user-service"]),
            ],
        ),
        with_subs(
            cap("c2", "Order Processing", "Capabilities related to order management", 90, &["order-service", "cart-service", "inventory-service"]),
            vec![
                cap("c2-1", "Shopping Cart", "Shopping cart functionality", 100, &["cart-service"]),
                cap("c2-2", "Checkout", "Order checkout process", 90, &["order-service", "payment-service"]),
                cap("c2-3", "Order Tracking", "Order status and tracking", 85, &["order-service"]),
            ],
        ),
        with_subs(
            cap("c3", "Payment Processing", "Capabilities related to payment handling", 70, &["payment-service", "billing-service"]),
            vec![
                cap("c3-1", "Payment Methods", "Support for various payment methods", 80, &["payment-service"]),
                cap("c3-2", "Invoicing", "Invoice generation and management", 60, &["billing-service"]),
                cap("c3-3", "Refunds", "Refund processing", 50, &["payment-service"]),
            ],
        ),
        with_subs(
            cap("c4", "Reporting & Analytics", "Business intelligence and reporting capabilities", 40, &["analytics-service", "reporting-engine"]),
            vec![
                cap("c4-1", "Sales Reports", "Sales performance reporting", 65, &["reporting-engine"]),
                cap("c4-2", "User Analytics", "User behavior analytics", 45, &["analytics-service"]),
                cap("c4-3", "Business Intelligence", "Advanced business analytics", 20, &[]),
            ],
        ),
        with_subs(
            cap("c5", "Customer Support", "Customer service and support capabilities", 30, &["support-ticket", "knowledge-base"]),
            vec![
                cap("c5-1", "Ticket Management", "Support ticket handling", 60, &["support-ticket"]),
                cap("c5-2", "Knowledge Base", "Self-service knowledge base", 40, &["knowledge-base"]),
                cap("c5-3", "Live Chat", "Real-time customer support chat", 0, &[]),
            ],
        ),
    ]
}
