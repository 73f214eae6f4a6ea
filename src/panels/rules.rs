//! Architectural expectation rules: an editable rule book with the code
//! locations that violate each rule.

#![allow(missing_docs)]

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::badges::{BadgeKey, badge};
use super::{Cell, Panel, PanelKind, PanelQuery, PanelSchema, PanelView, RenderContext, Row, Tile};
use crate::core::errors::{DashError, Result};
use crate::panel::badge::Tone;
use crate::panel::expand::ExpandSet;
use crate::panel::form::ValidationErrors;
use crate::panel::query::Record;
use crate::panel::sort::SortValue;
use crate::panel::view::derive_view;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Dependency,
    Layer,
    Pattern,
    Naming,
}

impl RuleKind {
    pub const ALL: [Self; 4] = [Self::Dependency, Self::Layer, Self::Pattern, Self::Naming];

    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Dependency => "dependency",
            Self::Layer => "layer",
            Self::Pattern => "pattern",
            Self::Naming => "naming",
        }
    }
}

impl FromStr for RuleKind {
    type Err = DashError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.token() == wanted)
            .ok_or_else(|| DashError::InvalidFacet {
                panel: PanelKind::Rules.token(),
                axis: "kind",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    Compliant,
    Violated,
    Partial,
}

impl RuleStatus {
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Compliant => "compliant",
            Self::Violated => "violated",
            Self::Partial => "partial",
        }
    }
}

/// A code location breaking a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTrace {
    pub file: String,
    pub line: u32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectationRule {
    pub id: String,
    pub kind: RuleKind,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// `None` until the rule has been checked against the code.
    #[serde(default)]
    pub status: Option<RuleStatus>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traces: Vec<RuleTrace>,
}

impl ExpectationRule {
    #[must_use]
    pub fn violations(&self) -> usize {
        self.traces.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleField {
    Id,
    Kind,
    Status,
    Violations,
}

impl Record for ExpectationRule {
    type Field = RuleField;

    fn record_id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.id.as_str(), self.description.as_str()];
        fields.extend(self.details.as_deref());
        fields
    }

    fn category(&self) -> Option<&str> {
        Some(self.kind.token())
    }

    fn status(&self) -> Option<&str> {
        self.status.map(RuleStatus::token)
    }

    fn sort_value(&self, field: RuleField) -> SortValue<'_> {
        match field {
            RuleField::Id => SortValue::Text(&self.id),
            RuleField::Kind => SortValue::Text(self.kind.token()),
            RuleField::Status => SortValue::Text(self.status.map_or("", RuleStatus::token)),
            #[allow(clippy::cast_precision_loss)]
            RuleField::Violations => SortValue::Number(self.violations() as f64),
        }
    }
}

pub const SCHEMA: PanelSchema<RuleField> = PanelSchema {
    kind: PanelKind::Rules,
    categories: &["dependency", "layer", "pattern", "naming"],
    statuses: &["compliant", "violated", "partial"],
    sort_fields: &[
        ("id", RuleField::Id),
        ("kind", RuleField::Kind),
        ("status", RuleField::Status),
        ("violations", RuleField::Violations),
    ],
    default_sort: None,
    card_rows: None,
};

/// New-rule form. Kind and description are required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDraft {
    pub kind: Option<RuleKind>,
    pub description: String,
    #[serde(default)]
    pub details: String,
}

impl RuleDraft {
    #[must_use]
    pub fn new(kind: RuleKind, description: &str) -> Self {
        Self {
            kind: Some(kind),
            description: description.to_string(),
            details: String::new(),
        }
    }

    #[must_use]
    pub fn details(mut self, details: &str) -> Self {
        self.details = details.to_string();
        self
    }

    pub fn validate(&self) -> std::result::Result<(RuleKind, String, Option<String>), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(self.kind.is_none(), "kind", "Rule type is required");
        let description = self.description.trim();
        errors.check(description.is_empty(), "description", "Description is required");
        let details = Some(self.details.trim())
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        match self.kind {
            Some(kind) if errors.is_empty() => Ok((kind, description.to_string(), details)),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSummary {
    pub total: usize,
    pub compliant: usize,
    pub violated: usize,
    pub partial: usize,
    pub unevaluated: usize,
}

/// Editable collection of expectation rules.
#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    rules: Vec<ExpectationRule>,
    editing: ExpandSet,
}

impl RuleBook {
    #[must_use]
    pub fn seeded() -> Self {
        Self {
            rules: seed_rules(),
            editing: ExpandSet::new(),
        }
    }

    #[must_use]
    pub fn rules(&self) -> &[ExpectationRule] {
        &self.rules
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ExpectationRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    fn unknown(id: &str) -> DashError {
        DashError::UnknownRecord {
            panel: PanelKind::Rules.token(),
            id: id.to_string(),
        }
    }

    /// Next free `rule-<n>` id.
    fn next_id(&self) -> String {
        let max = self
            .rules
            .iter()
            .filter_map(|r| r.id.strip_prefix("rule-")?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        format!("rule-{}", max + 1)
    }

    /// Add a rule. New rules start unevaluated.
    pub fn add(&mut self, draft: &RuleDraft) -> std::result::Result<&ExpectationRule, ValidationErrors> {
        let (kind, description, details) = draft.validate()?;
        let id = self.next_id();
        self.rules.push(ExpectationRule {
            id,
            kind,
            description,
            details,
            status: None,
            traces: Vec::new(),
        });
        Ok(&self.rules[self.rules.len() - 1])
    }

    /// Replace a rule's kind, description and details. Editing the text
    /// invalidates the last evaluation.
    pub fn update(&mut self, id: &str, draft: &RuleDraft) -> Result<std::result::Result<(), ValidationErrors>> {
        let rule = self
            .rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Self::unknown(id))?;
        let (kind, description, details) = match draft.validate() {
            Ok(fields) => fields,
            Err(errors) => return Ok(Err(errors)),
        };
        if rule.description != description || rule.kind != kind {
            rule.status = None;
            rule.traces.clear();
        }
        rule.kind = kind;
        rule.description = description;
        rule.details = details;
        Ok(Ok(()))
    }

    pub fn delete(&mut self, id: &str) -> Result<ExpectationRule> {
        let pos = self
            .rules
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| Self::unknown(id))?;
        self.editing.collapse(id);
        Ok(self.rules.remove(pos))
    }

    /// Flip edit mode for one rule; other rules keep theirs.
    pub fn toggle_edit(&mut self, id: &str) -> Result<bool> {
        if self.get(id).is_none() {
            return Err(Self::unknown(id));
        }
        Ok(self.editing.toggle(id))
    }

    /// Leave edit mode after saving.
    pub fn save(&mut self, id: &str) {
        self.editing.collapse(id);
    }

    #[must_use]
    pub fn is_editing(&self, id: &str) -> bool {
        self.editing.is_expanded(id)
    }

    #[must_use]
    pub fn summary(&self) -> RuleSummary {
        let count = |s: Option<RuleStatus>| self.rules.iter().filter(|r| r.status == s).count();
        RuleSummary {
            total: self.rules.len(),
            compliant: count(Some(RuleStatus::Compliant)),
            violated: count(Some(RuleStatus::Violated)),
            partial: count(Some(RuleStatus::Partial)),
            unevaluated: count(None),
        }
    }
}

impl Panel for RuleBook {
    fn kind(&self) -> PanelKind {
        PanelKind::Rules
    }

    fn facets(&self) -> (&'static [&'static str], &'static [&'static str]) {
        (SCHEMA.categories, SCHEMA.statuses)
    }

    fn sort_fields(&self) -> Vec<&'static str> {
        SCHEMA.sort_fields.iter().map(|(n, _)| *n).collect()
    }

    fn render(&self, query: &PanelQuery, ctx: &RenderContext) -> Result<PanelView> {
        let mut state = SCHEMA.view_state(query, ctx)?;
        query.apply_expansion(&mut state.expanded, self.rules.iter().map(|r| r.id.as_str()));
        let derived = derive_view(&self.rules, &state);
        let summary = self.summary();

        let mut view = PanelView::new(PanelKind::Rules);
        view.tiles = vec![
            Tile::new("Rules", summary.total, Tone::Neutral),
            Tile::new("Compliant", summary.compliant, Tone::Success),
            Tile::new("Violated", summary.violated, Tone::Danger),
            Tile::new("Partial", summary.partial, Tone::Warning),
        ];
        if summary.unevaluated > 0 {
            view.tiles
                .push(Tile::new("Not evaluated", summary.unevaluated, Tone::Muted));
        }
        view.columns = SCHEMA.columns(
            &[
                ("Rule", Some(RuleField::Id)),
                ("Type", Some(RuleField::Kind)),
                ("Description", None),
                ("Status", Some(RuleField::Status)),
                ("Violations", Some(RuleField::Violations)),
            ],
            &state,
        );
        view.rows = derived
            .rows
            .iter()
            .map(|rule| {
                let marker = if self.is_editing(&rule.id) { "✎ " } else { "" };
                let mut detail: Vec<String> = rule.details.iter().cloned().collect();
                detail.extend(
                    rule.traces
                        .iter()
                        .map(|t| format!("{}:{}  {}", t.file, t.line, t.description)),
                );
                Row::new(
                    &rule.id,
                    vec![
                        Cell::plain(format!("{marker}{}", rule.id)),
                        Cell::badge(badge(BadgeKey::RuleKind(rule.kind))),
                        Cell::plain(&rule.description),
                        Cell::badge(badge(BadgeKey::Rule(rule.status))),
                        Cell::toned(
                            rule.violations(),
                            if rule.violations() > 0 { Tone::Danger } else { Tone::Muted },
                        ),
                    ],
                )
                .expandable(state.expanded.is_expanded(&rule.id), detail)
            })
            .collect();
        view.counts_from(&derived);
        Ok(view)
    }
}

fn trace(file: &str, line: u32, description: &str) -> RuleTrace {
    RuleTrace {
        file: file.to_string(),
        line,
        description: description.to_string(),
    }
}

fn seed_rules() -> Vec<ExpectationRule> {
    let rule = |n: u8, kind, description: &str, details: &str, status, traces| ExpectationRule {
        id: format!("rule-{n}"),
        kind,
        description: description.to_string(),
        details: Some(details.to_string()),
        status: Some(status),
        traces,
    };
    vec![
        rule(
            1,
            RuleKind::Dependency,
            "Services should not directly depend on repositories from other domains",
            "Use service interfaces to communicate between domains",
            RuleStatus::Violated,
            vec![
                trace("src/services/payment/PaymentService.ts", 45, "Direct import of UserRepository"),
                trace("src/services/notification/EmailService.ts", 28, "Direct import of OrderRepository"),
                trace("src/services/analytics/AnalyticsService.ts", 67, "Direct import of ProductRepository"),
            ],
        ),
        rule(
            2,
            RuleKind::Layer,
            "Domain layer should not depend on external layers",
            "Domain entities should be pure and not contain infrastructure concerns",
            RuleStatus::Compliant,
            Vec::new(),
        ),
        rule(
            3,
            RuleKind::Pattern,
            "Use Repository Pattern for data access",
            "All data access should go through repository interfaces",
            RuleStatus::Compliant,
            Vec::new(),
        ),
        rule(
            4,
            RuleKind::Dependency,
            "Controllers should use dependency injection for services",
            "Services are provided through constructors, never instantiated inline",
            RuleStatus::Partial,
            vec![trace("src/controllers/UserController.ts", 23, "Direct instantiation of UserService")],
        ),
        rule(
            5,
            RuleKind::Pattern,
            "All entities must implement proper validation",
            "Entities validate their invariants on construction",
            RuleStatus::Violated,
            vec![
                trace("src/domain/order/Order.ts", 56, "Missing validation for order items"),
                trace("src/domain/payment/Payment.ts", 34, "Missing validation for payment amount"),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ctx() -> RenderContext {
        RenderContext::at(NaiveDate::from_ymd_opt(2025, 4, 10).unwrap())
    }

    #[test]
    fn add_requires_kind_and_description() {
        let mut book = RuleBook::seeded();
        let errors = book.add(&RuleDraft::default()).unwrap_err();
        assert_eq!(errors.get("kind"), Some("Rule type is required"));
        assert_eq!(errors.get("description"), Some("Description is required"));
        let blank = RuleDraft::new(RuleKind::Naming, "   ");
        assert!(book.add(&blank).is_err());
        assert_eq!(book.rules().len(), 5);
    }

    #[test]
    fn add_assigns_next_id_and_starts_unevaluated() {
        let mut book = RuleBook::seeded();
        let rule = book
            .add(&RuleDraft::new(RuleKind::Naming, "Interfaces start with I").details("  "))
            .unwrap();
        assert_eq!(rule.id, "rule-6");
        assert_eq!(rule.status, None);
        assert_eq!(rule.details, None);
        book.delete("rule-6").unwrap();
        book.delete("rule-2").unwrap();
        let again = book
            .add(&RuleDraft::new(RuleKind::Layer, "UI never touches storage"))
            .unwrap();
        assert_eq!(again.id, "rule-6");
    }

    #[test]
    fn update_rewrites_and_resets_evaluation() {
        let mut book = RuleBook::seeded();
        book.update("rule-1", &RuleDraft::new(RuleKind::Dependency, "No cross-domain repositories"))
            .unwrap()
            .unwrap();
        let rule = book.get("rule-1").unwrap();
        assert_eq!(rule.status, None);
        assert!(rule.traces.is_empty());
        assert!(book.update("rule-1", &RuleDraft::default()).unwrap().is_err());
        assert_eq!(
            book.update("rule-9", &RuleDraft::default()).unwrap_err().code(),
            "C2S-2004"
        );
    }

    #[test]
    fn edit_mode_is_per_rule() {
        let mut book = RuleBook::seeded();
        assert!(book.toggle_edit("rule-1").unwrap());
        assert!(book.toggle_edit("rule-3").unwrap());
        assert!(book.is_editing("rule-1") && book.is_editing("rule-3"));
        book.save("rule-1");
        assert!(!book.is_editing("rule-1"));
        assert!(book.is_editing("rule-3"));
        assert!(book.toggle_edit("nope").is_err());
    }

    #[test]
    fn summary_and_status_facet() {
        let book = RuleBook::seeded();
        let s = book.summary();
        assert_eq!((s.compliant, s.violated, s.partial, s.unevaluated), (2, 2, 1, 0));
        let view = book
            .render(&PanelQuery::default().status("violated"), &ctx())
            .unwrap();
        assert_eq!(view.row_ids(), vec!["rule-1", "rule-5"]);
    }

    #[test]
    fn expanded_rules_show_traces() {
        let view = RuleBook::seeded()
            .render(&PanelQuery::default().expand("rule-1").expand("rule-4"), &ctx())
            .unwrap();
        let r1 = view.rows.iter().find(|r| r.id == "rule-1").unwrap();
        assert_eq!(r1.detail.len(), 4);
        assert!(r1.detail[1].starts_with("src/services/payment/PaymentService.ts:45"));
        assert!(view.rows.iter().find(|r| r.id == "rule-4").unwrap().expanded);
    }

    #[test]
    fn sort_by_violations_descending() {
        let view = RuleBook::seeded()
            .render(&PanelQuery::default().sort("violations").sort("violations"), &ctx())
            .unwrap();
        assert_eq!(view.row_ids()[0], "rule-1");
    }

    #[test]
    fn collapse_survives_expand_all() {
        let mut q = PanelQuery::default().full_page();
        q.expand_all = true;
        q.collapse.push("rule-1".to_string());
        let view = RuleBook::seeded().render(&q, &ctx()).unwrap();
        for row in &view.rows {
            assert_eq!(row.expanded, row.id != "rule-1", "{}", row.id);
        }
    }
}
