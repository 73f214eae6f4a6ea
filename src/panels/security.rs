//! Security assessment: findings grouped by category with a penalty score.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use super::badges::{BadgeKey, badge};
use super::{Cell, Panel, PanelKind, PanelQuery, PanelSchema, PanelView, RenderContext, Row, Tile};
use crate::core::errors::Result;
use crate::panel::badge::Tone;
use crate::panel::query::Record;
use crate::panel::sort::SortValue;
use crate::panel::view::derive_view;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Self; 4] = [Self::Critical, Self::High, Self::Medium, Self::Low];

    /// Score penalty per unresolved finding.
    #[must_use]
    pub const fn penalty(self) -> u32 {
        match self {
            Self::Critical => 15,
            Self::High => 10,
            Self::Medium => 5,
            Self::Low => 2,
        }
    }

    /// 0 is most severe.
    #[must_use]
    pub const fn rank(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingStatus {
    Open,
    InProgress,
    Resolved,
    AcceptedRisk,
}

impl FindingStatus {
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::AcceptedRisk => "accepted_risk",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingCategory {
    Vulnerability,
    Misconfiguration,
    Secret,
    Compliance,
    Iam,
}

impl FindingCategory {
    pub const ALL: [Self; 5] = [
        Self::Vulnerability,
        Self::Misconfiguration,
        Self::Secret,
        Self::Compliance,
        Self::Iam,
    ];

    /// Group name; also the category facet value and the expand id.
    #[must_use]
    pub const fn group(self) -> &'static str {
        match self {
            Self::Vulnerability => "vulnerabilities",
            Self::Misconfiguration => "misconfigurations",
            Self::Secret => "secrets",
            Self::Compliance => "compliance",
            Self::Iam => "iam",
        }
    }
}

/// Band of the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    /// `>= 90`.
    Strong,
    /// `>= 70`.
    Fair,
    Weak,
}

impl ScoreBand {
    #[must_use]
    pub const fn of(score: u32) -> Self {
        if score >= 90 {
            Self::Strong
        } else if score >= 70 {
            Self::Fair
        } else {
            Self::Weak
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub category: FindingCategory,
    pub status: FindingStatus,
    pub resource: String,
    pub remediation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindingField {
    Title,
    Severity,
    Status,
    Resource,
}

impl Record for Finding {
    type Field = FindingField;

    fn record_id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.title, &self.description, &self.resource]
            .into_iter()
            .map(String::as_str)
            .collect()
    }

    fn category(&self) -> Option<&str> {
        Some(self.category.group())
    }

    fn status(&self) -> Option<&str> {
        Some(self.status.token())
    }

    fn sort_value(&self, field: FindingField) -> SortValue<'_> {
        match field {
            FindingField::Title => SortValue::Text(&self.title),
            FindingField::Severity => SortValue::Number(f64::from(self.severity.rank())),
            FindingField::Status => SortValue::Text(self.status.token()),
            FindingField::Resource => SortValue::Text(&self.resource),
        }
    }
}

pub const SCHEMA: PanelSchema<FindingField> = PanelSchema {
    kind: PanelKind::Security,
    categories: &["vulnerabilities", "misconfigurations", "secrets", "compliance", "iam"],
    statuses: &["open", "in_progress", "resolved", "accepted_risk"],
    sort_fields: &[
        ("title", FindingField::Title),
        ("severity", FindingField::Severity),
        ("status", FindingField::Status),
        ("resource", FindingField::Resource),
    ],
    default_sort: None,
    card_rows: None,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTally {
    pub category: FindingCategory,
    pub resolved: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecuritySummary {
    pub total: usize,
    /// Unresolved findings per severity, most severe first.
    pub open_by_severity: [(Severity, usize); 4],
    pub resolved: usize,
    /// `max(0, 100 - Σ penalty × unresolved)`.
    pub score: u32,
    pub categories: Vec<CategoryTally>,
}

impl SecuritySummary {
    #[must_use]
    pub fn open(&self, severity: Severity) -> usize {
        self.open_by_severity
            .iter()
            .find(|(s, _)| *s == severity)
            .map_or(0, |(_, n)| *n)
    }
}

#[derive(Debug, Clone)]
pub struct SecurityPanel {
    pub findings: Vec<Finding>,
}

impl SecurityPanel {
    #[must_use]
    pub fn seeded() -> Self {
        Self {
            findings: seed_findings(),
        }
    }

    #[must_use]
    pub fn summary(&self) -> SecuritySummary {
        let unresolved = |sev: Severity| {
            self.findings
                .iter()
                .filter(|f| f.severity == sev && f.status != FindingStatus::Resolved)
                .count()
        };
        let open_by_severity = Severity::ALL.map(|s| (s, unresolved(s)));
        let penalty: u32 = open_by_severity
            .iter()
            .map(|(s, n)| s.penalty().saturating_mul(u32::try_from(*n).unwrap_or(u32::MAX)))
            .fold(0, u32::saturating_add);
        let categories = FindingCategory::ALL
            .iter()
            .map(|&category| {
                let members = self.findings.iter().filter(|f| f.category == category);
                CategoryTally {
                    category,
                    resolved: members
                        .clone()
                        .filter(|f| f.status == FindingStatus::Resolved)
                        .count(),
                    total: members.count(),
                }
            })
            .filter(|t| t.total > 0)
            .collect();
        SecuritySummary {
            total: self.findings.len(),
            open_by_severity,
            resolved: self
                .findings
                .iter()
                .filter(|f| f.status == FindingStatus::Resolved)
                .count(),
            score: 100u32.saturating_sub(penalty),
            categories,
        }
    }
}

impl Panel for SecurityPanel {
    fn kind(&self) -> PanelKind {
        PanelKind::Security
    }

    fn facets(&self) -> (&'static [&'static str], &'static [&'static str]) {
        (SCHEMA.categories, SCHEMA.statuses)
    }

    fn sort_fields(&self) -> Vec<&'static str> {
        SCHEMA.sort_fields.iter().map(|(n, _)| *n).collect()
    }

    fn render(&self, query: &PanelQuery, ctx: &RenderContext) -> Result<PanelView> {
        let mut state = SCHEMA.view_state(query, ctx)?;
        // Groups start open; only an explicit collapse closes one.
        for category in FindingCategory::ALL {
            if !query.collapse.iter().any(|c| c == category.group()) {
                state.expanded.expand(category.group());
            }
        }
        let derived = derive_view(&self.findings, &state);
        let summary = self.summary();

        let mut view = PanelView::new(PanelKind::Security);
        view.tiles = vec![Tile::new(
            "Security score",
            format!("{}/100", summary.score),
            badge(BadgeKey::Score(ScoreBand::of(summary.score))).tone,
        )];
        view.tiles.extend(summary.open_by_severity.iter().map(|(sev, n)| {
            let b = badge(BadgeKey::Severity(*sev));
            Tile::new(b.label, n, b.tone)
        }));
        view.tiles
            .push(Tile::new("Resolved", summary.resolved, Tone::Success));
        view.columns = SCHEMA.columns(
            &[
                ("Finding", Some(FindingField::Title)),
                ("Severity", Some(FindingField::Severity)),
                ("Status", Some(FindingField::Status)),
                ("Resource", Some(FindingField::Resource)),
            ],
            &state,
        );

        for tally in &summary.categories {
            let group = tally.category.group();
            let members: Vec<&Finding> = derived
                .rows
                .iter()
                .copied()
                .filter(|f| f.category == tally.category)
                .collect();
            if members.is_empty() && !state.filter.is_pass_through() {
                continue;
            }
            let expanded = state.expanded.is_expanded(group);
            view.rows.push(
                Row::new(
                    group,
                    vec![
                        Cell::badge(badge(BadgeKey::FindingCategory(tally.category))),
                        Cell::plain(""),
                        Cell::plain(""),
                        Cell::toned(
                            format!("{} / {} resolved", tally.resolved, tally.total),
                            Tone::Muted,
                        ),
                    ],
                )
                .expandable(expanded, Vec::new()),
            );
            if !expanded {
                continue;
            }
            view.rows.extend(members.into_iter().map(|f| {
                let mut row = Row::new(
                    &f.id,
                    vec![
                        Cell::plain(&f.title),
                        Cell::badge(badge(BadgeKey::Severity(f.severity))),
                        Cell::badge(badge(BadgeKey::Finding(f.status))),
                        Cell::toned(&f.resource, Tone::Muted),
                    ],
                )
                .depth(1);
                row.detail = vec![
                    f.description.clone(),
                    format!("Remediation: {}", f.remediation),
                ];
                row
            }));
        }
        view.counts_from(&derived);
        Ok(view)
    }
}

#[allow(clippy::too_many_arguments)]
fn finding(
    id: &str,
    title: &str,
    description: &str,
    severity: Severity,
    category: FindingCategory,
    status: FindingStatus,
    resource: &str,
    remediation: &str,
) -> Finding {
    Finding {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        severity,
        category,
        status,
        resource: resource.to_string(),
        remediation: remediation.to_string(),
    }
}

fn seed_findings() -> Vec<Finding> {
    use FindingCategory::{Compliance, Iam, Misconfiguration, Secret, Vulnerability};
    use FindingStatus::{AcceptedRisk, InProgress, Open, Resolved};
    use Severity::{Critical, High, Medium};
    vec![
        finding("v1", "Outdated Node.js dependencies with known vulnerabilities", "Several Node.js dependencies have known security vulnerabilities that could be exploited.", High, Vulnerability, Open, "package.json", "Update affected dependencies to their latest secure versions."),
        finding("v2", "Vulnerable Docker base image", "The Docker base image contains known vulnerabilities that could be exploited.", Medium, Vulnerability, InProgress, "Dockerfile", "Update the base image to a more recent, secure version."),
        finding("m1", "Kubernetes pods running as root", "Containers are running as root, which increases the potential impact of a container escape.", High, Misconfiguration, Open, "k8s/deployment.yaml", "Configure containers to run as non-root users with appropriate permissions."),
        finding("m2", "Insecure S3 bucket configuration", "S3 bucket has public read access enabled, which could expose sensitive data.", Critical, Misconfiguration, Open, "terraform/storage.tf", "Disable public access and implement proper access controls."),
        finding("m3", "Missing resource limits in Kubernetes", "Kubernetes deployments are missing resource limits, which could lead to resource exhaustion.", Medium, Misconfiguration, InProgress, "k8s/deployment.yaml", "Define appropriate CPU and memory limits for all containers."),
        finding("s1", "Hardcoded API key in configuration file", "An API key is hardcoded in a configuration file, which is a security risk.", Critical, Secret, Open, "config/production.js", "Move the API key to a secure secret management solution."),
        finding("c1", "Missing HTTPS configuration", "Application is configured to use HTTP instead of HTTPS for communication.", High, Compliance, Resolved, "k8s/ingress.yaml", "Configure HTTPS with valid certificates for all external endpoints."),
        finding("c2", "Insufficient logging configuration", "Logging configuration does not capture security-relevant events as required by compliance standards.", Medium, Compliance, Open, "config/logging.js", "Enhance logging to capture authentication, authorization, and data access events."),
        finding("i1", "Overly permissive IAM roles", "IAM roles have excessive permissions that violate the principle of least privilege.", High, Iam, InProgress, "terraform/iam.tf", "Review and restrict IAM policies to only the necessary permissions."),
        finding("i2", "Missing MFA for privileged accounts", "Multi-factor authentication is not enforced for accounts with elevated privileges.", High, Iam, AcceptedRisk, "AWS IAM", "Enable and enforce MFA for all accounts with administrative or elevated privileges."),
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
    fn score_penalizes_unresolved_findings() {
        let s = SecurityPanel::seeded().summary();
        assert_eq!(s.open(Severity::Critical), 2);
        // c1 is high but resolved.
        assert_eq!(s.open(Severity::High), 4);
        assert_eq!(s.open(Severity::Medium), 3);
        assert_eq!(s.open(Severity::Low), 0);
        assert_eq!(s.resolved, 1);
        assert_eq!(s.score, 15);
        assert_eq!(ScoreBand::of(s.score), ScoreBand::Weak);
    }

    #[test]
    fn score_never_goes_negative() {
        let mut panel = SecurityPanel::seeded();
        for f in &mut panel.findings {
            f.severity = Severity::Critical;
            f.status = FindingStatus::Open;
        }
        assert_eq!(panel.summary().score, 0);
    }

    #[test]
    fn per_category_resolved_ratio() {
        let view = SecurityPanel::seeded()
            .render(&PanelQuery::default(), &ctx())
            .unwrap();
        let compliance = view.rows.iter().find(|r| r.id == "compliance").unwrap();
        assert_eq!(compliance.cells[3].text, "1 / 2 resolved");
        assert!(compliance.expanded);
    }

    #[test]
    fn groups_start_expanded_and_collapse_independently() {
        let mut q = PanelQuery::default();
        q.collapse.push("secrets".to_string());
        let view = SecurityPanel::seeded().render(&q, &ctx()).unwrap();
        assert!(!view.row_ids().contains(&"s1"));
        assert!(view.row_ids().contains(&"m2"));
        assert_eq!(view.rows.len(), 5 + 9);
    }

    #[test]
    fn status_filter_hides_empty_groups_but_keeps_tiles() {
        let all = SecurityPanel::seeded()
            .render(&PanelQuery::default(), &ctx())
            .unwrap();
        let view = SecurityPanel::seeded()
            .render(&PanelQuery::default().status("resolved"), &ctx())
            .unwrap();
        assert_eq!(view.row_ids(), vec!["compliance", "c1"]);
        assert_eq!(view.matched, 1);
        assert_eq!(all.tiles, view.tiles);
    }

    #[test]
    fn sort_by_severity_puts_critical_first() {
        let view = SecurityPanel::seeded()
            .render(&PanelQuery::default().sort("severity").category("misconfigurations"), &ctx())
            .unwrap();
        assert_eq!(view.row_ids(), vec!["misconfigurations", "m2", "m1", "m3"]);
    }
}
