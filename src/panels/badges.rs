//! The one badge table every panel draws from.
//!
//! Each categorical value a panel shows maps to exactly one [`Badge`] here,
//! so the same status never reads differently in two places.

#![allow(missing_docs)]

use super::activity::Intensity;
use super::capabilities::CapabilityStatus;
use super::configuration::{ConfigKind, Environment};
use super::rules::{RuleKind, RuleStatus};
use super::security::{FindingCategory, FindingStatus, ScoreBand, Severity};
use super::traceability::{RequirementType, TraceStatus};
use crate::panel::aggregate::CoverageBand;
use crate::panel::badge::{Badge, Tone};
use crate::panel::graph::Treatment;

/// Every categorical value that has a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadgeKey {
    Trace(TraceStatus),
    Requirement(RequirementType),
    Coverage(CoverageBand),
    Capability(CapabilityStatus),
    Severity(Severity),
    Finding(FindingStatus),
    FindingCategory(FindingCategory),
    Score(ScoreBand),
    ConfigKind(ConfigKind),
    Environment(Environment),
    /// `None` is a rule nobody has evaluated yet.
    Rule(Option<RuleStatus>),
    RuleKind(RuleKind),
    Intensity(Intensity),
    Graph(Treatment),
}

/// Look up the badge for a value.
#[must_use]
pub const fn badge(key: BadgeKey) -> Badge {
    use Tone::{Accent, Critical, Danger, Muted, Neutral, Success, Warning};
    match key {
        BadgeKey::Trace(s) => match s {
            TraceStatus::Complete => Badge::new(Success, "✓", "Complete"),
            TraceStatus::Partial => Badge::new(Warning, "◐", "Partial"),
            TraceStatus::Missing => Badge::new(Danger, "✗", "Missing"),
        },
        BadgeKey::Requirement(t) => match t {
            RequirementType::Functional => Badge::new(Accent, "", "Functional"),
            RequirementType::NonFunctional => Badge::new(Muted, "", "Non-Functional"),
            RequirementType::BusinessRule => Badge::new(Warning, "", "Business Rule"),
            RequirementType::UserStory => Badge::new(Success, "", "User Story"),
        },
        BadgeKey::Coverage(b) => match b {
            CoverageBand::Good => Badge::new(Success, "●", "Good"),
            CoverageBand::Partial => Badge::new(Warning, "●", "Fair"),
            CoverageBand::Missing => Badge::new(Danger, "●", "Low"),
        },
        BadgeKey::Capability(s) => match s {
            CapabilityStatus::Implemented => Badge::new(Success, "✓", "Implemented"),
            CapabilityStatus::Partial => Badge::new(Warning, "◐", "Partial"),
            CapabilityStatus::Missing => Badge::new(Danger, "✗", "Missing"),
        },
        BadgeKey::Severity(s) => match s {
            Severity::Critical => Badge::new(Critical, "✗", "Critical"),
            Severity::High => Badge::new(Danger, "▲", "High"),
            Severity::Medium => Badge::new(Warning, "▲", "Medium"),
            Severity::Low => Badge::new(Accent, "▲", "Low"),
        },
        BadgeKey::Finding(s) => match s {
            FindingStatus::Open => Badge::new(Danger, "✗", "Open"),
            FindingStatus::InProgress => Badge::new(Accent, "…", "In Progress"),
            FindingStatus::Resolved => Badge::new(Success, "✓", "Resolved"),
            FindingStatus::AcceptedRisk => Badge::new(Muted, "!", "Accepted Risk"),
        },
        BadgeKey::FindingCategory(c) => match c {
            FindingCategory::Vulnerability => Badge::new(Neutral, "⚠", "Vulnerabilities"),
            FindingCategory::Misconfiguration => Badge::new(Neutral, "⚙", "Misconfigurations"),
            FindingCategory::Secret => Badge::new(Neutral, "⚿", "Secrets"),
            FindingCategory::Compliance => Badge::new(Neutral, "✓", "Compliance"),
            FindingCategory::Iam => Badge::new(Neutral, "⛨", "IAM"),
        },
        BadgeKey::Score(b) => match b {
            ScoreBand::Strong => Badge::new(Success, "●", "Strong"),
            ScoreBand::Fair => Badge::new(Warning, "●", "Fair"),
            ScoreBand::Weak => Badge::new(Danger, "●", "Weak"),
        },
        BadgeKey::ConfigKind(k) => match k {
            ConfigKind::Env => Badge::new(Accent, "", "ENV"),
            ConfigKind::Config => Badge::new(Muted, "", "CONFIG"),
            ConfigKind::Secret => Badge::new(Danger, "", "SECRET"),
        },
        BadgeKey::Environment(e) => match e {
            Environment::Production => Badge::new(Success, "", "PROD"),
            Environment::Staging => Badge::new(Warning, "", "STAGING"),
            Environment::Development => Badge::new(Accent, "", "DEV"),
            Environment::Testing => Badge::new(Muted, "", "TEST"),
        },
        BadgeKey::Rule(s) => match s {
            Some(RuleStatus::Compliant) => Badge::new(Success, "✓", "Compliant"),
            Some(RuleStatus::Violated) => Badge::new(Danger, "✗", "Violated"),
            Some(RuleStatus::Partial) => Badge::new(Warning, "⚠", "Partially Compliant"),
            None => Badge::new(Muted, "·", "Not evaluated"),
        },
        BadgeKey::RuleKind(k) => match k {
            RuleKind::Dependency => Badge::new(Neutral, "", "Dependency Rule"),
            RuleKind::Layer => Badge::new(Neutral, "", "Layer Rule"),
            RuleKind::Pattern => Badge::new(Neutral, "", "Design Pattern Rule"),
            RuleKind::Naming => Badge::new(Neutral, "", "Naming Convention"),
        },
        BadgeKey::Intensity(i) => match i {
            Intensity::None => Badge::new(Muted, "·", "none"),
            Intensity::Low => Badge::new(Success, "░", "low"),
            Intensity::Medium => Badge::new(Success, "▒", "medium"),
            Intensity::High => Badge::new(Success, "▓", "high"),
            Intensity::Peak => Badge::new(Success, "█", "peak"),
        },
        BadgeKey::Graph(t) => match t {
            Treatment::Highlighted => Badge::new(Accent, "◆", "highlighted"),
            Treatment::Dimmed => Badge::new(Muted, "·", "dimmed"),
            Treatment::Normal => Badge::new(Neutral, "○", "normal"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_share_tones_across_panels() {
        assert_eq!(
            badge(BadgeKey::Trace(TraceStatus::Complete)).tone,
            badge(BadgeKey::Capability(CapabilityStatus::Implemented)).tone
        );
        assert_eq!(
            badge(BadgeKey::Coverage(CoverageBand::Missing)).tone,
            badge(BadgeKey::Capability(CapabilityStatus::Missing)).tone
        );
    }

    #[test]
    fn labels_are_the_display_text() {
        assert_eq!(badge(BadgeKey::Environment(Environment::Production)).label, "PROD");
        assert_eq!(badge(BadgeKey::ConfigKind(ConfigKind::Secret)).label, "SECRET");
        assert_eq!(
            badge(BadgeKey::Finding(FindingStatus::AcceptedRisk)).text(true),
            "! Accepted Risk"
        );
        assert_eq!(badge(BadgeKey::Rule(None)).label, "Not evaluated");
    }

    #[test]
    fn critical_outranks_high() {
        assert_eq!(badge(BadgeKey::Severity(Severity::Critical)).tone, Tone::Critical);
        assert_eq!(badge(BadgeKey::Severity(Severity::High)).tone, Tone::Danger);
    }
}
