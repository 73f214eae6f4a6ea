//! Report export: generate and schedule requests, their validation, and a
//! panel that shows the section picker.

#![allow(missing_docs)]

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Cell, Column, Panel, PanelKind, PanelQuery, PanelView, RenderContext, Row, Tile};
use crate::core::errors::{DashError, Result};
use crate::panel::badge::Tone;
use crate::panel::form::ValidationErrors;

/// Name used when the request leaves it blank.
pub const DEFAULT_REPORT_NAME: &str = "Engineering Report";

// ──────────────────── choices ────────────────────

/// `(token, label)` pairs for each choice list.
pub const REPORT_TYPES: &[(&str, &str)] = &[
    ("summary", "Summary Report"),
    ("detailed", "Detailed Report"),
    ("executive", "Executive Report"),
    ("custom", "Custom Report"),
];

pub const FORMATS: &[(&str, &str)] = &[
    ("pdf", "PDF"),
    ("excel", "Excel"),
    ("csv", "CSV"),
    ("json", "JSON"),
    ("html", "HTML"),
];

pub const FREQUENCIES: &[(&str, &str)] = &[
    ("daily", "Daily"),
    ("weekly", "Weekly"),
    ("biweekly", "Bi-weekly"),
    ("monthly", "Monthly"),
    ("quarterly", "Quarterly"),
];

/// `(id, label, selected by default)`.
pub const SECTIONS: &[(&str, &str, bool)] = &[
    ("overview", "Overview", true),
    ("code_quality", "Code Quality", true),
    ("complexity", "Complexity", true),
    ("coverage", "Test Coverage", true),
    ("issues", "Issues", true),
    ("trends", "Trends", false),
    ("recommendations", "Recommendations", true),
];

fn is_choice(options: &[(&str, &str)], value: &str) -> bool {
    options.iter().any(|(token, _)| *token == value)
}

fn default_sections() -> Vec<String> {
    SECTIONS
        .iter()
        .filter(|(_, _, on)| *on)
        .map(|(id, _, _)| (*id).to_string())
        .collect()
}

fn looks_like_email(address: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@,]+@[^\s@,]+\.[^\s@,]+$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(address))
}

// ──────────────────── requests ────────────────────

/// One-off report generation, as entered in the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportRequest {
    pub report_type: String,
    pub format: String,
    pub sections: Vec<String>,
    pub name: String,
    pub description: String,
}

impl Default for ReportRequest {
    fn default() -> Self {
        Self {
            report_type: "summary".to_string(),
            format: "pdf".to_string(),
            sections: default_sections(),
            name: String::new(),
            description: String::new(),
        }
    }
}

impl ReportRequest {
    /// Select or deselect a section, keeping picker order.
    pub fn toggle_section(&mut self, id: &str) {
        if let Some(i) = self.sections.iter().position(|s| s == id) {
            self.sections.remove(i);
        } else {
            self.sections.push(id.to_string());
            self.sections.sort_by_key(|s| {
                SECTIONS
                    .iter()
                    .position(|(known, _, _)| known == s)
                    .unwrap_or(usize::MAX)
            });
        }
    }

    /// Name as it will appear on the report.
    #[must_use]
    pub fn effective_name(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() { DEFAULT_REPORT_NAME } else { name }
    }

    fn check(&self, errors: &mut ValidationErrors) {
        errors.check(
            !is_choice(REPORT_TYPES, &self.report_type),
            "report_type",
            "Unknown report type",
        );
        errors.check(!is_choice(FORMATS, &self.format), "format", "Unknown file format");
        errors.check(
            self.sections.is_empty(),
            "sections",
            "Select at least one section",
        );
        for (i, section) in self.sections.iter().enumerate() {
            errors.check(
                !SECTIONS.iter().any(|(id, _, _)| id == section),
                format!("sections[{i}]"),
                "Unknown section",
            );
        }
    }

    /// Every field-level problem, or the request with its name filled in.
    pub fn validate(&self) -> std::result::Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.check(&mut errors);
        errors.into_result(Self {
            name: self.effective_name().to_string(),
            ..self.clone()
        })
    }
}

/// Recurring report delivered by email.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleRequest {
    #[serde(flatten)]
    pub report: ReportRequest,
    pub frequency: String,
    /// Comma separated, as typed.
    pub recipients: String,
}

/// A schedule that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidSchedule {
    #[serde(flatten)]
    pub report: ReportRequest,
    pub frequency: String,
    pub recipients: Vec<String>,
}

impl ScheduleRequest {
    /// Recipients split on commas and trimmed; blanks dropped.
    #[must_use]
    pub fn recipient_list(&self) -> Vec<String> {
        self.recipients
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn validate(&self) -> std::result::Result<ValidSchedule, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.report.check(&mut errors);
        if self.frequency.trim().is_empty() {
            errors.push("frequency", "Frequency is required");
        } else {
            errors.check(
                !is_choice(FREQUENCIES, &self.frequency),
                "frequency",
                "Unknown frequency",
            );
        }
        let recipients = self.recipient_list();
        errors.check(
            recipients.is_empty(),
            "recipients",
            "At least one recipient is required",
        );
        for (i, address) in recipients.iter().enumerate() {
            errors.check(
                !looks_like_email(address),
                format!("recipients[{i}]"),
                "Not an email address",
            );
        }
        errors.into_result(ValidSchedule {
            report: ReportRequest {
                name: self.report.effective_name().to_string(),
                ..self.report.clone()
            },
            frequency: self.frequency.clone(),
            recipients,
        })
    }
}

// ──────────────────── panel ────────────────────

/// Section picker. `expand` ids toggle sections against the defaults; the
/// `schedule` tab also lists frequencies.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportPanel;

impl ReportPanel {
    /// The request the panel would submit for `query`.
    pub fn request_for(query: &PanelQuery) -> Result<ReportRequest> {
        let mut request = ReportRequest::default();
        for id in &query.expand {
            if !SECTIONS.iter().any(|(known, _, _)| known == id) {
                return Err(DashError::InvalidFacet {
                    panel: PanelKind::Reports.token(),
                    axis: "section",
                    value: id.clone(),
                });
            }
            request.toggle_section(id);
        }
        Ok(request)
    }
}

impl Panel for ReportPanel {
    fn kind(&self) -> PanelKind {
        PanelKind::Reports
    }

    fn tabs(&self) -> &'static [&'static str] {
        &["generate", "schedule"]
    }

    fn render(&self, query: &PanelQuery, _ctx: &RenderContext) -> Result<PanelView> {
        let scheduling = match query.tab.as_deref() {
            None | Some("generate") => false,
            Some("schedule") => true,
            Some(other) => {
                return Err(DashError::InvalidFacet {
                    panel: PanelKind::Reports.token(),
                    axis: "tab",
                    value: other.to_string(),
                });
            }
        };
        let request = Self::request_for(query)?;

        let mut view = PanelView::new(PanelKind::Reports);
        view.tiles = vec![
            Tile::new("Report types", REPORT_TYPES.len(), Tone::Neutral),
            Tile::new("Formats", FORMATS.len(), Tone::Neutral),
            Tile::new("Sections", request.sections.len(), Tone::Accent),
        ];
        view.columns = ["", "Section", "Id"]
            .iter()
            .map(|label| Column {
                label: (*label).to_string(),
                sort: None,
                sortable: false,
            })
            .collect();
        view.rows = SECTIONS
            .iter()
            .map(|(id, label, _)| {
                let on = request.sections.iter().any(|s| s == id);
                Row::new(
                    id,
                    vec![
                        if on {
                            Cell::toned("[x]", Tone::Success)
                        } else {
                            Cell::toned("[ ]", Tone::Muted)
                        },
                        Cell::plain(label),
                        Cell::toned(id, Tone::Muted),
                    ],
                )
            })
            .collect();
        view.matched = view.rows.len();
        view.total = view.rows.len();

        let list = |options: &[(&str, &str)]| {
            options
                .iter()
                .map(|(_, label)| *label)
                .collect::<Vec<_>>()
                .join(", ")
        };
        view.notes.push(format!("Report types: {}", list(REPORT_TYPES)));
        view.notes.push(format!("Formats: {}", list(FORMATS)));
        if scheduling {
            view.notes.push(format!("Frequencies: {}", list(FREQUENCIES)));
        }
        if request.sections.is_empty() {
            view.notes
                .push("Select at least one section to generate a report.".to_string());
        }
        Ok(view)
    }
}
