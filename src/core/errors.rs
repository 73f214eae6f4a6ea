//! C2S-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, DashError>;

/// Top-level error type for the c2s dashboard.
#[derive(Debug, Error)]
pub enum DashError {
    #[error("[C2S-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[C2S-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[C2S-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[C2S-2001] unknown panel: {name}")]
    UnknownPanel { name: String },

    #[error("[C2S-2002] invalid {axis} value {value:?} for panel {panel}")]
    InvalidFacet {
        panel: &'static str,
        axis: &'static str,
        value: String,
    },

    #[error("[C2S-2003] unknown time window: {value}")]
    InvalidWindow { value: String },

    #[error("[C2S-2004] unknown record {id} in {panel}")]
    UnknownRecord { panel: &'static str, id: String },

    #[error("[C2S-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[C2S-2102] date parse failure: {details}")]
    DateParse { details: String },

    #[error("[C2S-3001] action {action} failed: {details}")]
    ActionFailed {
        action: &'static str,
        details: String,
    },

    #[error("[C2S-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[C2S-3003] channel closed in component {component}")]
    ChannelClosed { component: &'static str },

    #[error("[C2S-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl DashError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "C2S-1001",
            Self::MissingConfig { .. } => "C2S-1002",
            Self::ConfigParse { .. } => "C2S-1003",
            Self::UnknownPanel { .. } => "C2S-2001",
            Self::InvalidFacet { .. } => "C2S-2002",
            Self::InvalidWindow { .. } => "C2S-2003",
            Self::UnknownRecord { .. } => "C2S-2004",
            Self::Serialization { .. } => "C2S-2101",
            Self::DateParse { .. } => "C2S-2102",
            Self::ActionFailed { .. } => "C2S-3001",
            Self::Io { .. } => "C2S-3002",
            Self::ChannelClosed { .. } => "C2S-3003",
            Self::Runtime { .. } => "C2S-3900",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Io { .. }
                | Self::ChannelClosed { .. }
                | Self::ActionFailed { .. }
                | Self::Runtime { .. }
        )
    }

    /// Whether the failure stems from user input rather than the environment.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownPanel { .. }
                | Self::InvalidFacet { .. }
                | Self::InvalidWindow { .. }
                | Self::UnknownRecord { .. }
                | Self::InvalidConfig { .. }
                | Self::MissingConfig { .. }
                | Self::ConfigParse { .. }
                | Self::DateParse { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for DashError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for DashError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<chrono::ParseError> for DashError {
    fn from(value: chrono::ParseError) -> Self {
        Self::DateParse {
            details: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn every_variant() -> Vec<DashError> {
        vec![
            DashError::InvalidConfig {
                details: String::new(),
            },
            DashError::MissingConfig {
                path: PathBuf::new(),
            },
            DashError::ConfigParse {
                context: "",
                details: String::new(),
            },
            DashError::UnknownPanel {
                name: String::new(),
            },
            DashError::InvalidFacet {
                panel: "",
                axis: "",
                value: String::new(),
            },
            DashError::InvalidWindow {
                value: String::new(),
            },
            DashError::UnknownRecord {
                panel: "",
                id: String::new(),
            },
            DashError::Serialization {
                context: "",
                details: String::new(),
            },
            DashError::DateParse {
                details: String::new(),
            },
            DashError::ActionFailed {
                action: "",
                details: String::new(),
            },
            DashError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other("test"),
            },
            DashError::ChannelClosed { component: "" },
            DashError::Runtime {
                details: String::new(),
            },
        ]
    }

    #[test]
    fn error_codes_are_unique() {
        let errors = every_variant();
        let codes: Vec<&str> = errors.iter().map(DashError::code).collect();
        let unique: std::collections::HashSet<&&str> = codes.iter().collect();
        assert_eq!(
            codes.len(),
            unique.len(),
            "error codes must be unique: {codes:?}"
        );
    }

    #[test]
    fn error_codes_have_c2s_prefix() {
        for err in &every_variant() {
            assert!(
                err.code().starts_with("C2S-"),
                "code {} must start with C2S-",
                err.code()
            );
        }
    }

    #[test]
    fn error_display_includes_code() {
        let err = DashError::UnknownPanel {
            name: "nope".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("C2S-2001"), "display should contain code: {msg}");
        assert!(msg.contains("nope"), "display should contain details: {msg}");
    }

    #[test]
    fn user_and_retryable_classes_do_not_overlap() {
        for err in &every_variant() {
            assert!(
                !(err.is_user_error() && err.is_retryable()),
                "{} cannot be both user error and retryable",
                err.code()
            );
        }
    }

    #[test]
    fn io_convenience_constructor() {
        let err = DashError::io(
            "/tmp/test.jsonl",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.code(), "C2S-3002");
        assert!(err.to_string().contains("/tmp/test.jsonl"));
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: DashError = json_err.into();
        assert_eq!(err.code(), "C2S-2101");
    }

    #[test]
    fn from_toml_error() {
        let toml_err = toml::from_str::<toml::Value>("= invalid").unwrap_err();
        let err: DashError = toml_err.into();
        assert_eq!(err.code(), "C2S-1003");
    }

    #[test]
    fn from_chrono_error() {
        let parse_err = chrono::NaiveDate::parse_from_str("2025-13-40", "%Y-%m-%d").unwrap_err();
        let err: DashError = parse_err.into();
        assert_eq!(err.code(), "C2S-2102");
    }
}
