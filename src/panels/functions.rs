//! Pipeline function builder: the draft a user submits and its validation.

#![allow(missing_docs)]

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::errors::{DashError, Result};
use crate::panel::form::ValidationErrors;

pub const PARAMETER_TYPES: &[&str] = &["string", "number", "boolean", "array", "object", "any"];
pub const LANGUAGES: &[&str] = &["python", "javascript"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl Parameter {
    #[must_use]
    pub fn new(name: &str, kind: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionDraft {
    pub name: String,
    pub description: String,
    pub inputs: Vec<Parameter>,
    pub outputs: Vec<Parameter>,
    pub code_language: String,
    pub implementation: String,
}

impl Default for FunctionDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            code_language: "python".to_string(),
            implementation: String::new(),
        }
    }
}

fn check_parameters(errors: &mut ValidationErrors, list: &str, params: &[Parameter]) {
    for (i, p) in params.iter().enumerate() {
        errors.check(
            p.name.trim().is_empty(),
            format!("{list}[{i}].name"),
            "Parameter name is required",
        );
        let field = format!("{list}[{i}].type");
        if p.kind.trim().is_empty() {
            errors.push(field, "Parameter type is required");
        } else {
            errors.check(
                !PARAMETER_TYPES.contains(&p.kind.as_str()),
                field,
                "Unknown parameter type",
            );
        }
    }
}

impl FunctionDraft {
    /// Read a draft from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| DashError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Every field-level problem, keyed like `inputs[1].name`.
    pub fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(self.name.trim().is_empty(), "name", "Name is required");
        check_parameters(&mut errors, "inputs", &self.inputs);
        check_parameters(&mut errors, "outputs", &self.outputs);
        errors.check(
            !LANGUAGES.contains(&self.code_language.as_str()),
            "code_language",
            "Unsupported language",
        );
        errors.check(
            self.implementation.trim().is_empty(),
            "implementation",
            "Implementation is required",
        );
        errors.into_result(())
    }
}
