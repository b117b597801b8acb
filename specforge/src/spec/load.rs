//! Reading documents from JSON or YAML text

use std::path::Path;

use platform_models::ValidationResult;
use serde_json::Value;

use crate::spec::validator::{parse_failure, validate_spec};
use crate::spec::SpecError;

/// Serialization format of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, SpecError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "json" => Ok(DocumentFormat::Json),
            "yaml" | "yml" => Ok(DocumentFormat::Yaml),
            _ => Err(SpecError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Parse document text into a semantic tree
pub fn parse_document(text: &str, format: DocumentFormat) -> Result<Value, SpecError> {
    match format {
        DocumentFormat::Json => {
            serde_json::from_str(text).map_err(|e| SpecError::Parse(e.to_string()))
        }
        DocumentFormat::Yaml => {
            serde_yaml::from_str(text).map_err(|e| SpecError::Parse(e.to_string()))
        }
    }
}

/// Parse and validate in one step
///
/// Unreadable text becomes a single `Failed to parse specification` error.
pub fn validate_text(text: &str, format: DocumentFormat) -> (ValidationResult, Option<Value>) {
    match parse_document(text, format) {
        Ok(doc) => (validate_spec(&doc), Some(doc)),
        Err(e) => (parse_failure(e), None),
    }
}
