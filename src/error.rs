//! Error types with fix suggestions
//!
//! Load and inheritance failures are fatal to the operation that hit them.
//! Validation findings are not errors in this sense; they are collected as
//! [`crate::diagnostics::ValidationIssue`]s instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::shape::ShapeError;
use crate::store::Format;

pub type Result<T> = std::result::Result<T, SpecError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug)]
pub enum SpecError {
    // ─────────────────────────────────────────────────────────────
    // Load errors
    // ─────────────────────────────────────────────────────────────
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{format} parsing error in {}: {details}", path.display())]
    Decode {
        path: PathBuf,
        format: Format,
        details: String,
    },

    #[error("Unsupported file format: {} (expected .yaml, .yml or .json)", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("Cannot serialize document as {format}: {details}")]
    Encode { format: Format, details: String },

    #[error("Malformed document {}: {source}", path.display())]
    Shape {
        path: PathBuf,
        #[source]
        source: ShapeError,
    },

    // ─────────────────────────────────────────────────────────────
    // Inheritance errors
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid inherits declaration in {}: {details}", path.display())]
    InvalidInherits { path: PathBuf, details: String },

    #[error(
        "Inherited specification not found: '{reference}' (declared in {}, resolved to {})",
        declared_in.display(),
        resolved.display()
    )]
    MissingParent {
        reference: String,
        declared_in: PathBuf,
        resolved: PathBuf,
    },

    #[error("Inheritance cycle detected: {}", format_chain(chain))]
    InheritanceCycle { chain: Vec<PathBuf> },

    #[error(
        "Inheritance chain deeper than {max_depth} documents at {}",
        path.display()
    )]
    InheritanceTooDeep { path: PathBuf, max_depth: usize },

    // ─────────────────────────────────────────────────────────────
    // Command errors
    // ─────────────────────────────────────────────────────────────
    #[error("No specifications to merge")]
    NoInputs,

    #[error("Config error: {reason}")]
    Config { reason: String },
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" → ")
}

impl FixSuggestion for SpecError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            SpecError::NotFound { .. } => Some("Check the file path exists"),
            SpecError::Io { .. } => Some("Check file path and permissions"),
            SpecError::Decode { format: Format::Yaml, .. } => {
                Some("Check YAML syntax: indentation and quoting")
            }
            SpecError::Decode { format: Format::Json, .. } => {
                Some("Check JSON syntax: braces, commas and quoting")
            }
            SpecError::UnsupportedFormat { .. } => {
                Some("Rename the file with a .yaml, .yml or .json extension")
            }
            SpecError::Encode { .. } => None,
            SpecError::Shape { .. } => Some("The document root must be a mapping of sections"),
            SpecError::InvalidInherits { .. } => {
                Some("Use a list of relative paths: inherits: [../base.yaml]")
            }
            SpecError::MissingParent { .. } => Some(
                "Inherited paths are relative to the declaring file's directory, not the working directory",
            ),
            SpecError::InheritanceCycle { .. } => {
                Some("Remove one inherits reference so no document inherits from itself")
            }
            SpecError::InheritanceTooDeep { .. } => {
                Some("Flatten the hierarchy or raise resolver.max_depth in openapia.toml")
            }
            SpecError::NoInputs => Some("Pass at least one specification file to merge"),
            SpecError::Config { .. } => Some("Check openapia.toml syntax and field names"),
        }
    }
}
