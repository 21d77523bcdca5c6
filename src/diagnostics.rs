//! Validation findings
//!
//! Every finding is a typed [`ValidationIssue`] tagged with the pass that
//! produced it and a [`Severity`]. [`Diagnostics`] routes issues into
//! `errors` or `warnings`; a document is valid iff `errors` is empty.

use serde::Serialize;
use thiserror::Error;

use crate::hierarchy::InheritanceMode;
use crate::shape::ShapeError;

/// Validation pass that produced a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationLayer {
    /// Root shape, required sections, version key
    Structure,
    /// Rules inside each section
    Sections,
    /// Cross-references from task steps
    References,
    /// Inheritance metadata and merge collisions
    Inheritance,
}

impl std::fmt::Display for ValidationLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationLayer::Structure => write!(f, "Structure"),
            ValidationLayer::Sections => write!(f, "Sections"),
            ValidationLayer::References => write!(f, "References"),
            ValidationLayer::Inheritance => write!(f, "Inheritance"),
        }
    }
}

/// Severity of validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    // Structure
    #[error("Document root must be a map (found {found})")]
    RootNotMap { found: &'static str },

    #[error("Missing required section: {section}")]
    MissingSection { section: String },

    #[error("Version {version} may not be supported")]
    UnsupportedVersion { version: String },

    // Sections
    #[error("{location} missing required field: {field}")]
    MissingField { location: String, field: String },

    #[error(transparent)]
    WrongShape(#[from] ShapeError),

    #[error("Section '{section}' must contain at least one entry")]
    EmptySection { section: String },

    #[error("{location} has invalid {field} '{value}' (expected one of: {})", .expected.join(", "))]
    InvalidValue {
        location: String,
        field: String,
        value: String,
        expected: &'static [&'static str],
    },

    #[error("{location} has unrecognized {field} '{value}'")]
    UnknownValue {
        location: String,
        field: String,
        value: String,
        known: &'static [&'static str],
    },

    #[error("Duplicate {kind} ID: {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("{location} should define {field}")]
    Recommended { location: String, field: String },

    // References
    #[error("{location} references unknown {kind}: {id}")]
    UnknownReference {
        location: String,
        kind: &'static str,
        id: String,
        available: Vec<String>,
    },

    // Inheritance
    #[error("{declared_in} redefines inherited {section} entry '{id}' (inheritance_mode: extend)")]
    IdCollision {
        declared_in: String,
        section: String,
        id: String,
    },

    #[error("Unknown inheritance_mode '{mode}', using merge")]
    UnknownInheritanceMode { mode: String },
}

impl ValidationIssue {
    /// Get the validation layer for this issue
    pub fn layer(&self) -> ValidationLayer {
        match self {
            ValidationIssue::RootNotMap { .. }
            | ValidationIssue::MissingSection { .. }
            | ValidationIssue::UnsupportedVersion { .. } => ValidationLayer::Structure,
            ValidationIssue::MissingField { .. }
            | ValidationIssue::WrongShape(_)
            | ValidationIssue::EmptySection { .. }
            | ValidationIssue::InvalidValue { .. }
            | ValidationIssue::UnknownValue { .. }
            | ValidationIssue::DuplicateId { .. }
            | ValidationIssue::Recommended { .. } => ValidationLayer::Sections,
            ValidationIssue::UnknownReference { .. } => ValidationLayer::References,
            ValidationIssue::IdCollision { .. }
            | ValidationIssue::UnknownInheritanceMode { .. } => ValidationLayer::Inheritance,
        }
    }

    /// Get severity (error vs warning)
    pub fn severity(&self) -> Severity {
        match self {
            ValidationIssue::UnsupportedVersion { .. }
            | ValidationIssue::UnknownValue { .. }
            | ValidationIssue::Recommended { .. }
            | ValidationIssue::IdCollision { .. }
            | ValidationIssue::UnknownInheritanceMode { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Get suggestion for fixing this issue
    pub fn suggestion(&self) -> Option<String> {
        match self {
            ValidationIssue::MissingSection { section } => {
                Some(format!("Add a top-level '{section}:' section"))
            }
            ValidationIssue::UnsupportedVersion { .. } => {
                Some("Declare a 0.1.x version, e.g. openapia: \"0.1.0\"".to_string())
            }
            ValidationIssue::UnknownValue { known, .. } => {
                Some(format!("Known values: {}", known.join(", ")))
            }
            ValidationIssue::DuplicateId { .. } => {
                Some("Give every entry in the section a distinct id".to_string())
            }
            ValidationIssue::UnknownReference { kind, available, .. } => {
                if available.is_empty() {
                    Some(format!("No {kind}s are defined in this document or its parents"))
                } else if available.len() <= 5 {
                    Some(format!("Available {kind}s: {}", available.join(", ")))
                } else {
                    Some(format!(
                        "Available {kind}s: {} (and {} more)",
                        available[..3].join(", "),
                        available.len() - 3
                    ))
                }
            }
            ValidationIssue::UnknownInheritanceMode { .. } => Some(format!(
                "Use one of: {}",
                InheritanceMode::ALL.join(", ")
            )),
            ValidationIssue::IdCollision { .. } => Some(
                "Rename the local entry, or switch inheritance_mode to merge to refine it"
                    .to_string(),
            ),
            _ => None,
        }
    }
}

/// Errors and warnings collected by one validation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Record an issue under its severity
    pub fn add(&mut self, issue: impl Into<ValidationIssue>) {
        let issue = issue.into();
        match issue.severity() {
            Severity::Warning => self.warnings.push(issue),
            Severity::Error => self.errors.push(issue),
        }
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }

    /// Plain-string view for machine-readable output
    pub fn report(&self) -> Report {
        Report {
            valid: self.is_valid(),
            errors: self.error_messages(),
            warnings: self.warning_messages(),
        }
    }
}

/// Serializable `{ valid, errors, warnings }` summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}
