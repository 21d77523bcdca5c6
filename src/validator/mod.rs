//! Validation pipeline
//!
//! Runs the passes in order over one document:
//!
//! 1. **Structure** - root shape, required sections, version
//! 2. **Sections** - per-section rules ([`sections`])
//! 3. **References** - task step references ([`references`])
//! 4. **Inheritance** - extend-mode collisions, for merged documents only
//!
//! Load and inheritance failures are returned as `Err` before any pass runs;
//! findings from the passes never are.

pub mod references;
pub mod sections;
pub mod steps;

use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::diagnostics::{Diagnostics, ValidationIssue};
use crate::error::Result;
use crate::resolver::{MergedDocument, Resolver, DEFAULT_MAX_DEPTH};
use crate::section::without_inherits;
use crate::shape::ValueShape;
use crate::store::{DocumentSource, FsStore};

pub use references::validate_references;
pub use sections::validate_structure;
pub use steps::StepAction;

/// The validator that runs every pass
#[derive(Debug, Clone)]
pub struct Validator {
    max_depth: usize,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Inheritance depth limit used by hierarchical validation
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Validate a standalone (or already merged) document
    pub fn validate(&self, doc: &Value) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        validate_structure(doc, &mut diagnostics);
        validate_references(doc, &mut diagnostics);
        diagnostics
    }

    /// Validate a resolved document, adding a warning per extend-mode collision
    pub fn validate_merged(&self, merged: &MergedDocument) -> Diagnostics {
        let mut diagnostics = self.validate(&merged.value);
        for collision in &merged.collisions {
            diagnostics.add(ValidationIssue::IdCollision {
                declared_in: collision.declared_in.display().to_string(),
                section: collision.section.clone(),
                id: collision.id.clone(),
            });
        }
        diagnostics
    }

    /// Validate a file from disk, resolving its inheritance chain first when
    /// `hierarchical` is set.
    pub fn validate_file(&self, path: &Path, hierarchical: bool) -> Result<Diagnostics> {
        self.validate_with(FsStore, path, hierarchical)
    }

    /// [`Validator::validate_file`] over any document source
    pub fn validate_with<S: DocumentSource>(
        &self,
        store: S,
        path: &Path,
        hierarchical: bool,
    ) -> Result<Diagnostics> {
        let diagnostics = if hierarchical {
            let mut resolver = Resolver::with_store(store).with_max_depth(self.max_depth);
            let merged = resolver.resolve(path)?;
            debug!(
                path = %merged.source.display(),
                ancestors = merged.ancestors.len(),
                "validating merged document"
            );
            self.validate_merged(&merged)
        } else {
            let doc = store.load(&store.key(path))?;
            self.validate(&without_inherits(doc))
        };

        debug!(
            path = %path.display(),
            errors = diagnostics.errors.len(),
            warnings = diagnostics.warnings.len(),
            "validation finished"
        );
        Ok(diagnostics)
    }
}

/// `"{label} {index}"`, followed by `" ({name})"` when the entry has a
/// string under `name_key`
pub(crate) fn entry_location(label: &str, index: usize, entry: &Value, name_key: &str) -> String {
    match entry.lookup_str(&[name_key]) {
        Some(name) => format!("{label} {index} ({name})"),
        None => format!("{label} {index}"),
    }
}

/// Report each of `fields` that is absent or null in `map`
pub(crate) fn require_fields(
    map: &Map<String, Value>,
    location: &str,
    fields: &[&str],
    diagnostics: &mut Diagnostics,
) {
    for field in fields {
        if map.get(*field).map_or(true, Value::is_null) {
            diagnostics.add(ValidationIssue::MissingField {
                location: location.to_string(),
                field: field.to_string(),
            });
        }
    }
}
