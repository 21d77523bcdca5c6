//! Inheritance resolution
//!
//! Resolving a document means loading it, resolving every parent listed in
//! its `inherits` declaration (recursively), folding the parents together in
//! declaration order and finally merging the document's own content on top:
//!
//! ```text
//! feature.yaml  inherits: [team.yaml, security.yaml]
//!
//!   {}  ⊕ resolve(team.yaml)  ⊕ resolve(security.yaml)  ⊕ feature.yaml (local)
//!       ───── earlier ─────     ────── later ──────        ─── always wins ───
//! ```
//!
//! Parents are always combined in `merge` mode; the document's own
//! `inheritance_mode` only applies to the final local step.
//!
//! References are resolved against the directory of the declaring document.
//! Results are cached per resolver, so a shared ancestor is loaded and merged
//! once. Cycles are caught with an explicit in-progress stack.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Result, SpecError};
use crate::hierarchy::{HierarchyInfo, InheritanceMode};
use crate::merge::merge_documents;
use crate::section::INHERITS_KEY;
use crate::shape::{kind_name, ShapeError};
use crate::store::{resolve_reference, DocumentSource, FsStore};

/// Default upper bound on the length of an inheritance chain
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// A local entry that reused an inherited id under `inheritance_mode: extend`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryCollision {
    /// Document whose local entry collided
    pub declared_in: PathBuf,
    pub section: String,
    pub id: String,
}

/// A document with its whole inheritance chain folded in
#[derive(Debug, Clone, PartialEq)]
pub struct MergedDocument {
    pub source: PathBuf,
    /// Effective document; never contains an `inherits` key
    pub value: Value,
    /// Mode the source document declared for its own merge
    pub mode: InheritanceMode,
    /// Every document folded in, depth-first in declaration order
    pub ancestors: Vec<PathBuf>,
    /// Extend-mode collisions anywhere in the chain
    pub collisions: Vec<EntryCollision>,
}

/// Resolves inheritance chains. Holds its own cache and in-progress stack;
/// use one instance per independent run.
pub struct Resolver<S = FsStore> {
    store: S,
    cache: HashMap<PathBuf, Arc<MergedDocument>>,
    in_progress: Vec<PathBuf>,
    max_depth: usize,
}

impl Resolver<FsStore> {
    pub fn new() -> Self {
        Self::with_store(FsStore)
    }
}

impl Default for Resolver<FsStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: DocumentSource> Resolver<S> {
    pub fn with_store(store: S) -> Self {
        Self {
            store,
            cache: HashMap::new(),
            in_progress: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Number of fully resolved documents currently cached
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Forget every cached result (e.g. after files changed on disk)
    pub fn clear(&mut self) {
        self.cache.clear();
        self.in_progress.clear();
    }

    /// Resolve the document at `path` and its whole inheritance chain.
    ///
    /// # Errors
    ///
    /// - `NotFound` / `Decode` / `UnsupportedFormat` for the document itself
    /// - `MissingParent` when a declared parent does not exist
    /// - `InheritanceCycle` when a document transitively inherits itself
    /// - `InheritanceTooDeep` past the configured depth
    /// - `InvalidInherits` / `Shape` for malformed declarations or roots
    pub fn resolve(&mut self, path: impl AsRef<Path>) -> Result<Arc<MergedDocument>> {
        let key = self.store.key(path.as_ref());
        let result = self.resolve_key(&key);
        // An error unwinds without popping; nothing is in flight afterwards.
        self.in_progress.clear();
        result
    }

    fn resolve_key(&mut self, path: &Path) -> Result<Arc<MergedDocument>> {
        if let Some(hit) = self.cache.get(path) {
            debug!(path = %path.display(), "resolver cache hit");
            return Ok(Arc::clone(hit));
        }

        if let Some(start) = self.in_progress.iter().position(|p| p == path) {
            let mut chain = self.in_progress[start..].to_vec();
            chain.push(path.to_path_buf());
            return Err(SpecError::InheritanceCycle { chain });
        }

        if self.in_progress.len() >= self.max_depth {
            return Err(SpecError::InheritanceTooDeep {
                path: path.to_path_buf(),
                max_depth: self.max_depth,
            });
        }

        let doc = self.store.load(path)?;
        let mode = HierarchyInfo::from_document(&doc).mode();
        let references = inherits_of(&doc, path)?;
        let local = match doc {
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .filter(|(key, _)| key != INHERITS_KEY)
                    .collect::<Map<String, Value>>(),
            ),
            other => {
                return Err(SpecError::Shape {
                    path: path.to_path_buf(),
                    source: ShapeError {
                        at: "document root".to_string(),
                        expected: "an object",
                        found: kind_name(&other),
                    },
                })
            }
        };

        self.in_progress.push(path.to_path_buf());

        let mut inherited = Value::Object(Map::new());
        let mut ancestors: Vec<PathBuf> = Vec::new();
        let mut collisions: Vec<EntryCollision> = Vec::new();

        for reference in &references {
            let parent_path = self.store.key(&resolve_reference(path, reference));
            let parent = self.resolve_key(&parent_path).map_err(|e| match e {
                SpecError::NotFound { path: missing } if missing == parent_path => {
                    SpecError::MissingParent {
                        reference: reference.clone(),
                        declared_in: path.to_path_buf(),
                        resolved: missing,
                    }
                }
                other => other,
            })?;

            debug!(
                child = %path.display(),
                parent = %parent.source.display(),
                "merging parent"
            );
            inherited = merge_documents(&inherited, &parent.value, InheritanceMode::Merge).value;

            for ancestor in std::iter::once(&parent.source).chain(&parent.ancestors) {
                if !ancestors.contains(ancestor) {
                    ancestors.push(ancestor.clone());
                }
            }
            for collision in &parent.collisions {
                if !collisions.contains(collision) {
                    collisions.push(collision.clone());
                }
            }
        }

        let outcome = merge_documents(&inherited, &local, mode);
        collisions.extend(outcome.collisions.into_iter().map(|c| EntryCollision {
            declared_in: path.to_path_buf(),
            section: c.section,
            id: c.id,
        }));

        self.in_progress.pop();

        let merged = Arc::new(MergedDocument {
            source: path.to_path_buf(),
            value: outcome.value,
            mode,
            ancestors,
            collisions,
        });
        self.cache.insert(path.to_path_buf(), Arc::clone(&merged));
        Ok(merged)
    }
}

/// Parent references declared by `doc`. Absent or null means none; a single
/// string is a one-element list.
fn inherits_of(doc: &Value, path: &Path) -> Result<Vec<String>> {
    let invalid = |details: String| SpecError::InvalidInherits {
        path: path.to_path_buf(),
        details,
    };

    match doc.get(INHERITS_KEY) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(single)) if !single.is_empty() => Ok(vec![single.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(s) if !s.is_empty() => Ok(s.clone()),
                Value::String(_) => Err(invalid(format!("entry {i} is empty"))),
                other => Err(invalid(format!(
                    "entry {i} must be a string (found {})",
                    kind_name(other)
                ))),
            })
            .collect(),
        Some(other) => Err(invalid(format!(
            "must be a list of paths (found {})",
            kind_name(other)
        ))),
    }
}
