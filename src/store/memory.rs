//! In-memory document store
//!
//! Serves document text from a map instead of the file system. Decoding goes
//! through the same [`Format`] path as [`super::FsStore`], so malformed text
//! still surfaces as a `Decode` error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::{normalize, DocumentSource, Format};
use crate::error::{Result, SpecError};

/// Documents keyed by normalized path
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: HashMap<PathBuf, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with_document(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.documents.insert(normalize(&path.into()), text.into());
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentSource for MemoryStore {
    fn load(&self, path: &Path) -> Result<Value> {
        let format = Format::for_path(path)?;
        let text = self
            .documents
            .get(&normalize(path))
            .ok_or_else(|| SpecError::NotFound {
                path: path.to_path_buf(),
            })?;
        format.decode(text, path)
    }
}
