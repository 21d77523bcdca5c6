//! File-system backed document store

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use super::{normalize, DocumentSource, Format};
use crate::error::{Result, SpecError};

/// Reads documents from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl DocumentSource for FsStore {
    fn load(&self, path: &Path) -> Result<Value> {
        let format = Format::for_path(path)?;
        let text = std::fs::read_to_string(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => SpecError::NotFound {
                path: path.to_path_buf(),
            },
            _ => SpecError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        debug!(path = %path.display(), %format, bytes = text.len(), "loaded document");
        format.decode(&text, path)
    }

    /// Absolute, lexically normalized path. Symlinks are not resolved.
    fn key(&self, path: &Path) -> PathBuf {
        match std::path::absolute(path) {
            Ok(abs) => normalize(&abs),
            Err(_) => normalize(path),
        }
    }
}
