//! Store Module - document loading
//!
//! Loads a specification by path and decodes it into a generic
//! `serde_json::Value` tree. No semantic checks happen here.
//!
//! Key types:
//! - [`DocumentSource`]: the loading seam used by the resolver and reporter
//! - [`FsStore`]: reads documents from disk
//! - [`MemoryStore`]: serves documents from memory (embedding, tests)
//! - [`Format`]: YAML or JSON, picked from the file extension
//!
//! ```rust
//! use openapia::store::{DocumentSource, MemoryStore};
//!
//! let store = MemoryStore::new().with_document("/specs/base.yaml", "openapia: 0.1.0\n");
//! let doc = store.load("/specs/base.yaml".as_ref()).unwrap();
//! assert_eq!(doc["openapia"], "0.1.0");
//! ```

mod format;
mod fs;
mod memory;

use std::path::{Component, Path, PathBuf};

use serde_json::Value;

use crate::error::Result;

pub use format::Format;
pub use fs::FsStore;
pub use memory::MemoryStore;

/// Something that can hand out decoded documents by path
pub trait DocumentSource {
    /// Load and decode the document at `path`.
    ///
    /// Fails with `NotFound` when nothing exists at `path`, `Decode` when the
    /// text is malformed, and `UnsupportedFormat` for unknown extensions.
    fn load(&self, path: &Path) -> Result<Value>;

    /// Canonical cache key for `path`. Two spellings of the same document
    /// must produce the same key.
    fn key(&self, path: &Path) -> PathBuf {
        normalize(path)
    }
}

impl<S: DocumentSource + ?Sized> DocumentSource for &S {
    fn load(&self, path: &Path) -> Result<Value> {
        (**self).load(path)
    }

    fn key(&self, path: &Path) -> PathBuf {
        (**self).key(path)
    }
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component. Does not touch the file system, so it works for
/// documents that do not exist yet.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = match out.components().next_back() {
                    Some(Component::Normal(_)) => out.pop(),
                    _ => false,
                };
                // `..` above a root stays at the root; above a relative
                // start it must be kept.
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve an `inherits` reference relative to the directory of the document
/// that declares it.
pub fn resolve_reference(declared_in: &Path, reference: &str) -> PathBuf {
    let base = declared_in.parent().unwrap_or_else(|| Path::new(""));
    normalize(&base.join(reference))
}
