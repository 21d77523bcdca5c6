//! Hierarchy metadata and the inheritance tree reporter
//!
//! Metadata lives under `info.ai_metadata.hierarchy_info`:
//!
//! ```yaml
//! info:
//!   ai_metadata:
//!     hierarchy_info:
//!       level: team
//!       scope: search
//!       parent_specs: [org.yaml]
//!       inheritance_mode: extend   # merge | override | extend
//! ```
//!
//! [`describe`] walks `inherits` references without merging anything. It
//! shares path resolution with the resolver but never touches its cache.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::shape::ValueShape;
use crate::store::{resolve_reference, DocumentSource};

/// Key path of the hierarchy metadata block
pub const HIERARCHY_INFO_PATH: [&str; 3] = ["info", "ai_metadata", "hierarchy_info"];

/// How a document's own content combines with what it inherits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InheritanceMode {
    /// Maps deep-merge, id-keyed sections merge entry by entry
    #[default]
    Merge,
    /// Sections present locally replace inherited ones wholesale
    Override,
    /// Like `Merge`, but local entries reusing an inherited id are reported
    Extend,
}

impl InheritanceMode {
    pub const ALL: [&'static str; 3] = ["merge", "override", "extend"];

    pub fn as_str(self) -> &'static str {
        match self {
            InheritanceMode::Merge => "merge",
            InheritanceMode::Override => "override",
            InheritanceMode::Extend => "extend",
        }
    }
}

impl FromStr for InheritanceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "merge" => Ok(InheritanceMode::Merge),
            "override" => Ok(InheritanceMode::Override),
            "extend" => Ok(InheritanceMode::Extend),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for InheritanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive hierarchy fields of one (unmerged) document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchyInfo {
    pub level: Option<String>,
    pub scope: Option<String>,
    pub parent_specs: Vec<String>,
    /// Raw `inheritance_mode` value, kept as written so validation can flag
    /// unknown modes
    pub inheritance_mode: Option<String>,
}

impl HierarchyInfo {
    /// Read the metadata block; missing or mistyped fields are treated as
    /// absent.
    pub fn from_document(doc: &Value) -> Self {
        let Some(block) = doc.lookup(&HIERARCHY_INFO_PATH) else {
            return Self::default();
        };
        let text = |key: &str| block.lookup_str(&[key]).map(str::to_string);
        let parent_specs = block
            .get("parent_specs")
            .and_then(Value::as_array)
            .map(|specs| {
                specs
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            level: text("level"),
            scope: text("scope"),
            parent_specs,
            inheritance_mode: text("inheritance_mode"),
        }
    }

    /// Effective merge mode. Unknown values fall back to `Merge`.
    pub fn mode(&self) -> InheritanceMode {
        self.inheritance_mode
            .as_deref()
            .and_then(|m| m.parse().ok())
            .unwrap_or_default()
    }
}

/// Outcome of visiting one node of the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeStatus {
    Loaded,
    /// The document could not be loaded; the reason is the error message
    Failed(String),
    /// The path is already an ancestor on this branch; not descended
    Cycle,
}

/// One line of the inheritance tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyNode {
    pub path: PathBuf,
    pub depth: usize,
    pub title: String,
    pub level: String,
    pub scope: String,
    /// `parent_specs` as documented in the metadata, not the `inherits` list
    pub parent_specs: Vec<String>,
    pub status: NodeStatus,
}

/// Describe the inheritance tree rooted at `path`, in pre-order.
///
/// Never fails: unreadable documents and cycles show up as node statuses so
/// the whole tree can still be presented.
pub fn describe<S: DocumentSource>(store: &S, path: &Path) -> Vec<HierarchyNode> {
    let mut nodes = Vec::new();
    let mut branch = Vec::new();
    describe_at(store, &store.key(path), 0, &mut branch, &mut nodes);
    nodes
}

fn describe_at<S: DocumentSource>(
    store: &S,
    path: &Path,
    depth: usize,
    branch: &mut Vec<PathBuf>,
    nodes: &mut Vec<HierarchyNode>,
) {
    let unknown = |status| HierarchyNode {
        path: path.to_path_buf(),
        depth,
        title: "Unknown".to_string(),
        level: "unknown".to_string(),
        scope: "unknown".to_string(),
        parent_specs: Vec::new(),
        status,
    };

    if branch.iter().any(|p| p == path) {
        nodes.push(unknown(NodeStatus::Cycle));
        return;
    }

    let doc = match store.load(path) {
        Ok(doc) => doc,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "tree node failed to load");
            nodes.push(unknown(NodeStatus::Failed(e.to_string())));
            return;
        }
    };

    let info = HierarchyInfo::from_document(&doc);
    nodes.push(HierarchyNode {
        path: path.to_path_buf(),
        depth,
        title: doc
            .lookup_str(&["info", "title"])
            .unwrap_or("Unknown")
            .to_string(),
        level: info.level.unwrap_or_else(|| "unknown".to_string()),
        scope: info.scope.unwrap_or_else(|| "unknown".to_string()),
        parent_specs: info.parent_specs,
        status: NodeStatus::Loaded,
    });

    branch.push(path.to_path_buf());
    for reference in inherits_references(&doc) {
        let parent = resolve_reference(path, reference);
        describe_at(store, &parent, depth + 1, branch, nodes);
    }
    branch.pop();
}

/// String entries of `inherits`, tolerating a single string. Malformed
/// entries are skipped here; the resolver rejects them.
fn inherits_references(doc: &Value) -> Vec<&str> {
    match doc.get("inherits") {
        Some(Value::String(single)) => vec![single.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}
