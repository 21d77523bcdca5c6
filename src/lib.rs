//! OpenAPIA - composition and validation of layered AI specifications

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod hierarchy;
pub mod merge;
pub mod resolver;
pub mod section;
pub mod shape;
pub mod store;
pub mod validator;

pub use config::{Config, OutputFormat};
pub use diagnostics::{Diagnostics, Report, Severity, ValidationIssue, ValidationLayer};
pub use error::{FixSuggestion, Result, SpecError};
pub use hierarchy::{describe, HierarchyInfo, HierarchyNode, InheritanceMode, NodeStatus};
pub use merge::{deep_merge, merge_all, merge_documents, MergeOutcome};
pub use resolver::{MergedDocument, Resolver};
pub use section::Section;
pub use shape::{ShapeError, ValueShape};
pub use store::{DocumentSource, Format, FsStore, MemoryStore};
pub use validator::Validator;
