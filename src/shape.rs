//! Typed access to generic document trees
//!
//! Documents are plain `serde_json::Value` trees. These helpers turn a type
//! mismatch into a [`ShapeError`] naming where it happened, instead of a panic
//! or a silent `None`.

use serde_json::{Map, Value};
use thiserror::Error;

/// A value did not have the shape a reader expected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{at} must be {expected} (found {found})")]
pub struct ShapeError {
    /// Human-readable location, e.g. `models` or `Task 2 steps`
    pub at: String,
    pub expected: &'static str,
    pub found: &'static str,
}

/// Name of a value's kind, as used in messages
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub trait ValueShape {
    fn expect_map(&self, at: &str) -> Result<&Map<String, Value>, ShapeError>;
    fn expect_list(&self, at: &str) -> Result<&Vec<Value>, ShapeError>;
    fn expect_str(&self, at: &str) -> Result<&str, ShapeError>;

    /// Look up a nested key path through maps, `None` if any hop is missing
    /// or not a map.
    fn lookup(&self, path: &[&str]) -> Option<&Value>;

    /// String at a nested key path, `None` if missing or not a string
    fn lookup_str(&self, path: &[&str]) -> Option<&str> {
        self.lookup(path).and_then(Value::as_str)
    }
}

impl ValueShape for Value {
    fn expect_map(&self, at: &str) -> Result<&Map<String, Value>, ShapeError> {
        self.as_object().ok_or_else(|| mismatch(at, "an object", self))
    }

    fn expect_list(&self, at: &str) -> Result<&Vec<Value>, ShapeError> {
        self.as_array().ok_or_else(|| mismatch(at, "an array", self))
    }

    fn expect_str(&self, at: &str) -> Result<&str, ShapeError> {
        self.as_str().ok_or_else(|| mismatch(at, "a string", self))
    }

    fn lookup(&self, path: &[&str]) -> Option<&Value> {
        path.iter()
            .try_fold(self, |current, key| current.as_object()?.get(*key))
    }
}

fn mismatch(at: &str, expected: &'static str, found: &Value) -> ShapeError {
    ShapeError {
        at: at.to_string(),
        expected,
        found: kind_name(found),
    }
}

/// The string `id` of an entry, if it has one
pub fn entry_id(entry: &Value) -> Option<&str> {
    entry.lookup_str(&["id"])
}
