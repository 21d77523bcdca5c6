//! The two textual formats a specification may be written in

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SpecError};

/// Document encoding. Both decode to the same generic tree, so the choice
/// never affects merge or validation semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Pick the format from a file extension, `None` for anything unknown
    pub fn from_extension(path: &Path) -> Option<Format> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Format::Yaml),
            "json" => Some(Format::Json),
            _ => None,
        }
    }

    /// Like [`Format::from_extension`] but fails with `UnsupportedFormat`
    pub fn for_path(path: &Path) -> Result<Format> {
        Self::from_extension(path).ok_or_else(|| SpecError::UnsupportedFormat {
            path: path.to_path_buf(),
        })
    }

    /// Decode document text. `path` is only used for error reporting.
    pub fn decode(self, text: &str, path: &Path) -> Result<Value> {
        let decoded = match self {
            Format::Yaml => serde_yaml::from_str::<Value>(text).map_err(|e| e.to_string()),
            Format::Json => serde_json::from_str::<Value>(text).map_err(|e| e.to_string()),
        };
        decoded.map_err(|details| SpecError::Decode {
            path: path.to_path_buf(),
            format: self,
            details,
        })
    }

    pub fn encode(self, value: &Value) -> Result<String> {
        let encoded = match self {
            Format::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
            Format::Json => serde_json::to_string_pretty(value)
                .map(|mut s| {
                    s.push('\n');
                    s
                })
                .map_err(|e| e.to_string()),
        };
        encoded.map_err(|details| SpecError::Encode {
            format: self,
            details,
        })
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Yaml => write!(f, "YAML"),
            Format::Json => write!(f, "JSON"),
        }
    }
}
