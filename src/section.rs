//! Top-level sections of a specification document

use std::fmt;

use serde_json::{Map, Value};

use crate::merge::is_id_keyed;

/// Key declaring the format version, e.g. `openapia: "0.1.0"`
pub const VERSION_KEY: &str = "openapia";

/// Key holding the inheritance declaration
pub const INHERITS_KEY: &str = "inherits";

/// Drop the inheritance declaration, which is not part of the document body
pub fn without_inherits(doc: Value) -> Value {
    match doc {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| key != INHERITS_KEY)
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Info,
    Models,
    Prompts,
    Constraints,
    Tasks,
    Context,
    Evaluation,
}

impl Section {
    /// Every section a complete document must carry, in report order
    pub const REQUIRED: [Section; 7] = [
        Section::Info,
        Section::Models,
        Section::Prompts,
        Section::Constraints,
        Section::Tasks,
        Section::Context,
        Section::Evaluation,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Section::Info => "info",
            Section::Models => "models",
            Section::Prompts => "prompts",
            Section::Constraints => "constraints",
            Section::Tasks => "tasks",
            Section::Context => "context",
            Section::Evaluation => "evaluation",
        }
    }

    /// Whether entries of this section merge by `id`
    pub fn is_id_keyed(self) -> bool {
        is_id_keyed(self.key())
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
