//! Cross-reference checks
//!
//! Task steps may point at models, prompts and MCP servers by id. Run this
//! on the merged document: a reference may target an entry that only an
//! ancestor defines.

use serde_json::Value;

use super::entry_location;
use super::steps::step_location;
use crate::diagnostics::{Diagnostics, ValidationIssue};
use crate::shape::{entry_id, ValueShape};

/// Step field, the kind of entry it names, and where those entries live
const REFERENCES: [(&str, &str, &[&str]); 3] = [
    ("model", "model", &["models"]),
    ("prompt", "prompt", &["prompts"]),
    ("mcp_server", "MCP server", &["context", "mcp_servers"]),
];

/// Report every step reference to an id that no entry carries.
///
/// Malformed sections are skipped silently; the structure pass reports them.
pub fn validate_references(doc: &Value, diagnostics: &mut Diagnostics) {
    let known: Vec<Vec<String>> = REFERENCES
        .iter()
        .map(|(_, _, section)| ids_in(doc.lookup(section)))
        .collect();

    let Some(tasks) = doc.get("tasks").and_then(Value::as_array) else {
        return;
    };

    for (task_index, task) in tasks.iter().enumerate() {
        let Some(steps) = task.get("steps").and_then(Value::as_array) else {
            continue;
        };
        let task_location = entry_location("Task", task_index, task, "id");

        for (step_index, step) in steps.iter().enumerate() {
            if !step.is_object() {
                continue;
            }
            for ((field, kind, _), available) in REFERENCES.iter().zip(&known) {
                let Some(id) = step.lookup_str(&[*field]) else {
                    continue;
                };
                if !available.iter().any(|known| known == id) {
                    diagnostics.add(ValidationIssue::UnknownReference {
                        location: step_location(&task_location, step_index, step),
                        kind: *kind,
                        id: id.to_string(),
                        available: available.clone(),
                    });
                }
            }
        }
    }
}

/// String ids of the map entries of a list section, in order
fn ids_in(section: Option<&Value>) -> Vec<String> {
    section
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(entry_id).map(str::to_string).collect())
        .unwrap_or_default()
}
