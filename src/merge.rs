//! Deep merge of specification documents
//!
//! Generic merge semantics ([`deep_merge`]):
//! - Objects: deep-merge by key (recursive)
//! - Arrays: REPLACE (overlay wins entirely)
//! - Scalars, null, type mismatches: overlay wins
//!
//! Document merge ([`merge_documents`]) refines this at the top level for the
//! id-keyed sections (`models`, `prompts`, `constraints`, `tasks`): their
//! entries are matched by `id` instead of replacing the whole list, so a child
//! can add one model and keep every inherited one.
//!
//! Inputs are never mutated; every merge builds a new tree.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};

use crate::error::{Result, SpecError};
use crate::hierarchy::InheritanceMode;
use crate::section::without_inherits;
use crate::shape::entry_id;

/// Top-level sections whose entries are merged by `id`
pub const ID_KEYED_SECTIONS: [&str; 4] = ["models", "prompts", "constraints", "tasks"];

pub fn is_id_keyed(section: &str) -> bool {
    ID_KEYED_SECTIONS.contains(&section)
}

/// An overlay entry that reused the id of a base entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdCollision {
    pub section: String,
    pub id: String,
}

/// Result of [`merge_documents`]
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub value: Value,
    /// Only populated in [`InheritanceMode::Extend`]
    pub collisions: Vec<IdCollision>,
}

/// Deep merge two generic values.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            let mut merged = base_map.clone();
            for (key, overlay_value) in overlay_map {
                let value = match base_map.get(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value.clone(),
                };
                merged.insert(key.clone(), value);
            }
            Value::Object(merged)
        }

        // Arrays, scalars and any other case: overlay wins
        (_, overlay) => overlay.clone(),
    }
}

/// Merge two whole documents under `mode`.
///
/// Non-map documents fall back to [`deep_merge`] (the overlay replaces the
/// base).
pub fn merge_documents(base: &Value, overlay: &Value, mode: InheritanceMode) -> MergeOutcome {
    let (Value::Object(base_map), Value::Object(overlay_map)) = (base, overlay) else {
        return MergeOutcome {
            value: deep_merge(base, overlay),
            collisions: Vec::new(),
        };
    };

    let mut merged: Map<String, Value> = base_map.clone();
    let mut collisions = Vec::new();

    for (key, overlay_value) in overlay_map {
        let value = match (mode, base_map.get(key)) {
            (_, None) | (InheritanceMode::Override, Some(_)) => overlay_value.clone(),
            (_, Some(base_value)) if is_id_keyed(key) => {
                match (base_value, overlay_value) {
                    (Value::Array(base_entries), Value::Array(overlay_entries)) => {
                        let (entries, collided) = merge_entries(base_entries, overlay_entries);
                        if mode == InheritanceMode::Extend {
                            collisions.extend(collided.into_iter().map(|id| IdCollision {
                                section: key.clone(),
                                id,
                            }));
                        }
                        Value::Array(entries)
                    }
                    _ => overlay_value.clone(),
                }
            }
            (_, Some(base_value)) => deep_merge(base_value, overlay_value),
        };
        merged.insert(key.clone(), value);
    }

    MergeOutcome {
        value: Value::Object(merged),
        collisions,
    }
}

/// Merge two entry lists by `id`.
///
/// Base order is kept and new entries are appended in overlay order. Each
/// base entry absorbs at most the first overlay entry with its id; later
/// overlay entries reusing that id are appended unchanged so duplicate-id
/// checks still see them. Overlay entries without a string id are appended
/// unless an equal value is already present. Returns the ids of overlay
/// entries that were merged into a base entry.
fn merge_entries(base: &[Value], overlay: &[Value]) -> (Vec<Value>, Vec<String>) {
    let mut base_positions: HashMap<&str, usize> = HashMap::new();
    for (pos, entry) in base.iter().enumerate() {
        if let Some(id) = entry_id(entry) {
            base_positions.entry(id).or_insert(pos);
        }
    }

    let mut merged = base.to_vec();
    let mut matched: HashSet<&str> = HashSet::new();
    let mut collided = Vec::new();

    for entry in overlay {
        match entry_id(entry) {
            Some(id) => match base_positions.get(id) {
                Some(&pos) if matched.insert(id) => {
                    collided.push(id.to_string());
                    merged[pos] = deep_merge(&merged[pos], entry);
                }
                _ => merged.push(entry.clone()),
            },
            None if merged.contains(entry) => {}
            None => merged.push(entry.clone()),
        }
    }

    (merged, collided)
}

/// Merge top-level documents left to right; later documents win.
///
/// `inherits` declarations are dropped: they are relative to each input's
/// own directory and would not resolve from wherever the result is written.
pub fn merge_all(documents: &[Value]) -> Result<Value> {
    let (first, rest) = documents.split_first().ok_or(SpecError::NoInputs)?;
    Ok(rest.iter().fold(without_inherits(first.clone()), |acc, doc| {
        merge_documents(&acc, &without_inherits(doc.clone()), InheritanceMode::Merge).value
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn merged(base: Value, overlay: Value) -> Value {
        merge_documents(&base, &overlay, InheritanceMode::Merge).value
    }

    #[test]
    fn scalar_override() {
        let result = deep_merge(&json!({"x": 1}), &json!({"x": 2}));
        assert_eq!(result["x"], 2);
    }

    #[test]
    fn object_deep_merge_keeps_base_only_keys() {
        let base = json!({"context": {"memory": {"type": "vector"}, "window": 8000}});
        let overlay = json!({"context": {"memory": {"ttl": 60}}});
        let result = deep_merge(&base, &overlay);

        assert_eq!(result["context"]["memory"]["type"], "vector");
        assert_eq!(result["context"]["memory"]["ttl"], 60);
        assert_eq!(result["context"]["window"], 8000);
    }

    #[test]
    fn plain_arrays_are_replaced() {
        let base = json!({"evaluation": {"metrics": ["a", "b", "c"]}});
        let overlay = json!({"evaluation": {"metrics": ["x"]}});
        let result = merged(base, overlay);
        assert_eq!(result["evaluation"]["metrics"], json!(["x"]));
    }

    #[test]
    fn type_mismatch_overlay_wins() {
        let result = deep_merge(&json!({"a": {"b": 1}}), &json!({"a": "flat"}));
        assert_eq!(result["a"], "flat");

        let result = deep_merge(&json!({"a": 1}), &json!({"a": null}));
        assert!(result["a"].is_null());
    }

    #[test]
    fn entries_merge_by_id() {
        let base = json!({"models": [{"id": "a", "x": 1, "name": "A"}, {"id": "b"}]});
        let overlay = json!({"models": [{"id": "a", "x": 2}, {"id": "c"}]});
        let result = merged(base, overlay);

        assert_eq!(
            result["models"],
            json!([{"id": "a", "x": 2, "name": "A"}, {"id": "b"}, {"id": "c"}])
        );
    }

    #[test]
    fn repeated_overlay_ids_are_kept_apart() {
        let base = json!({"models": [{"id": "parent_llm"}, {"id": "m1", "x": 0}]});
        let overlay = json!({"models": [
            {"id": "m1", "name": "first"},
            {"id": "m1", "name": "second"},
            {"id": "m2"},
            {"id": "m2", "name": "again"}
        ]});
        let outcome = merge_documents(&base, &overlay, InheritanceMode::Extend);

        assert_eq!(
            outcome.value["models"],
            json!([
                {"id": "parent_llm"},
                {"id": "m1", "x": 0, "name": "first"},
                {"id": "m1", "name": "second"},
                {"id": "m2"},
                {"id": "m2", "name": "again"}
            ])
        );
        assert_eq!(
            outcome.collisions,
            vec![IdCollision {
                section: "models".to_string(),
                id: "m1".to_string()
            }]
        );
    }

    #[test]
    fn nested_lists_inside_entries_are_replaced() {
        let base = json!({"tasks": [{"id": "t", "steps": [{"name": "one"}, {"name": "two"}]}]});
        let overlay = json!({"tasks": [{"id": "t", "steps": [{"name": "only"}]}]});
        let result = merged(base, overlay);
        assert_eq!(result["tasks"][0]["steps"], json!([{"name": "only"}]));
    }

    #[test]
    fn entries_without_id_are_appended_once() {
        let base = json!({"constraints": [{"rule": "no pii"}]});
        let overlay = json!({"constraints": [{"rule": "no pii"}, {"rule": "be brief"}]});
        let result = merged(base, overlay);
        assert_eq!(
            result["constraints"],
            json!([{"rule": "no pii"}, {"rule": "be brief"}])
        );
    }

    #[test]
    fn id_section_with_non_list_overlay_replaces() {
        let base = json!({"models": [{"id": "a"}]});
        let overlay = json!({"models": {"id": "a"}});
        assert_eq!(merged(base, overlay)["models"], json!({"id": "a"}));
    }

    #[test]
    fn override_mode_replaces_sections_wholesale() {
        let base = json!({
            "models": [{"id": "a"}, {"id": "b"}],
            "context": {"memory": {"type": "vector"}, "window": 10},
            "evaluation": {"metrics": ["m"]}
        });
        let overlay = json!({
            "models": [{"id": "c"}],
            "context": {"window": 20}
        });
        let outcome = merge_documents(&base, &overlay, InheritanceMode::Override);

        assert_eq!(outcome.value["models"], json!([{"id": "c"}]));
        assert_eq!(outcome.value["context"], json!({"window": 20}));
        assert_eq!(outcome.value["evaluation"], json!({"metrics": ["m"]}));
        assert!(outcome.collisions.is_empty());
    }

    #[test]
    fn extend_mode_reports_collisions() {
        let base = json!({"models": [{"id": "a", "x": 1}], "prompts": [{"id": "p"}]});
        let overlay = json!({"models": [{"id": "a", "x": 2}, {"id": "new"}], "prompts": [{"id": "q"}]});

        let outcome = merge_documents(&base, &overlay, InheritanceMode::Extend);
        assert_eq!(outcome.value["models"][0]["x"], 2);
        assert_eq!(
            outcome.collisions,
            vec![IdCollision {
                section: "models".to_string(),
                id: "a".to_string()
            }]
        );

        let quiet = merge_documents(&base, &overlay, InheritanceMode::Merge);
        assert!(quiet.collisions.is_empty());
        assert_eq!(quiet.value, outcome.value);
    }

    #[test]
    fn merge_with_self_is_identity() {
        let doc = json!({
            "openapia": "0.1.0",
            "info": {"title": "T", "ai_metadata": {"domain": "x"}},
            "models": [{"id": "m1", "params": {"t": 0.1}}, {"id": "m2"}],
            "tasks": [{"id": "t1", "steps": [{"name": "s", "action": "analyze"}]}],
            "context": {"memory": {"type": "none"}},
            "evaluation": {"metrics": ["accuracy"]}
        });
        assert_eq!(merged(doc.clone(), doc.clone()), doc);
    }

    #[test]
    fn merge_all_later_wins() {
        let docs = vec![
            json!({"info": {"title": "one", "version": "1"}, "models": [{"id": "a"}]}),
            json!({"info": {"title": "two"}, "models": [{"id": "b"}]}),
            json!({"info": {"title": "three"}}),
        ];
        let result = merge_all(&docs).unwrap();
        assert_eq!(result["info"], json!({"title": "three", "version": "1"}));
        assert_eq!(result["models"], json!([{"id": "a"}, {"id": "b"}]));
    }

    #[test]
    fn merge_all_drops_inherits() {
        let docs = vec![
            json!({"inherits": ["../org/base.yaml"], "info": {"title": "one"}}),
            json!({"inherits": "team.yaml", "models": [{"id": "a"}]}),
        ];
        let result = merge_all(&docs).unwrap();
        assert_eq!(result, json!({"info": {"title": "one"}, "models": [{"id": "a"}]}));
        assert!(merge_all(&docs[..1]).unwrap().get("inherits").is_none());
    }

    #[test]
    fn merge_all_requires_input() {
        assert!(matches!(merge_all(&[]), Err(SpecError::NoInputs)));
    }
}
