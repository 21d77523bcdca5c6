//! Structural rules for each section
//!
//! Every rule reports into the shared [`Diagnostics`] and moves on; a broken
//! section never stops the other sections from being checked.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use super::steps::validate_steps;
use super::{entry_location, require_fields};
use crate::diagnostics::{Diagnostics, Severity, ValidationIssue};
use crate::hierarchy::InheritanceMode;
use crate::section::{Section, VERSION_KEY};
use crate::shape::{entry_id, kind_name, ValueShape};

static SUPPORTED_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0\.1\.\d+$").expect("valid version pattern"));

const INFO_FIELDS: &[&str] = &["title", "version", "description", "author", "license"];
const COMPLEXITIES: &[&str] = &["low", "medium", "high"];
const MODEL_TYPES: &[&str] = &[
    "LLM",
    "Vision",
    "Audio",
    "Multimodal",
    "Classification",
    "Embedding",
];
const PROMPT_ROLES: &[&str] = &["system", "user", "assistant"];
const SEVERITIES: &[&str] = &["low", "medium", "high", "critical"];
const TRANSPORTS: &[&str] = &["stdio", "sse", "websocket"];
const AUTH_TYPES: &[&str] = &["none", "api_key", "oauth", "custom"];

/// Shared rules for a list of id-carrying entries
struct EntryRules {
    at: &'static str,
    label: &'static str,
    kind: &'static str,
    required: &'static [&'static str],
}

const MODELS: EntryRules = EntryRules {
    at: "models",
    label: "Model",
    kind: "model",
    required: &["id", "type", "provider", "name", "purpose"],
};

const PROMPTS: EntryRules = EntryRules {
    at: "prompts",
    label: "Prompt",
    kind: "prompt",
    required: &["id", "role", "template"],
};

const CONSTRAINTS: EntryRules = EntryRules {
    at: "constraints",
    label: "Constraint",
    kind: "constraint",
    required: &["id", "rule", "severity"],
};

const TASKS: EntryRules = EntryRules {
    at: "tasks",
    label: "Task",
    kind: "task",
    required: &["id", "description"],
};

const MCP_SERVERS: EntryRules = EntryRules {
    at: "context.mcp_servers",
    label: "MCP server",
    kind: "MCP server",
    required: &[
        "id",
        "name",
        "description",
        "version",
        "transport",
        "capabilities",
        "authentication",
    ],
};

/// Check the structure of a whole document.
pub fn validate_structure(doc: &Value, diagnostics: &mut Diagnostics) {
    let Some(root) = doc.as_object() else {
        diagnostics.add(ValidationIssue::RootNotMap {
            found: kind_name(doc),
        });
        return;
    };

    let required = std::iter::once(VERSION_KEY).chain(Section::REQUIRED.iter().map(|s| s.key()));
    for section in required {
        if !root.contains_key(section) {
            diagnostics.add(ValidationIssue::MissingSection {
                section: section.to_string(),
            });
        }
    }

    if let Some(version) = root.get(VERSION_KEY) {
        validate_version(version, diagnostics);
    }

    for section in Section::REQUIRED {
        let Some(value) = root.get(section.key()) else {
            continue;
        };
        match section {
            Section::Info => validate_info(value, diagnostics),
            Section::Models => validate_models(value, diagnostics),
            Section::Prompts => validate_prompts(value, diagnostics),
            Section::Constraints => validate_constraints(value, diagnostics),
            Section::Tasks => validate_tasks(value, diagnostics),
            Section::Context => validate_context(value, diagnostics),
            Section::Evaluation => validate_evaluation(value, diagnostics),
        }
    }
}

fn validate_version(version: &Value, diagnostics: &mut Diagnostics) {
    match version.expect_str(VERSION_KEY) {
        Ok(v) if SUPPORTED_VERSION.is_match(v) => {}
        Ok(v) => diagnostics.add(ValidationIssue::UnsupportedVersion {
            version: v.to_string(),
        }),
        Err(e) => diagnostics.add(e),
    }
}

fn validate_info(info: &Value, diagnostics: &mut Diagnostics) {
    let info = match info.expect_map("info") {
        Ok(info) => info,
        Err(e) => return diagnostics.add(e),
    };
    require_fields(info, "info", INFO_FIELDS, diagnostics);

    let metadata = match info.get("ai_metadata") {
        None => None,
        Some(value) => match value.expect_map("info.ai_metadata") {
            Ok(map) => Some(map),
            Err(e) => return diagnostics.add(e),
        },
    };

    if metadata.map_or(true, |m| !m.contains_key("domain")) {
        diagnostics.add(ValidationIssue::Recommended {
            location: "info.ai_metadata".to_string(),
            field: "domain".to_string(),
        });
    }

    let Some(metadata) = metadata else {
        return;
    };
    check_enum(
        metadata,
        "info.ai_metadata",
        "complexity",
        COMPLEXITIES,
        Severity::Error,
        diagnostics,
    );

    let raw_mode = metadata
        .get("hierarchy_info")
        .and_then(|h| h.lookup_str(&["inheritance_mode"]));
    if let Some(raw) = raw_mode {
        if raw.parse::<InheritanceMode>().is_err() {
            diagnostics.add(ValidationIssue::UnknownInheritanceMode {
                mode: raw.to_string(),
            });
        }
    }
}

fn validate_models(models: &Value, diagnostics: &mut Diagnostics) {
    let entries = checked_entries(models, &MODELS, diagnostics);
    if models.as_array().is_some_and(Vec::is_empty) {
        diagnostics.add(ValidationIssue::EmptySection {
            section: "models".to_string(),
        });
    }
    for (location, model) in entries {
        check_enum(model, &location, "type", MODEL_TYPES, Severity::Warning, diagnostics);
    }
}

fn validate_prompts(prompts: &Value, diagnostics: &mut Diagnostics) {
    for (location, prompt) in checked_entries(prompts, &PROMPTS, diagnostics) {
        check_enum(prompt, &location, "role", PROMPT_ROLES, Severity::Error, diagnostics);
    }
}

fn validate_constraints(constraints: &Value, diagnostics: &mut Diagnostics) {
    for (location, constraint) in checked_entries(constraints, &CONSTRAINTS, diagnostics) {
        check_enum(
            constraint,
            &location,
            "severity",
            SEVERITIES,
            Severity::Error,
            diagnostics,
        );
    }
}

fn validate_tasks(tasks: &Value, diagnostics: &mut Diagnostics) {
    for (location, task) in checked_entries(tasks, &TASKS, diagnostics) {
        validate_steps(&location, task, diagnostics);
    }
}

fn validate_context(context: &Value, diagnostics: &mut Diagnostics) {
    let context = match context.expect_map("context") {
        Ok(context) => context,
        Err(e) => return diagnostics.add(e),
    };

    if !context.contains_key("memory") {
        diagnostics.add(ValidationIssue::Recommended {
            location: "context".to_string(),
            field: "memory".to_string(),
        });
    }

    if let Some(servers) = context.get("mcp_servers") {
        for (location, server) in checked_entries(servers, &MCP_SERVERS, diagnostics) {
            validate_transport(server, &location, diagnostics);
            validate_authentication(server, &location, diagnostics);
        }
    }
}

fn validate_transport(server: &Map<String, Value>, location: &str, diagnostics: &mut Diagnostics) {
    let Some(transport) = server.get("transport") else {
        return;
    };
    let at = format!("{location} transport");
    let transport = match transport.expect_map(&at) {
        Ok(transport) => transport,
        Err(e) => return diagnostics.add(e),
    };

    require_fields(transport, &at, &["type"], diagnostics);
    let Some(kind) = check_enum(transport, &at, "type", TRANSPORTS, Severity::Error, diagnostics)
    else {
        return;
    };
    let needs: &[&str] = match kind {
        "stdio" => &["command"],
        _ => &["url"],
    };
    require_fields(transport, &at, needs, diagnostics);
}

fn validate_authentication(
    server: &Map<String, Value>,
    location: &str,
    diagnostics: &mut Diagnostics,
) {
    let Some(auth) = server.get("authentication") else {
        return;
    };
    let at = format!("{location} authentication");
    let auth = match auth.expect_map(&at) {
        Ok(auth) => auth,
        Err(e) => return diagnostics.add(e),
    };

    require_fields(auth, &at, &["type"], diagnostics);
    let credential = match check_enum(auth, &at, "type", AUTH_TYPES, Severity::Error, diagnostics) {
        Some("api_key") => "api_key",
        Some("oauth") => "token",
        _ => return,
    };
    if !auth.contains_key(credential) {
        diagnostics.add(ValidationIssue::Recommended {
            location: at,
            field: credential.to_string(),
        });
    }
}

fn validate_evaluation(evaluation: &Value, diagnostics: &mut Diagnostics) {
    let evaluation = match evaluation.expect_map("evaluation") {
        Ok(evaluation) => evaluation,
        Err(e) => return diagnostics.add(e),
    };
    if !evaluation.contains_key("metrics") {
        diagnostics.add(ValidationIssue::Recommended {
            location: "evaluation".to_string(),
            field: "metrics".to_string(),
        });
    }
}

/// Check list shape, entry shape, required fields and id uniqueness. Returns
/// the entries that are maps, with their location labels.
fn checked_entries<'a>(
    section: &'a Value,
    rules: &EntryRules,
    diagnostics: &mut Diagnostics,
) -> Vec<(String, &'a Map<String, Value>)> {
    let list = match section.expect_list(rules.at) {
        Ok(list) => list,
        Err(e) => {
            diagnostics.add(e);
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(list.len());
    for (index, entry) in list.iter().enumerate() {
        let location = entry_location(rules.label, index, entry, "id");
        let map = match entry.expect_map(&location) {
            Ok(map) => map,
            Err(e) => {
                diagnostics.add(e);
                continue;
            }
        };

        require_fields(map, &location, rules.required, diagnostics);
        if let Some(id) = entry_id(entry) {
            if !seen.insert(id) {
                diagnostics.add(ValidationIssue::DuplicateId {
                    kind: rules.kind,
                    id: id.to_string(),
                });
            }
        }
        entries.push((location, map));
    }
    entries
}

/// Check that `field`, when present, is one of `allowed`. Returns the string
/// value unless it is missing, mistyped, or rejected as an error.
fn check_enum<'a>(
    map: &'a Map<String, Value>,
    location: &str,
    field: &str,
    allowed: &'static [&'static str],
    severity: Severity,
    diagnostics: &mut Diagnostics,
) -> Option<&'a str> {
    let value = map.get(field).filter(|v| !v.is_null())?;
    let value = match value.expect_str(&format!("{location} {field}")) {
        Ok(value) => value,
        Err(e) => {
            diagnostics.add(e);
            return None;
        }
    };

    if allowed.contains(&value) {
        return Some(value);
    }

    let (location, field, found) = (location.to_string(), field.to_string(), value.to_string());
    match severity {
        Severity::Error => {
            diagnostics.add(ValidationIssue::InvalidValue {
                location,
                field,
                value: found,
                expected: allowed,
            });
            None
        }
        Severity::Warning => {
            diagnostics.add(ValidationIssue::UnknownValue {
                location,
                field,
                value: found,
                known: allowed,
            });
            Some(value)
        }
    }
}
