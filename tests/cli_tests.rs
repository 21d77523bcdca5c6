//! Integration tests for the OpenAPIA CLI
//!
//! These tests run the actual binary against specification files written
//! into temporary directories.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const VALID_SPEC: &str = r#"
openapia: "0.1.0"
info:
  title: Support Assistant
  version: "1.0.0"
  description: Answers support tickets
  author: Support Team
  license: Apache-2.0
  ai_metadata:
    domain: customer_support
models:
  - id: m1
    type: LLM
    provider: openai
    name: gpt-4
    purpose: Drafts replies
prompts:
  - id: p1
    role: system
    template: "You are a helpful support agent."
constraints:
  - id: c1
    rule: Never reveal personal data
    severity: high
tasks:
  - id: t1
    description: Answer a ticket
    steps:
      - name: draft
        action: generate
        model: m1
        prompt: p1
context:
  memory:
    type: conversation
evaluation:
  metrics: [accuracy]
"#;

/// Get the binary to test, isolated from ambient config and environment
fn openapia_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("openapia").unwrap();
    cmd.current_dir(dir)
        .env_remove("OPENAPIA_FORMAT")
        .env_remove("OPENAPIA_MAX_DEPTH")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn test_help_lists_subcommands() {
    let temp_dir = TempDir::new().unwrap();
    openapia_cmd(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("tree"))
        .stdout(predicate::str::contains("merge"));
}

#[test]
fn test_validate_help() {
    let temp_dir = TempDir::new().unwrap();
    openapia_cmd(temp_dir.path())
        .args(["validate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--hierarchical"))
        .stdout(predicate::str::contains("--format"))
        .stdout(predicate::str::contains("--quiet"));
}

// ============================================================================
// validate
// ============================================================================

#[test]
fn test_validate_valid_spec() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "spec.yaml", VALID_SPEC);

    openapia_cmd(temp_dir.path())
        .args(["validate", "spec.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Specification is valid"));
}

#[test]
fn test_validate_json_input() {
    let temp_dir = TempDir::new().unwrap();
    let doc: serde_json::Value = serde_yaml::from_str(VALID_SPEC).unwrap();
    write(
        temp_dir.path(),
        "spec.json",
        &serde_json::to_string_pretty(&doc).unwrap(),
    );

    openapia_cmd(temp_dir.path())
        .args(["validate", "spec.json"])
        .assert()
        .success();
}

#[test]
fn test_validate_reports_errors_and_fails() {
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "broken.yaml",
        "openapia: \"0.1.0\"\ninfo:\n  title: Broken\n",
    );

    openapia_cmd(temp_dir.path())
        .args(["validate", "broken.yaml"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Missing required section: models"))
        .stdout(predicate::str::contains("info missing required field: author"))
        .stdout(predicate::str::contains("Fix:"));
}

#[test]
fn test_validate_warnings_do_not_fail() {
    let temp_dir = TempDir::new().unwrap();
    let spec = VALID_SPEC.replace("evaluation:\n  metrics: [accuracy]\n", "evaluation: {}\n");
    write(temp_dir.path(), "spec.yaml", &spec);

    openapia_cmd(temp_dir.path())
        .args(["validate", "spec.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("evaluation should define metrics"));

    openapia_cmd(temp_dir.path())
        .args(["validate", "spec.yaml", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Warnings:").not());
}

#[test]
fn test_validate_json_report() {
    let temp_dir = TempDir::new().unwrap();
    let spec = VALID_SPEC.replace("model: m1", "model: unknown_model");
    write(temp_dir.path(), "spec.yaml", &spec);

    let output = openapia_cmd(temp_dir.path())
        .args(["validate", "spec.yaml", "--format", "json"])
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["valid"], false);
    assert_eq!(
        report["errors"][0],
        "Task 0 (t1) step 0 (draft) references unknown model: unknown_model"
    );
    assert_eq!(report["warnings"], serde_json::json!([]));
}

#[test]
fn test_validate_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    openapia_cmd(temp_dir.path())
        .args(["validate", "nope.yaml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("nope.yaml"));
}

#[test]
fn test_validate_malformed_yaml() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "bad.yaml", "info: [unclosed\n");

    openapia_cmd(temp_dir.path())
        .args(["validate", "bad.yaml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("Fix:"));
}

#[test]
fn test_validate_unsupported_extension() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "spec.txt", VALID_SPEC);

    openapia_cmd(temp_dir.path())
        .args(["validate", "spec.txt"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error:"));
}

// ============================================================================
// validate --hierarchical
// ============================================================================

#[test]
fn test_hierarchical_validation_uses_parents() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "org/base.yaml", VALID_SPEC);
    write(
        temp_dir.path(),
        "teams/search.yaml",
        r#"
inherits: [../org/base.yaml]
info:
  title: Search Team
models:
  - id: ranker
    type: Classification
    provider: internal
    name: ranker-v2
    purpose: Orders results
tasks:
  - id: rank
    description: Rank results
    steps:
      - name: score
        action: classify
        model: ranker
      - name: explain
        action: generate
        model: m1
        prompt: p1
"#,
    );

    openapia_cmd(temp_dir.path())
        .args(["validate", "teams/search.yaml", "--hierarchical"])
        .assert()
        .success()
        .stdout(predicate::str::contains("with inheritance"));

    // Without resolution the child alone is incomplete.
    openapia_cmd(temp_dir.path())
        .args(["validate", "teams/search.yaml"])
        .assert()
        .code(1);
}

#[test]
fn test_hierarchical_missing_parent() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "child.yaml", "inherits: [missing.yaml]\n");

    openapia_cmd(temp_dir.path())
        .args(["validate", "child.yaml", "--hierarchical"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("missing.yaml"))
        .stderr(predicate::str::contains("Fix:"));
}

#[test]
fn test_hierarchical_cycle() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "a.yaml", "inherits: [b.yaml]\n");
    write(temp_dir.path(), "b.yaml", "inherits: [a.yaml]\n");

    openapia_cmd(temp_dir.path())
        .args(["validate", "a.yaml", "--hierarchical"])
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cycle"));
}

// ============================================================================
// tree
// ============================================================================

#[test]
fn test_tree_shows_hierarchy() {
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "org.yaml",
        "info:\n  title: Org\n  ai_metadata:\n    hierarchy_info: {level: organization, scope: global}\n",
    );
    write(
        temp_dir.path(),
        "feature.yaml",
        "inherits: [org.yaml, gone.yaml]\ninfo:\n  title: Feature\n  ai_metadata:\n    hierarchy_info: {parent_specs: [org.yaml]}\n",
    );

    openapia_cmd(temp_dir.path())
        .args(["tree", "feature.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("📄 Feature (unknown/unknown)"))
        .stdout(predicate::str::contains("  📄 Org (organization/global)"))
        .stdout(predicate::str::contains("Path:"))
        .stdout(predicate::str::contains("Parent specs: org.yaml"))
        .stdout(predicate::str::contains("Error loading"));
}

#[test]
fn test_tree_survives_cycles() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "a.yaml", "inherits: [b.yaml]\ninfo: {title: A}\n");
    write(temp_dir.path(), "b.yaml", "inherits: [a.yaml]\ninfo: {title: B}\n");

    openapia_cmd(temp_dir.path())
        .args(["tree", "a.yaml"])
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .success()
        .stdout(predicate::str::contains("inheritance cycle"));
}

#[test]
fn test_tree_fails_when_root_is_missing() {
    let temp_dir = TempDir::new().unwrap();

    openapia_cmd(temp_dir.path())
        .args(["tree", "absent.yaml"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Error loading"));
}

#[test]
fn test_tree_succeeds_when_only_a_parent_is_missing() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "child.yaml", "inherits: [gone.yaml]\ninfo: {title: Child}\n");

    openapia_cmd(temp_dir.path())
        .args(["tree", "child.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Error loading"));
}

// ============================================================================
// merge
// ============================================================================

#[test]
fn test_merge_writes_json_by_extension() {
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "one.yaml",
        "info: {title: One, version: \"1\"}\nmodels:\n  - id: a\n    name: first\n",
    );
    write(
        temp_dir.path(),
        "two.json",
        r#"{"info": {"title": "Two"}, "models": [{"id": "a", "name": "second"}, {"id": "b"}]}"#,
    );

    openapia_cmd(temp_dir.path())
        .args(["merge", "out.json", "one.yaml", "two.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Merged 2 specification(s)"));

    let text = fs::read_to_string(temp_dir.path().join("out.json")).unwrap();
    let merged: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(merged["info"]["title"], "Two");
    assert_eq!(merged["info"]["version"], "1");
    assert_eq!(
        merged["models"],
        serde_json::json!([{"id": "a", "name": "second"}, {"id": "b"}])
    );
}

#[test]
fn test_merge_defaults_to_yaml() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "one.yaml", "info: {title: One}\n");

    openapia_cmd(temp_dir.path())
        .args(["merge", "merged.out", "one.yaml"])
        .assert()
        .success();

    let text = fs::read_to_string(temp_dir.path().join("merged.out")).unwrap();
    let merged: serde_json::Value = serde_yaml::from_str(&text).unwrap();
    assert_eq!(merged["info"]["title"], "One");
}

#[test]
fn test_merge_format_flag_overrides_extension() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "one.yaml", "info: {title: One}\n");

    openapia_cmd(temp_dir.path())
        .args(["merge", "merged.yaml", "one.yaml", "--format", "json"])
        .assert()
        .success();

    let text = fs::read_to_string(temp_dir.path().join("merged.yaml")).unwrap();
    assert!(text.trim_start().starts_with('{'));
}

#[test]
fn test_merge_drops_inherits() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "org/base.yaml", "info: {title: Base}\n");
    write(
        temp_dir.path(),
        "org/team.yaml",
        "inherits: [base.yaml]\ninfo: {title: Team}\n",
    );

    openapia_cmd(temp_dir.path())
        .args(["merge", "out.json", "org/team.yaml"])
        .assert()
        .success();

    let text = fs::read_to_string(temp_dir.path().join("out.json")).unwrap();
    let merged: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert!(merged.get("inherits").is_none());
    assert_eq!(merged["info"]["title"], "Team");
}

#[test]
fn test_merge_missing_input_fails() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "one.yaml", "info: {title: One}\n");

    openapia_cmd(temp_dir.path())
        .args(["merge", "out.yaml", "one.yaml", "absent.yaml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("absent.yaml"));
    assert!(!temp_dir.path().join("out.yaml").exists());
}

#[test]
fn test_merge_requires_inputs() {
    let temp_dir = TempDir::new().unwrap();
    openapia_cmd(temp_dir.path())
        .args(["merge", "out.yaml"])
        .assert()
        .failure();
}

// ============================================================================
// configuration
// ============================================================================

#[test]
fn test_config_file_selects_json_report() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "openapia.toml", "[output]\nformat = \"json\"\n");
    write(temp_dir.path(), "spec.yaml", VALID_SPEC);

    openapia_cmd(temp_dir.path())
        .args(["validate", "spec.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"valid\": true"));

    // Flag beats file
    openapia_cmd(temp_dir.path())
        .args(["validate", "spec.yaml", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Specification is valid"));
}

#[test]
fn test_env_selects_json_report() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "spec.yaml", VALID_SPEC);

    openapia_cmd(temp_dir.path())
        .env("OPENAPIA_FORMAT", "json")
        .args(["validate", "spec.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"valid\": true"));
}

#[test]
fn test_config_max_depth_limits_chains() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "settings.toml", "[resolver]\nmax_depth = 1\n");
    write(temp_dir.path(), "base.yaml", VALID_SPEC);
    write(temp_dir.path(), "child.yaml", "inherits: [base.yaml]\n");

    openapia_cmd(temp_dir.path())
        .args(["--config", "settings.toml", "validate", "child.yaml", "--hierarchical"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error:"));

    openapia_cmd(temp_dir.path())
        .args(["validate", "child.yaml", "--hierarchical"])
        .assert()
        .success();
}

#[test]
fn test_malformed_config_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "openapia.toml", "[output\n");
    write(temp_dir.path(), "spec.yaml", VALID_SPEC);

    openapia_cmd(temp_dir.path())
        .args(["validate", "spec.yaml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Config error"));
}
