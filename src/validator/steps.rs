//! Task step actions

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use super::{entry_location, require_fields};
use crate::diagnostics::{Diagnostics, ValidationIssue};
use crate::shape::ValueShape;

/// What a step does. Unrecognized actions are tolerated with a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    Analyze,
    Generate,
    Validate,
    Search,
    Escalate,
    Classify,
    /// Call a tool exposed by an MCP server
    McpTool,
    /// Read a resource exposed by an MCP server
    McpResource,
}

impl StepAction {
    pub const ALL: &'static [&'static str] = &[
        "analyze",
        "generate",
        "validate",
        "search",
        "escalate",
        "classify",
        "mcp_tool",
        "mcp_resource",
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StepAction::Analyze => "analyze",
            StepAction::Generate => "generate",
            StepAction::Validate => "validate",
            StepAction::Search => "search",
            StepAction::Escalate => "escalate",
            StepAction::Classify => "classify",
            StepAction::McpTool => "mcp_tool",
            StepAction::McpResource => "mcp_resource",
        }
    }

    /// Step fields this action needs on top of `name` and `action`
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            StepAction::McpTool => &["mcp_server", "mcp_tool"],
            StepAction::McpResource => &["mcp_server", "mcp_resource"],
            StepAction::Analyze
            | StepAction::Generate
            | StepAction::Validate
            | StepAction::Search
            | StepAction::Escalate
            | StepAction::Classify => &[],
        }
    }
}

impl FromStr for StepAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "analyze" => Ok(StepAction::Analyze),
            "generate" => Ok(StepAction::Generate),
            "validate" => Ok(StepAction::Validate),
            "search" => Ok(StepAction::Search),
            "escalate" => Ok(StepAction::Escalate),
            "classify" => Ok(StepAction::Classify),
            "mcp_tool" => Ok(StepAction::McpTool),
            "mcp_resource" => Ok(StepAction::McpResource),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location label of step `index` inside the task at `task_location`
pub(crate) fn step_location(task_location: &str, index: usize, step: &Value) -> String {
    let label = format!("{task_location} step");
    entry_location(&label, index, step, "name")
}

/// Check the `steps` list of one task. A task without `steps` is fine.
pub(crate) fn validate_steps(
    task_location: &str,
    task: &Map<String, Value>,
    diagnostics: &mut Diagnostics,
) {
    let Some(steps) = task.get("steps") else {
        return;
    };
    let steps = match steps.expect_list(&format!("{task_location} steps")) {
        Ok(steps) => steps,
        Err(e) => {
            diagnostics.add(e);
            return;
        }
    };

    for (index, step) in steps.iter().enumerate() {
        let location = step_location(task_location, index, step);
        let step = match step.expect_map(&location) {
            Ok(step) => step,
            Err(e) => {
                diagnostics.add(e);
                continue;
            }
        };

        require_fields(step, &location, &["name", "action"], diagnostics);

        let Some(action) = step.get("action").filter(|a| !a.is_null()) else {
            continue;
        };
        let action = match action.expect_str(&format!("{location} action")) {
            Ok(action) => action,
            Err(e) => {
                diagnostics.add(e);
                continue;
            }
        };

        match action.parse::<StepAction>() {
            Ok(action) => require_fields(step, &location, action.required_fields(), diagnostics),
            Err(unknown) => diagnostics.add(ValidationIssue::UnknownValue {
                location,
                field: "action".to_string(),
                value: unknown,
                known: StepAction::ALL,
            }),
        }
    }
}
