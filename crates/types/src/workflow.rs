//! Strongly typed workflow schema definitions shared across the engine and the CLI.
//!
//! A workflow is authored as a YAML or JSON document ([`WorkflowDocument`]) declaring its inputs,
//! the agents it may call, and an ordered list of steps. Authoring order is preserved everywhere
//! so that steps execute, and inputs render, in the sequence they were written.

pub mod validation;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Agent kind reported for every declared agent. Only mock agents exist.
pub const MOCK_AGENT_KIND: &str = "mock";

/// Raw workflow document as authored on disk, before domain validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkflowDocument {
    /// Authoring version, kept exactly as written (integer or string).
    pub version: WorkflowVersion,
    /// Canonical workflow name used as the registry key.
    #[serde(default)]
    pub name: String,
    /// Human-readable summary.
    #[serde(default)]
    pub description: String,
    /// Declared inputs in authoring order.
    #[serde(default)]
    pub inputs: Vec<WorkflowInputDefinition>,
    /// Agents the workflow is allowed to call.
    #[serde(default)]
    pub agents: Vec<WorkflowAgentDeclaration>,
    /// Ordered execution steps.
    #[serde(default)]
    pub steps: Vec<WorkflowStepDefinition>,
}

/// Workflow version as authored. Documents use either `version: 1` or `version: "1.0"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum WorkflowVersion {
    Number(u64),
    Text(String),
}

impl fmt::Display for WorkflowVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Metadata for a single workflow input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkflowInputDefinition {
    /// Input name referenced as `inputs.<name>` in step templates.
    pub name: String,
    /// Descriptive text explaining the purpose of the input.
    #[serde(default)]
    pub description: Option<String>,
    /// Inputs are required unless authored with `required: false`.
    #[serde(default = "default_required")]
    pub required: bool,
    /// Example value surfaced to whoever fills in the form.
    #[serde(default)]
    pub example: Option<String>,
}

impl WorkflowInputDefinition {
    /// Builds a required input with no metadata.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            required: true,
            example: None,
        }
    }

    /// Builds an optional input with no metadata.
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name)
        }
    }
}

/// Agent declaration inside a workflow document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkflowAgentDeclaration {
    /// Agent name, matched against the executor's supported agents.
    pub name: String,
    /// Agent kind. Always reported as `mock`.
    #[serde(default = "default_agent_kind")]
    pub kind: String,
}

impl WorkflowAgentDeclaration {
    pub fn mock(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: default_agent_kind(),
        }
    }
}

/// Describes a single step within a workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkflowStepDefinition {
    /// Step identifier, unique within the workflow and referenced as `steps.<id>`.
    pub id: String,
    /// Optional display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Agent that performs the step.
    pub agent: String,
    /// Input template resolved against the run context when the step is reached.
    pub input: String,
}

impl WorkflowStepDefinition {
    pub fn new(id: impl Into<String>, agent: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            agent: agent.into(),
            input: input.into(),
        }
    }
}

/// Read-only projection of a validated workflow returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkflowDefinitionView {
    pub version: WorkflowVersion,
    pub name: String,
    pub description: String,
    pub inputs: Vec<WorkflowInputDefinition>,
    pub agents: Vec<WorkflowAgentDeclaration>,
    pub steps: Vec<WorkflowStepDefinition>,
}

const fn default_required() -> bool {
    true
}

fn default_agent_kind() -> String {
    MOCK_AGENT_KIND.to_string()
}
