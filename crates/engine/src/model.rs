//! # Validated Workflow Model
//!
//! [`WorkflowDefinition`] is the immutable, validated form of a
//! [`WorkflowDocument`](conductor_types::WorkflowDocument). It is only produced by
//! [`workflow_definition_from_document`](crate::workflow::document::workflow_definition_from_document),
//! so holding one means:
//!
//! - the name is non-empty and step ids are unique
//! - every step's agent appears in the declared agent set
//! - every declared agent is supported by the agent executor
//!
//! Definitions are shared read-only (behind an `Arc`) by every run of that workflow.

use conductor_types::{
    WorkflowAgentDeclaration, WorkflowDefinitionView, WorkflowInputDefinition, WorkflowStepDefinition, WorkflowVersion,
};
use indexmap::IndexSet;

/// Validated, immutable workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowDefinition {
    pub(crate) version: WorkflowVersion,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) inputs: Vec<WorkflowInputDefinition>,
    pub(crate) agents: IndexSet<String>,
    pub(crate) steps: Vec<WorkflowStepDefinition>,
}

impl WorkflowDefinition {
    pub fn version(&self) -> &WorkflowVersion {
        &self.version
    }

    /// Unique registry key.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Declared inputs in authoring order.
    pub fn inputs(&self) -> &[WorkflowInputDefinition] {
        &self.inputs
    }

    /// Declared agent names in authoring order.
    pub fn agents(&self) -> impl Iterator<Item = &str> {
        self.agents.iter().map(String::as_str)
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[WorkflowStepDefinition] {
        &self.steps
    }

    pub fn step(&self, step_id: &str) -> Option<&WorkflowStepDefinition> {
        self.steps.iter().find(|step| step.id == step_id)
    }

    /// Serializable projection handed to callers.
    pub fn view(&self) -> WorkflowDefinitionView {
        WorkflowDefinitionView {
            version: self.version.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            inputs: self.inputs.clone(),
            agents: self.agents.iter().map(WorkflowAgentDeclaration::mock).collect(),
            steps: self.steps.clone(),
        }
    }
}
