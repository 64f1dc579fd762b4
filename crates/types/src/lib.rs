//! Shared type definitions for Conductor workflows and runs.

pub mod agent;
pub mod run;
pub mod workflow;

pub use agent::AgentOverride;
pub use run::{RunStatus, StepRunStatus};
pub use workflow::{
    MOCK_AGENT_KIND, WorkflowAgentDeclaration, WorkflowDefinitionView, WorkflowDocument, WorkflowInputDefinition, WorkflowStepDefinition,
    WorkflowVersion, validation::normalize_run_inputs,
};
