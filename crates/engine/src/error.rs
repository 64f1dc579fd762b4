//! Error taxonomy surfaced by the engine.

use thiserror::Error;

use crate::{agents::AgentError, templates::TemplateError};

/// Errors returned to callers of the public engine operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("Workflow not found: {0}")]
    WorkflowNotFound(String),
    #[error("Run not found: {0}")]
    RunNotFound(String),
    /// Raised at run start, before a run identifier is issued.
    #[error("Missing required input: {0}")]
    MissingRequiredInput(String),
}

/// A workflow document that violates the domain rules. Fatal to that one definition only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("workflow definition is missing the required 'name'")]
    MissingName,
    #[error("workflow '{workflow}' must declare at least one step")]
    EmptySteps { workflow: String },
    #[error("workflow '{workflow}' declares step '{step_id}' more than once")]
    DuplicateStep { workflow: String, step_id: String },
    #[error("workflow '{workflow}' declares input '{input}' more than once")]
    DuplicateInput { workflow: String, input: String },
    #[error("workflow '{workflow}' declares unsupported agent '{agent}'")]
    UnsupportedAgent { workflow: String, agent: String },
    #[error("Step {step_id} references unknown agent {agent}")]
    UndeclaredAgent { workflow: String, step_id: String, agent: String },
}

/// Failure of a single step during a run.
///
/// Never returned to a poller: the message is recorded on the run and the run ends `failed`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StepExecutionError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Agent(#[from] AgentError),
}
