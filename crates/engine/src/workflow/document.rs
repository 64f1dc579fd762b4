//! Conversion from authored workflow documents to validated definitions.
//!
//! Schema conformance of the raw document is handled by deserialization. This module enforces
//! the domain rules on top: a non-empty name, at least one step, unique step and input names,
//! declared agents that the executor supports, and steps that only use declared agents.

use std::collections::HashSet;

use conductor_types::WorkflowDocument;
use indexmap::IndexSet;

use crate::{agents::AgentExecutor, error::ValidationError, model::WorkflowDefinition};

/// Builds a validated definition from a document.
///
/// Errors name the offending step id or agent so authors can locate the problem.
pub fn workflow_definition_from_document(
    document: &WorkflowDocument,
    executor: &dyn AgentExecutor,
) -> Result<WorkflowDefinition, ValidationError> {
    let name = document.name.trim().to_string();
    if name.is_empty() {
        return Err(ValidationError::MissingName);
    }

    if document.steps.is_empty() {
        return Err(ValidationError::EmptySteps { workflow: name });
    }

    let mut seen_steps = HashSet::new();
    for step in &document.steps {
        if !seen_steps.insert(step.id.as_str()) {
            return Err(ValidationError::DuplicateStep {
                workflow: name,
                step_id: step.id.clone(),
            });
        }
    }

    let mut seen_inputs = HashSet::new();
    for input in &document.inputs {
        if !seen_inputs.insert(input.name.as_str()) {
            return Err(ValidationError::DuplicateInput {
                workflow: name,
                input: input.name.clone(),
            });
        }
    }

    let agents: IndexSet<String> = document.agents.iter().map(|agent| agent.name.clone()).collect();
    if let Some(unsupported) = agents.iter().find(|agent| !executor.supports(agent)) {
        return Err(ValidationError::UnsupportedAgent {
            workflow: name,
            agent: unsupported.clone(),
        });
    }

    if let Some(step) = document.steps.iter().find(|step| !agents.contains(&step.agent)) {
        return Err(ValidationError::UndeclaredAgent {
            workflow: name,
            step_id: step.id.clone(),
            agent: step.agent.clone(),
        });
    }

    Ok(WorkflowDefinition {
        version: document.version.clone(),
        name,
        description: document.description.clone(),
        inputs: document.inputs.clone(),
        agents,
        steps: document.steps.clone(),
    })
}
