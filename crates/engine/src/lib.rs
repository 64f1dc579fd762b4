//! # Conductor Engine
//!
//! The Conductor Engine validates declarative multi-step workflows and executes them in the
//! background. Each step is dispatched to a named agent; later steps consume earlier outputs
//! through `{{ path.to.value }}` templates, and callers poll run snapshots by id.
//!
//! ## Usage
//!
//! ```rust
//! use std::{collections::HashMap, sync::Arc, time::Duration};
//!
//! use conductor_engine::{DirectoryDefinitionSource, MockAgentExecutor, WorkflowEngine};
//!
//! # #[tokio::main(flavor = "current_thread", start_paused = true)]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let temp_dir = tempfile::tempdir()?;
//! std::fs::write(
//!     temp_dir.path().join("hello.yaml"),
//!     r#"
//! version: 1
//! name: hello
//! inputs:
//!   - name: topic
//! agents:
//!   - name: planner
//! steps:
//!   - id: plan
//!     agent: planner
//!     input: "{{ inputs.topic }}"
//! "#,
//! )?;
//!
//! let engine = WorkflowEngine::with_source(DirectoryDefinitionSource::new(temp_dir.path()), Arc::new(MockAgentExecutor::new()));
//! let inputs = HashMap::from([("topic".to_string(), "demo".to_string())]);
//! let run_id = engine.start_run("hello", &inputs)?;
//!
//! let run = engine.wait_for_terminal(&run_id, Duration::from_millis(100)).await?;
//! assert_eq!(run.steps[0].output.as_deref(), Some("Planner shaped a path: demo"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **`templates`**: placeholder scanning and dot-path resolution
//! - **`agents`**: the agent execution contract and the mock agent table
//! - **`model`**: the validated, immutable workflow definition
//! - **`workflow`**: definition loading, run state, the run driver, and the engine handle
//! - **`error`**: errors surfaced to callers and recorded on failed runs

use std::{fs, path::Path};

use anyhow::{Context, Result};
use conductor_types::WorkflowDocument;

pub mod agents;
pub mod error;
pub mod model;
pub mod templates;
pub mod workflow;

pub use agents::{AgentError, AgentExecutor, MockAgentExecutor, MockAgentProfile, default_mock_profiles};
pub use error::{EngineError, StepExecutionError, ValidationError};
pub use model::WorkflowDefinition;
pub use templates::{TemplateContext, TemplateError, TemplateValue, render_template};
pub use workflow::definitions::{DefinitionRegistry, DefinitionSource, DirectoryDefinitionSource, StaticDefinitionSource};
pub use workflow::document::workflow_definition_from_document;
pub use workflow::engine::WorkflowEngine;
pub use workflow::runner::drive_workflow_run;
pub use workflow::runs::RunRegistry;
pub use workflow::state::{RunState, StepRunState};

/// Loads one workflow document from disk.
///
/// YAML (`.yml`, `.yaml`) and JSON (`.json`) are both accepted; JSON is parsed through the YAML
/// reader, which is a superset.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not describe a workflow document.
///
/// ```rust
/// use conductor_engine::parse_workflow_file;
///
/// let temp_dir = tempfile::tempdir()?;
/// let workflow_path = temp_dir.path().join("draft.yaml");
/// std::fs::write(&workflow_path, "version: 1\nname: draft\nsteps: []\n")?;
///
/// let document = parse_workflow_file(&workflow_path)?;
/// assert_eq!(document.name, "draft");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn parse_workflow_file(file_path: impl AsRef<Path>) -> Result<WorkflowDocument> {
    let file_path = file_path.as_ref();
    let file_content =
        fs::read_to_string(file_path).with_context(|| format!("Failed to read workflow file: {}", file_path.display()))?;

    serde_yaml::from_str(&file_content).with_context(|| format!("Failed to parse workflow file: {}", file_path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use conductor_types::WorkflowVersion;

    #[test]
    fn parses_yaml_documents() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let workflow_path = temp_dir.path().join("workflow.yaml");
        fs::write(
            &workflow_path,
            r#"
version: 1
name: review
description: plan then build
inputs:
  - name: topic
    description: What to work on
  - name: audience
    required: false
agents:
  - name: planner
  - name: builder
steps:
  - id: plan
    agent: planner
    input: "{{ inputs.topic }}"
  - id: build
    name: Build it
    agent: builder
    input: "{{ steps.plan.output }}"
"#,
        )
        .expect("write workflow");

        let document = parse_workflow_file(&workflow_path).expect("parsed workflow");

        assert_eq!(document.version, WorkflowVersion::Number(1));
        assert_eq!(document.name, "review");
        assert!(document.inputs[0].required);
        assert!(!document.inputs[1].required);
        assert_eq!(document.steps[1].name.as_deref(), Some("Build it"));
    }

    #[test]
    fn parses_json_documents() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let workflow_path = temp_dir.path().join("workflow.json");
        fs::write(
            &workflow_path,
            r#"{"version": "2024-01", "name": "json", "agents": [{"name": "planner", "kind": "mock"}], "steps": [{"id": "a", "agent": "planner", "input": "x"}]}"#,
        )
        .expect("write workflow");

        let document = parse_workflow_file(&workflow_path).expect("parsed workflow");

        assert_eq!(document.version, WorkflowVersion::Text("2024-01".into()));
        assert_eq!(document.agents[0].name, "planner");
    }

    #[test]
    fn reports_the_offending_path() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let workflow_path = temp_dir.path().join("broken.yaml");
        fs::write(&workflow_path, "steps: {not: [a list").expect("write workflow");

        let error = parse_workflow_file(&workflow_path).expect_err("invalid yaml");
        assert!(error.to_string().contains("broken.yaml"));

        let missing = parse_workflow_file(temp_dir.path().join("absent.yaml")).expect_err("missing file");
        assert!(missing.to_string().starts_with("Failed to read workflow file"));
    }
}
