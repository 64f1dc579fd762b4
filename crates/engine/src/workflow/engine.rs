//! Caller-facing engine operations.
//!
//! [`WorkflowEngine`] is a cheap, cloneable handle over the definition registry, the run
//! registry, and the agent executor. Starting a run validates inputs, registers a `pending`
//! snapshot, spawns the background task, and returns the run id without waiting.

use std::{collections::HashMap, sync::Arc, time::Duration};

use conductor_types::{WorkflowDefinitionView, normalize_run_inputs};
use tracing::info;
use uuid::Uuid;

use crate::{
    agents::AgentExecutor,
    error::EngineError,
    workflow::{
        definitions::{DefinitionRegistry, DefinitionSource},
        runner::drive_workflow_run,
        runs::RunRegistry,
        state::RunState,
    },
};

#[derive(Clone)]
pub struct WorkflowEngine {
    definitions: Arc<DefinitionRegistry>,
    runs: RunRegistry,
    agents: Arc<dyn AgentExecutor>,
}

impl WorkflowEngine {
    /// Engine over an existing definition registry with an empty run table.
    pub fn new(definitions: Arc<DefinitionRegistry>, agents: Arc<dyn AgentExecutor>) -> Self {
        Self {
            definitions,
            runs: RunRegistry::new(),
            agents,
        }
    }

    /// Engine whose definitions load lazily from `source`, validated against `agents`.
    pub fn with_source(source: impl DefinitionSource + 'static, agents: Arc<dyn AgentExecutor>) -> Self {
        let definitions = Arc::new(DefinitionRegistry::with_source(source, Arc::clone(&agents)));
        Self::new(definitions, agents)
    }

    pub fn definitions(&self) -> &DefinitionRegistry {
        &self.definitions
    }

    pub fn runs(&self) -> &RunRegistry {
        &self.runs
    }

    /// Starts a run of `workflow_name` and returns its id immediately.
    ///
    /// Must be called from within a Tokio runtime. Nothing is registered when the workflow is
    /// unknown or a required input is missing.
    pub fn start_run(&self, workflow_name: &str, inputs: &HashMap<String, String>) -> Result<String, EngineError> {
        let definition = self
            .definitions
            .get(workflow_name)
            .ok_or_else(|| EngineError::WorkflowNotFound(workflow_name.to_string()))?;
        let inputs = normalize_run_inputs(definition.inputs(), inputs).map_err(EngineError::MissingRequiredInput)?;

        let run_id = Uuid::new_v4().to_string();
        let state = RunState::new(run_id.clone(), &definition, inputs);
        self.runs.register(&state);
        info!(run_id = %run_id, workflow = %workflow_name, steps = state.steps.len(), "workflow run scheduled");

        tokio::spawn(drive_workflow_run(definition, state, Arc::clone(&self.agents), self.runs.clone()));
        Ok(run_id)
    }

    /// Latest snapshot of a run.
    pub fn get_run(&self, run_id: &str) -> Result<RunState, EngineError> {
        self.runs
            .snapshot(run_id)
            .ok_or_else(|| EngineError::RunNotFound(run_id.to_string()))
    }

    pub fn get_definition(&self, workflow_name: &str) -> Result<WorkflowDefinitionView, EngineError> {
        self.definitions
            .get(workflow_name)
            .map(|definition| definition.view())
            .ok_or_else(|| EngineError::WorkflowNotFound(workflow_name.to_string()))
    }

    /// Views of every loaded definition, in load order.
    pub fn list_definitions(&self) -> Vec<WorkflowDefinitionView> {
        self.definitions
            .definitions()
            .iter()
            .map(|definition| definition.view())
            .collect()
    }

    pub fn list_runs(&self) -> Vec<RunState> {
        self.runs.snapshots()
    }

    /// Polls [`get_run`](Self::get_run) every `poll_interval` until the run is terminal.
    pub async fn wait_for_terminal(&self, run_id: &str, poll_interval: Duration) -> Result<RunState, EngineError> {
        loop {
            let snapshot = self.get_run(run_id)?;
            if snapshot.is_terminal() {
                return Ok(snapshot);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}
