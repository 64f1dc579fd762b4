//! Background task that drives one run from `pending` to a terminal state.
//!
//! Steps execute strictly in definition order. Each step resolves its input template against
//! the run's accumulated context, then hands the resolved input to the agent executor. The
//! first [`StepExecutionError`] halts the run. The only suspension point is the agent call.

use std::sync::Arc;

use conductor_types::WorkflowStepDefinition;
use tracing::{debug, info, warn};

use crate::{
    agents::AgentExecutor,
    error::StepExecutionError,
    model::WorkflowDefinition,
    templates::render_template,
    workflow::{runs::RunRegistry, state::RunState},
};

/// Drives a run to completion, publishing a snapshot to `runs` after every step transition.
///
/// The run leaves `pending` together with its first step, so no snapshot shows a running run
/// without a running step.
///
/// Returns the final state. Failures never escape: they are recorded on the run.
pub async fn drive_workflow_run(
    definition: Arc<WorkflowDefinition>,
    mut state: RunState,
    agents: Arc<dyn AgentExecutor>,
    runs: RunRegistry,
) -> RunState {
    state.begin();
    info!(run_id = %state.run_id, workflow = %state.workflow_name, "workflow run started");

    for (index, step) in definition.steps().iter().enumerate() {
        state.begin_step(index);
        runs.publish(&state);
        debug!(run_id = %state.run_id, step = %step.id, agent = %step.agent, "step started");

        match execute_step(index, step, &mut state, &runs, agents.as_ref()).await {
            Ok(output) => {
                state.complete_step(index, output);
                runs.publish(&state);
                debug!(run_id = %state.run_id, step = %step.id, "step completed");
            }
            Err(error) => {
                state.fail_step(index, &error);
                runs.publish(&state);
                warn!(run_id = %state.run_id, step = %step.id, error = %error, "workflow run failed");
                return state;
            }
        }
    }

    state.complete();
    runs.publish(&state);
    info!(run_id = %state.run_id, workflow = %state.workflow_name, "workflow run completed");
    state
}

/// Resolves the step input, records it, then awaits the agent.
async fn execute_step(
    index: usize,
    step: &WorkflowStepDefinition,
    state: &mut RunState,
    runs: &RunRegistry,
    agents: &dyn AgentExecutor,
) -> Result<String, StepExecutionError> {
    let input = render_template(&step.input, &state.template_context())?;
    state.record_step_input(index, input.clone());
    runs.publish(state);

    Ok(agents.execute(&step.agent, &input).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        agents::{AgentError, MockAgentExecutor},
        workflow::document::workflow_definition_from_document,
    };
    use async_trait::async_trait;
    use conductor_types::{RunStatus, StepRunStatus, WorkflowAgentDeclaration, WorkflowDocument, WorkflowVersion};
    use indexmap::IndexMap;

    fn definition(steps: Vec<WorkflowStepDefinition>) -> Arc<WorkflowDefinition> {
        let document = WorkflowDocument {
            version: WorkflowVersion::Number(1),
            name: "runner".into(),
            description: String::new(),
            inputs: Vec::new(),
            agents: vec![WorkflowAgentDeclaration::mock("planner"), WorkflowAgentDeclaration::mock("builder")],
            steps,
        };
        Arc::new(workflow_definition_from_document(&document, &MockAgentExecutor::new()).expect("valid definition"))
    }

    fn inputs() -> IndexMap<String, String> {
        IndexMap::from([("topic".to_string(), "demo".to_string())])
    }

    async fn run(definition: Arc<WorkflowDefinition>, agents: Arc<dyn AgentExecutor>) -> (RunState, RunRegistry) {
        let runs = RunRegistry::new();
        let state = RunState::new("run-1", &definition, inputs());
        runs.register(&state);
        let finished = drive_workflow_run(definition, state, agents, runs.clone()).await;
        (finished, runs)
    }

    #[tokio::test(start_paused = true)]
    async fn later_steps_consume_earlier_outputs() {
        let definition = definition(vec![
            WorkflowStepDefinition::new("a", "planner", "{{inputs.topic}}"),
            WorkflowStepDefinition::new("b", "builder", "{{steps.a.output}}"),
        ]);

        let (finished, runs) = run(definition, Arc::new(MockAgentExecutor::new())).await;

        assert_eq!(finished.status, RunStatus::Completed);
        assert_eq!(finished.steps[0].output.as_deref(), Some("Planner shaped a path: demo"));
        assert_eq!(finished.steps[1].input, finished.steps[0].output);
        assert_eq!(
            finished.steps[1].output.as_deref(),
            Some("Builder delivered the artifact: Planner shaped a path: demo")
        );
        assert_eq!(runs.snapshot("run-1"), Some(finished));
    }

    #[tokio::test(start_paused = true)]
    async fn unresolved_template_stops_before_later_steps() {
        let definition = definition(vec![
            WorkflowStepDefinition::new("a", "planner", "{{ inputs.missing }}"),
            WorkflowStepDefinition::new("b", "builder", "{{ steps.a.output }}"),
        ]);

        let (finished, _) = run(definition, Arc::new(MockAgentExecutor::new())).await;

        assert_eq!(finished.status, RunStatus::Failed);
        assert!(finished.current_step.is_none());
        assert_eq!(finished.error.as_deref(), Some("Unable to resolve template variable 'inputs.missing'"));
        assert_eq!(finished.steps[0].status, StepRunStatus::Failed);
        assert!(finished.steps[0].input.is_none());
        assert_eq!(finished.steps[1].status, StepRunStatus::Pending);
    }

    struct RefusingAgents;

    #[async_trait]
    impl AgentExecutor for RefusingAgents {
        fn supports(&self, _agent: &str) -> bool {
            true
        }

        fn supported_agents(&self) -> Vec<String> {
            Vec::new()
        }

        async fn execute(&self, agent: &str, _input: &str) -> Result<String, AgentError> {
            Err(AgentError::Unsupported { agent: agent.to_string() })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn agent_failure_is_recorded_after_the_input_resolves() {
        let definition = definition(vec![
            WorkflowStepDefinition::new("a", "planner", "{{ inputs.topic }}"),
            WorkflowStepDefinition::new("b", "builder", "{{ steps.a.output }}"),
        ]);

        let (finished, _) = run(definition, Arc::new(RefusingAgents)).await;

        assert_eq!(finished.status, RunStatus::Failed);
        assert_eq!(finished.error.as_deref(), Some("Agent 'planner' is not supported"));
        assert_eq!(finished.steps[0].input.as_deref(), Some("demo"));
        assert!(finished.steps[0].output.is_none());
        assert_eq!(finished.steps[1].status, StepRunStatus::Pending);
    }
}
