//! Run state machine.
//!
//! A [`RunState`] records one execution of a workflow. The background task driving the run owns
//! it exclusively and advances it through the transitions below; everyone else sees clones
//! published to the [`RunRegistry`](crate::workflow::runs::RunRegistry).
//!
//! Run:  `pending -> running -> (completed | failed)`
//! Step: `pending -> running -> (completed | failed)`
//!
//! While running, the step named by `current_step` is the only `running` step, every earlier
//! step is `completed`, and every later step is `pending`. Terminal runs have no `current_step`.

use chrono::{DateTime, Utc};
use conductor_types::{RunStatus, StepRunStatus};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    error::StepExecutionError,
    model::WorkflowDefinition,
    templates::{TemplateContext, TemplateValue},
};

/// Progress of one step within a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepRunState {
    pub id: String,
    pub agent: String,
    /// Resolved input, populated once the step is reached and its template resolves.
    pub input: Option<String>,
    /// Agent output, populated once the step completes.
    pub output: Option<String>,
    pub status: StepRunStatus,
}

impl StepRunState {
    fn pending(id: &str, agent: &str) -> Self {
        Self {
            id: id.to_string(),
            agent: agent.to_string(),
            input: None,
            output: None,
            status: StepRunStatus::Pending,
        }
    }

    fn advance(&mut self, next: StepRunStatus) {
        debug_assert!(
            next.rank() == self.status.rank() + 1,
            "step '{}' cannot move from {} to {}",
            self.id,
            self.status,
            next
        );
        self.status = next;
    }
}

/// Snapshot-able record of one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunState {
    pub run_id: String,
    pub workflow_name: String,
    pub status: RunStatus,
    /// Id of the step presently executing.
    pub current_step: Option<String>,
    /// One entry per definition step, in definition order.
    pub steps: Vec<StepRunState>,
    /// Failure message, present only when `status` is `failed`.
    pub error: Option<String>,
    /// Normalized caller inputs.
    pub inputs: IndexMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunState {
    /// Fresh `pending` run with every step `pending`.
    pub fn new(run_id: impl Into<String>, definition: &WorkflowDefinition, inputs: IndexMap<String, String>) -> Self {
        Self {
            run_id: run_id.into(),
            workflow_name: definition.name().to_string(),
            status: RunStatus::Pending,
            current_step: None,
            steps: definition
                .steps()
                .iter()
                .map(|step| StepRunState::pending(&step.id, &step.agent))
                .collect(),
            error: None,
            inputs,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn step(&self, step_id: &str) -> Option<&StepRunState> {
        self.steps.iter().find(|step| step.id == step_id)
    }

    /// `pending -> running`.
    pub(crate) fn begin(&mut self) {
        debug_assert_eq!(self.status, RunStatus::Pending);
        self.status = RunStatus::Running;
    }

    /// Marks step `index` as the running step.
    pub(crate) fn begin_step(&mut self, index: usize) {
        debug_assert_eq!(self.status, RunStatus::Running);
        let step = &mut self.steps[index];
        step.advance(StepRunStatus::Running);
        self.current_step = Some(step.id.clone());
    }

    pub(crate) fn record_step_input(&mut self, index: usize, input: String) {
        self.steps[index].input = Some(input);
    }

    pub(crate) fn complete_step(&mut self, index: usize, output: String) {
        let step = &mut self.steps[index];
        step.output = Some(output);
        step.advance(StepRunStatus::Completed);
    }

    /// Single failure handler: fails the step and the run, records the message, clears the
    /// current step.
    pub(crate) fn fail_step(&mut self, index: usize, error: &StepExecutionError) {
        self.steps[index].advance(StepRunStatus::Failed);
        self.status = RunStatus::Failed;
        self.error = Some(error.to_string());
        self.current_step = None;
        self.finished_at = Some(Utc::now());
    }

    /// `running -> completed` once every step has completed.
    pub(crate) fn complete(&mut self) {
        debug_assert!(self.steps.iter().all(|step| step.status == StepRunStatus::Completed));
        self.status = RunStatus::Completed;
        self.current_step = None;
        self.finished_at = Some(Utc::now());
    }

    /// Lookup tree for step templates: caller inputs under `inputs`, completed steps under
    /// `steps.<id>` exposing `output`, `input`, and `agent`.
    pub fn template_context(&self) -> TemplateContext {
        let mut context = TemplateContext::new();
        context.insert(
            "inputs",
            TemplateValue::map(self.inputs.iter().map(|(name, value)| (name.as_str(), value.as_str()))),
        );

        let completed = self
            .steps
            .iter()
            .filter(|step| step.status == StepRunStatus::Completed)
            .map(|step| {
                let mut fields = IndexMap::new();
                fields.insert("output".to_string(), TemplateValue::from(step.output.clone().unwrap_or_default()));
                fields.insert("input".to_string(), TemplateValue::from(step.input.clone().unwrap_or_default()));
                fields.insert("agent".to_string(), TemplateValue::from(step.agent.as_str()));
                (step.id.clone(), TemplateValue::Map(fields))
            });
        context.insert("steps", TemplateValue::map(completed));

        context
    }
}
