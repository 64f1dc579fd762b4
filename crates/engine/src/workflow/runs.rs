//! Shared table of run snapshots.
//!
//! The background task of each run owns the live [`RunState`]; after every transition it
//! publishes a clone here. Pollers only ever receive clones of what was last published, so
//! nothing a caller does to a snapshot reaches the running task. Entries are retained for the
//! lifetime of the process.

use std::sync::{Arc, RwLock};

use indexmap::IndexMap;

use crate::workflow::state::RunState;

/// Cloneable handle onto the process-wide run table.
#[derive(Debug, Clone, Default)]
pub struct RunRegistry {
    runs: Arc<RwLock<IndexMap<String, RunState>>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a freshly created run.
    pub fn register(&self, state: &RunState) {
        self.publish(state);
    }

    /// Replaces the stored snapshot of `state.run_id` with a copy of `state`.
    pub fn publish(&self, state: &RunState) {
        self.runs
            .write()
            .expect("run registry lock poisoned")
            .insert(state.run_id.clone(), state.clone());
    }

    /// Latest published snapshot of a run.
    pub fn snapshot(&self, run_id: &str) -> Option<RunState> {
        self.runs.read().expect("run registry lock poisoned").get(run_id).cloned()
    }

    /// Every retained run, oldest first.
    pub fn snapshots(&self) -> Vec<RunState> {
        self.runs.read().expect("run registry lock poisoned").values().cloned().collect()
    }

    pub fn contains(&self, run_id: &str) -> bool {
        self.runs.read().expect("run registry lock poisoned").contains_key(run_id)
    }

    pub fn len(&self) -> usize {
        self.runs.read().expect("run registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
