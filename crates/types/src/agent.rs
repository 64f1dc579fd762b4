//! Configuration-facing adjustments to the mock agent table.

use serde::{Deserialize, Serialize};

/// Overrides the latency or output template of one supported mock agent.
///
/// Overrides never add agents: an override naming an unknown agent is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentOverride {
    /// Name of the agent to adjust (for example, `planner`).
    pub name: String,
    /// Simulated latency in milliseconds.
    #[serde(default)]
    pub latency_ms: Option<u64>,
    /// Output template; `{input}` is replaced with the resolved step input.
    #[serde(default)]
    pub template: Option<String>,
}
