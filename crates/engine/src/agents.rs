//! Agent execution contract and the mock agents that implement it.
//!
//! An agent receives a resolved step input and returns text. The only implementation is
//! [`MockAgentExecutor`], which waits a fixed per-agent latency and formats a fixed template.

use std::time::Duration;

use async_trait::async_trait;
use conductor_types::AgentOverride;
use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, warn};

/// Token replaced with the step input inside an agent output template.
pub const INPUT_TOKEN: &str = "{input}";

/// Failure reported by an agent executor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgentError {
    #[error("Agent '{agent}' is not supported")]
    Unsupported { agent: String },
}

/// Executes a named unit of work.
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    /// Returns true when `agent` can be executed.
    fn supports(&self, agent: &str) -> bool;

    /// Names of every supported agent, in a stable order.
    fn supported_agents(&self) -> Vec<String>;

    /// Runs `agent` against `input`.
    ///
    /// Unsupported agents fail immediately without simulated latency.
    async fn execute(&self, agent: &str, input: &str) -> Result<String, AgentError>;
}

/// Latency and output template of one mock agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockAgentProfile {
    pub name: String,
    pub latency: Duration,
    pub template: String,
}

impl MockAgentProfile {
    pub fn new(name: impl Into<String>, latency: Duration, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            latency,
            template: template.into(),
        }
    }

    /// Formats the output template with `input` substituted for every `{input}` token.
    pub fn render(&self, input: &str) -> String {
        self.template.replace(INPUT_TOKEN, input)
    }
}

/// The built-in agent table.
pub fn default_mock_profiles() -> Vec<MockAgentProfile> {
    vec![
        MockAgentProfile::new("planner", Duration::from_millis(600), "Planner shaped a path: {input}"),
        MockAgentProfile::new("designer", Duration::from_millis(800), "Designer framed the experience: {input}"),
        MockAgentProfile::new("builder", Duration::from_millis(900), "Builder delivered the artifact: {input}"),
    ]
}

/// Agent executor backed by a fixed table of [`MockAgentProfile`]s.
#[derive(Debug, Clone)]
pub struct MockAgentExecutor {
    profiles: IndexMap<String, MockAgentProfile>,
}

impl Default for MockAgentExecutor {
    fn default() -> Self {
        Self::with_profiles(default_mock_profiles())
    }
}

impl MockAgentExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an executor from an explicit profile table. Later profiles replace earlier ones
    /// with the same name.
    pub fn with_profiles(profiles: impl IntoIterator<Item = MockAgentProfile>) -> Self {
        let profiles = profiles.into_iter().map(|profile| (profile.name.clone(), profile)).collect();
        Self { profiles }
    }

    /// Applies configuration overrides to existing profiles.
    pub fn with_overrides(mut self, overrides: &[AgentOverride]) -> Self {
        for agent_override in overrides {
            let Some(profile) = self.profiles.get_mut(&agent_override.name) else {
                warn!(agent = %agent_override.name, "ignoring override for unsupported agent");
                continue;
            };
            if let Some(latency_ms) = agent_override.latency_ms {
                profile.latency = Duration::from_millis(latency_ms);
            }
            if let Some(template) = &agent_override.template {
                profile.template = template.clone();
            }
        }
        self
    }

    pub fn profile(&self, agent: &str) -> Option<&MockAgentProfile> {
        self.profiles.get(agent)
    }
}

#[async_trait]
impl AgentExecutor for MockAgentExecutor {
    fn supports(&self, agent: &str) -> bool {
        self.profiles.contains_key(agent)
    }

    fn supported_agents(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }

    async fn execute(&self, agent: &str, input: &str) -> Result<String, AgentError> {
        let profile = self.profiles.get(agent).ok_or_else(|| AgentError::Unsupported { agent: agent.to_string() })?;

        debug!(agent = %agent, latency_ms = profile.latency.as_millis() as u64, "mock agent working");
        tokio::time::sleep(profile.latency).await;

        Ok(profile.render(input))
    }
}
