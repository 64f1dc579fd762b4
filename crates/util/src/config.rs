//! Conductor configuration file.
//!
//! The file is a small JSON document stored in the standard configuration directory
//! (`~/.config/conductor/config.json` on most platforms). Every field is optional; a missing
//! file yields the defaults.
//!
//! ```json
//! {
//!   "workflows_dir": "~/workflows",
//!   "log_filter": "conductor_engine=debug",
//!   "agents": [{ "name": "planner", "latency_ms": 50 }]
//! }
//! ```

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use conductor_types::AgentOverride;
use dirs_next::config_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::expand_tilde;

/// Environment variable overriding the configuration file path.
pub const CONFIG_PATH_ENV: &str = "CONDUCTOR_CONFIG_PATH";

/// Environment variable overriding the workflow definition directory.
pub const WORKFLOWS_DIR_ENV: &str = "CONDUCTOR_WORKFLOWS_DIR";

pub const CONFIG_FILE_NAME: &str = "config.json";

/// Directory scanned for workflow definitions when nothing else is configured.
pub const DEFAULT_WORKFLOWS_DIR: &str = "workflows";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConductorConfig {
    /// Directory holding `*.yml`, `*.yaml`, and `*.json` workflow definitions.
    pub workflows_dir: Option<PathBuf>,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
    /// Latency and template overrides for the mock agents.
    pub agents: Vec<AgentOverride>,
}

impl ConductorConfig {
    /// Loads the file at [`default_config_path`].
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&default_config_path())
    }

    /// Loads a specific file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(data) => {
                let config = serde_json::from_str(&data)?;
                debug!(path = %path.display(), "loaded conductor config");
                Ok(config)
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(ConfigError::Io(error)),
        }
    }

    /// Picks the workflow directory: explicit override, then `CONDUCTOR_WORKFLOWS_DIR`, then the
    /// config file, then `./workflows`.
    pub fn resolve_workflows_dir(&self, explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        if let Ok(path) = env::var(WORKFLOWS_DIR_ENV) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return expand_tilde(trimmed);
            }
        }
        if let Some(path) = &self.workflows_dir {
            return expand_tilde(&path.to_string_lossy());
        }
        PathBuf::from(DEFAULT_WORKFLOWS_DIR)
    }
}

/// Location of the configuration file, honouring `CONDUCTOR_CONFIG_PATH`.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return expand_tilde(trimmed);
        }
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("conductor")
        .join(CONFIG_FILE_NAME)
}
