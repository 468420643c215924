//! Configuration types for an inspection run

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use inspector_exec::SshOptions;
use serde::{Deserialize, Serialize};

use crate::column::ColumnSpec;
use crate::error::CoreError;
use crate::orchestrator::OrchestratorOptions;

/// Parsed inspector configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InspectorConfig {
    /// Hosts to inspect, in display order
    #[serde(default)]
    pub servers: Vec<String>,
    /// Short names for full commands
    #[serde(default)]
    pub aliases: HashMap<String, String>,
    /// Columns run when no command is selected
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    /// SSH connection settings
    #[serde(default)]
    pub connection: SshOptions,
    /// Fan-out limits
    #[serde(default)]
    pub run: RunConfig,
}

/// Optional hardening for the fan-out; unset means unbounded
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Maximum hosts executing at once
    pub max_concurrency: Option<usize>,
    /// Per-host deadline covering connect and all columns
    pub host_timeout_secs: Option<u64>,
}

impl RunConfig {
    /// Convert to orchestrator options
    #[must_use]
    pub fn orchestrator_options(&self) -> OrchestratorOptions {
        OrchestratorOptions {
            max_concurrency: self.max_concurrency,
            host_timeout: self.host_timeout_secs.map(Duration::from_secs),
        }
    }
}

impl InspectorConfig {
    /// Check invariants the run relies on
    ///
    /// # Errors
    /// Returns `CoreError::ConfigError` describing the first problem found
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.servers.is_empty() {
            return Err(CoreError::ConfigError("no servers configured".to_string()));
        }

        let mut seen = HashSet::new();
        for server in &self.servers {
            if server.trim().is_empty() {
                return Err(CoreError::ConfigError("empty server address".to_string()));
            }
            if !seen.insert(server.as_str()) {
                return Err(CoreError::ConfigError(format!(
                    "duplicate server: {server}"
                )));
            }
        }

        if let Some(column) = self.columns.iter().find(|c| c.name.trim().is_empty()) {
            return Err(CoreError::ConfigError(format!(
                "column with command {:?} has no name",
                column.command
            )));
        }

        if self.run.max_concurrency == Some(0) {
            return Err(CoreError::ConfigError(
                "run.max_concurrency must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
