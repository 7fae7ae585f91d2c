//! Orchestrator configuration loaded from environment variables.

use std::time::Duration;

use mcp_core::config::{parse_var, process_env, split_list, ConfigError};

/// A remote backend to register at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBackendSpec {
    pub job_type: String,
    pub service_url: String,
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Upper bound on one remote execution (default: 3600 s).
    pub remote_timeout: Duration,
    /// How long shutdown waits for each job task (default: 30 s).
    pub shutdown_timeout: Duration,
    /// Remote backends registered by the composition root at startup.
    pub remote_backends: Vec<RemoteBackendSpec>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            remote_timeout: Duration::from_secs(3600),
            shutdown_timeout: Duration::from_secs(30),
            remote_backends: Vec::new(),
        }
    }
}

impl OrchestratorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default  |
    /// |-------------------------|----------|
    /// | `REMOTE_TIMEOUT_SECS`   | `3600`   |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`     |
    /// | `MCP_REMOTE_BACKENDS`   | empty    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    /// Same as [`from_env`](Self::from_env) but reads through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let remote_timeout_secs: u64 = parse_var(&lookup, "REMOTE_TIMEOUT_SECS", 3600)?;
        let shutdown_timeout_secs: u64 = parse_var(&lookup, "SHUTDOWN_TIMEOUT_SECS", 30)?;
        let remote_backends = match lookup("MCP_REMOTE_BACKENDS") {
            Some(raw) => parse_remote_backends(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            remote_timeout: Duration::from_secs(remote_timeout_secs),
            shutdown_timeout: Duration::from_secs(shutdown_timeout_secs),
            remote_backends,
        })
    }
}

/// Parse `type=url,type=url`. Blank entries are skipped.
fn parse_remote_backends(raw: &str) -> Result<Vec<RemoteBackendSpec>, ConfigError> {
    split_list(raw)
        .into_iter()
        .map(|entry| match entry.split_once('=') {
            Some((job_type, url)) if !job_type.trim().is_empty() && !url.trim().is_empty() => {
                Ok(RemoteBackendSpec {
                    job_type: job_type.trim().to_string(),
                    service_url: url.trim().to_string(),
                })
            }
            _ => Err(ConfigError::MalformedEntry {
                var: "MCP_REMOTE_BACKENDS",
                entry: entry.clone(),
                expected: "job_type=http://host:port",
            }),
        })
        .collect()
}
