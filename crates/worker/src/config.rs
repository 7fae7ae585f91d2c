use std::time::Duration;

use mcp_core::config::{parse_var, process_env, string_var, ConfigError};

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8100`).
    pub port: u16,
    /// Overrides the sample handlers' simulated work time when set.
    pub simulated_delay: Option<Duration>,
}

impl WorkerConfig {
    /// | Env Var                     | Default    |
    /// |-----------------------------|------------|
    /// | `HOST`                      | `0.0.0.0`  |
    /// | `PORT`                      | `8100`     |
    /// | `WORKER_SIMULATED_DELAY_MS` | unset      |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = string_var(&lookup, "HOST", "0.0.0.0");
        let port: u16 = parse_var(&lookup, "PORT", 8100)?;
        let simulated_delay = match lookup("WORKER_SIMULATED_DELAY_MS") {
            Some(_) => Some(Duration::from_millis(parse_var(
                &lookup,
                "WORKER_SIMULATED_DELAY_MS",
                0u64,
            )?)),
            None => None,
        };

        Ok(Self {
            host,
            port,
            simulated_delay,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = WorkerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8100);
        assert!(config.simulated_delay.is_none());
    }

    #[test]
    fn delay_override() {
        let config = WorkerConfig::from_lookup(|var| {
            (var == "WORKER_SIMULATED_DELAY_MS").then(|| "250".to_string())
        })
        .unwrap();
        assert_eq!(config.simulated_delay, Some(Duration::from_millis(250)));
    }
}
