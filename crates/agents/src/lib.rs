//! Sample local handlers.
//!
//! Both handlers simulate their workload: they sleep for a configurable
//! delay and then produce randomized but well-formed results.

pub mod backtest;
pub mod ml;

use std::sync::Arc;
use std::time::Duration;

use mcp_core::error::CoreError;
use mcp_dispatch::{DispatchRegistry, JobHandler};

pub use backtest::BacktestHandler;
pub use ml::MlExperimentHandler;

/// Both sample handlers with their default simulated delays.
pub fn default_handlers() -> Vec<Arc<dyn JobHandler>> {
    vec![
        Arc::new(MlExperimentHandler::new()),
        Arc::new(BacktestHandler::new()),
    ]
}

/// Both sample handlers sharing one simulated delay.
pub fn handlers_with_delay(delay: Duration) -> Vec<Arc<dyn JobHandler>> {
    vec![
        Arc::new(MlExperimentHandler::new().with_delay(delay)),
        Arc::new(BacktestHandler::new().with_delay(delay)),
    ]
}

/// Register the sample handlers for `ml_experiment` and `backtest`.
pub async fn register_defaults(registry: &DispatchRegistry) -> Result<(), CoreError> {
    register_all(registry, default_handlers()).await
}

pub async fn register_all(
    registry: &DispatchRegistry,
    handlers: Vec<Arc<dyn JobHandler>>,
) -> Result<(), CoreError> {
    for handler in handlers {
        registry.register_handler(handler).await?;
    }
    Ok(())
}

/// First eight characters of a job id, used in result identifiers.
pub(crate) fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcp_dispatch::BackendKind;

    #[tokio::test]
    async fn defaults_cover_both_job_types() {
        let registry = DispatchRegistry::new();
        register_defaults(&registry).await.unwrap();

        let descriptors = registry.descriptors().await;
        let routes: Vec<_> = descriptors
            .iter()
            .map(|d| (d.job_type.as_str(), d.handler.as_deref()))
            .collect();
        assert_eq!(
            routes,
            vec![
                ("backtest", Some("backtest_agent")),
                ("ml_experiment", Some("ml_agent")),
            ]
        );
        assert!(descriptors.iter().all(|d| d.kind == BackendKind::Local));
    }

    #[test]
    fn short_id_truncates() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }
}
