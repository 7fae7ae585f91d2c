//! Simulated ML experiment runner.

use std::time::Duration;

use async_trait::async_trait;
use mcp_core::job::{Job, JOB_TYPE_ML_EXPERIMENT};
use mcp_core::types::JsonMap;
use mcp_dispatch::{require_params, HandlerError, JobHandler};
use rand::Rng;
use serde_json::{json, Value};

use crate::short_id;

const DEFAULT_DELAY: Duration = Duration::from_secs(2);
const DEFAULT_EPOCHS: u64 = 10;
const REQUIRED: &[&str] = &["model", "dataset"];

/// Handles `ml_experiment` jobs.
///
/// Payload: `model` and `dataset` (required), `epochs` (default 10).
#[derive(Debug, Clone)]
pub struct MlExperimentHandler {
    delay: Duration,
}

impl MlExperimentHandler {
    pub fn new() -> Self {
        Self {
            delay: DEFAULT_DELAY,
        }
    }

    /// Override the simulated training time.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl Default for MlExperimentHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobHandler for MlExperimentHandler {
    fn name(&self) -> &str {
        "ml_agent"
    }

    fn job_types(&self) -> &[&str] {
        &[JOB_TYPE_ML_EXPERIMENT]
    }

    async fn validate(&self, job: &Job) -> bool {
        if job.job_type != JOB_TYPE_ML_EXPERIMENT {
            return false;
        }
        match require_params(job, REQUIRED) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "Rejecting ML experiment");
                false
            }
        }
    }

    async fn execute(&self, job: &Job) -> Result<JsonMap, HandlerError> {
        tracing::info!(job_id = %job.id, "Starting ML experiment");
        let params = ExperimentParams::from_payload(&job.payload)?;

        tokio::time::sleep(self.delay).await;
        let result = simulate(&params, &job.id);

        tracing::info!(job_id = %job.id, "ML experiment completed");
        Ok(result)
    }
}

struct ExperimentParams {
    model: Value,
    dataset: Value,
    epochs: u64,
}

impl ExperimentParams {
    fn from_payload(payload: &JsonMap) -> Result<Self, HandlerError> {
        let epochs = match payload.get("epochs") {
            None => DEFAULT_EPOCHS,
            Some(value) => value.as_u64().ok_or_else(|| HandlerError::InvalidParameter {
                name: "epochs".into(),
                reason: "must be a non-negative integer".into(),
            })?,
        };
        Ok(Self {
            model: payload.get("model").cloned().unwrap_or_else(|| json!("linear")),
            dataset: payload.get("dataset").cloned().unwrap_or_else(|| json!("iris")),
            epochs,
        })
    }
}

/// Produce fake training metrics. Accuracy climbs and loss falls across
/// epochs, with noise.
fn simulate(params: &ExperimentParams, job_id: &str) -> JsonMap {
    let mut rng = rand::rng();
    let accuracy: f64 = rng.random_range(0.7..0.95);
    let loss: f64 = rng.random_range(0.1..0.5);

    let epochs = params.epochs as f64;
    let history: Vec<Value> = (0..params.epochs)
        .map(|epoch| {
            let progress = epoch as f64 / epochs;
            json!({
                "epoch": epoch + 1,
                "loss": loss * (1.0 - progress) + rng.random_range(-0.1..0.1),
                "accuracy": accuracy * progress + rng.random_range(-0.05..0.05),
            })
        })
        .collect();

    let mut result = JsonMap::new();
    result.insert("model_type".into(), params.model.clone());
    result.insert("dataset".into(), params.dataset.clone());
    result.insert("epochs".into(), json!(params.epochs));
    result.insert("final_accuracy".into(), json!(accuracy));
    result.insert("final_loss".into(), json!(loss));
    result.insert("training_history".into(), Value::Array(history));
    result.insert("experiment_id".into(), json!(format!("exp_{}", short_id(job_id))));
    result.insert(
        "completed_at".into(),
        json!(chrono::Utc::now().to_rfc3339()),
    );
    result
}
