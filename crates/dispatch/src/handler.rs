//! In-process job handlers.

use async_trait::async_trait;
use mcp_core::job::Job;
use mcp_core::types::JsonMap;

/// Failure raised by a local handler while executing a job.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("{0}")]
    Execution(String),
}

/// A backend that runs jobs inside the orchestrator process.
///
/// `validate` is always called before `execute`; a `false` return fails
/// the job without executing it.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Name used in logs and backend descriptors.
    fn name(&self) -> &str;

    /// Job types this handler is registered for by
    /// [`DispatchRegistry::register_handler`](crate::DispatchRegistry::register_handler).
    fn job_types(&self) -> &[&str];

    /// Check that the job is something this handler can run. The default
    /// only checks the job type.
    async fn validate(&self, job: &Job) -> bool {
        self.job_types().contains(&job.job_type.as_str())
    }

    /// Run the job and produce its result object.
    async fn execute(&self, job: &Job) -> Result<JsonMap, HandlerError>;
}

/// Ensure every key in `required` is present in the job payload.
pub fn require_params(job: &Job, required: &[&str]) -> Result<(), HandlerError> {
    match required.iter().find(|key| !job.payload.contains_key(**key)) {
        Some(missing) => Err(HandlerError::MissingParameter((*missing).to_string())),
        None => Ok(()),
    }
}
