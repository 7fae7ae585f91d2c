/// Domain error shared by every crate in the workspace.
///
/// Submission-time variants (`Validation`, `Dispatch`) are returned to the
/// caller synchronously. `RemoteExecution` is only ever produced while a job
/// runs and ends up as the job's `error` text.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("No backend registered for job type: {job_type}")]
    Dispatch { job_type: String },

    #[error("Remote execution failed: {0}")]
    RemoteExecution(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Orchestrator is shutting down")]
    ShuttingDown,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn job_not_found(id: &str) -> Self {
        Self::NotFound {
            entity: "Job",
            id: id.to_string(),
        }
    }

    pub fn artifact_not_found(id: &str) -> Self {
        Self::NotFound {
            entity: "Artifact",
            id: id.to_string(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
