use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mcp_dispatch::HandlerError;
use serde_json::json;

/// Failure answered by the worker's execute endpoint.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("No handler for job type: {0}")]
    UnknownJobType(String),

    #[error("Validation failed: handler {handler} rejected job {job_id}")]
    Rejected { handler: String, job_id: String },

    /// The handler refused the payload while executing.
    #[error("{0}")]
    BadPayload(HandlerError),

    #[error("{0}")]
    Handler(HandlerError),
}

impl IntoResponse for WorkerError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            WorkerError::UnknownJobType(_) => (StatusCode::BAD_REQUEST, "UNKNOWN_JOB_TYPE"),
            WorkerError::Rejected { .. } | WorkerError::BadPayload(_) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            WorkerError::Handler(e) => {
                tracing::error!(error = %e, "Handler failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "EXECUTION_ERROR")
            }
        };

        let body = json!({
            "error": self.to_string(),
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
