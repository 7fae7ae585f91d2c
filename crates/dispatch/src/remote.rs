//! HTTP client for remote execution services.
//!
//! Wire contract: `POST {base_url}/execute` with
//! `{"job_id", "type", "payload", "metadata"}`. A 2xx response whose body
//! is a JSON object is the job result; anything else is a failure.
//!
//! Dropping the in-flight request future (e.g. on cancellation) only stops
//! local waiting. The remote service is not told to abort.

use std::time::Duration;

use mcp_core::error::CoreError;
use mcp_core::job::Job;
use mcp_core::types::{EntityId, JsonMap};
use serde::{Deserialize, Serialize};

use crate::registry::RemoteService;

/// Path of the execute endpoint on every remote service.
pub const EXECUTE_PATH: &str = "/execute";

/// Default upper bound on a single remote execution.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(3600);

/// Request body sent to a remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub job_id: EntityId,
    #[serde(rename = "type")]
    pub job_type: String,
    pub payload: JsonMap,
    pub metadata: JsonMap,
}

impl From<&Job> for ExecuteRequest {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id.clone(),
            job_type: job.job_type.clone(),
            payload: job.payload.clone(),
            metadata: job.metadata.clone(),
        }
    }
}

/// Errors from talking to a remote service.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Remote service error ({status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The service answered 2xx but the body was not a JSON object.
    #[error("Remote service returned an invalid result: {0}")]
    InvalidBody(String),
}

impl From<RemoteError> for CoreError {
    fn from(err: RemoteError) -> Self {
        CoreError::RemoteExecution(err.to_string())
    }
}

/// Pooled HTTP client shared by every remote execution.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    client: reqwest::Client,
}

impl RemoteClient {
    /// Build a client whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Execute `job` on `service` and return the result object.
    pub async fn execute(
        &self,
        service: &RemoteService,
        job: &Job,
    ) -> Result<JsonMap, RemoteError> {
        let url = service.execute_url();
        tracing::debug!(job_id = %job.id, url = %url, "Sending job to remote service");

        let response = self
            .client
            .post(&url)
            .json(&ExecuteRequest::from(job))
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        let body = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| RemoteError::InvalidBody(e.to_string()))?;

        match body {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(RemoteError::InvalidBody(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`RemoteError::Status`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
