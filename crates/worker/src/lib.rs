//! Remote execution service.
//!
//! Hosts local [`JobHandler`]s behind the remote wire contract so an
//! orchestrator can route job types to this process over HTTP.

pub mod config;
pub mod error;

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use mcp_core::job::Job;
use mcp_core::types::JsonMap;
use mcp_dispatch::remote::{ExecuteRequest, EXECUTE_PATH};
use mcp_dispatch::{HandlerError, JobHandler};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::error::WorkerError;

/// Handlers served by this worker, keyed by job type.
pub struct WorkerState {
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl WorkerState {
    /// Index `handlers` by every job type they declare. Later handlers win
    /// on overlap.
    pub fn new(handlers: Vec<Arc<dyn JobHandler>>) -> Self {
        let mut map = HashMap::new();
        for handler in handlers {
            for job_type in handler.job_types() {
                map.insert(job_type.to_string(), Arc::clone(&handler));
            }
        }
        Self { handlers: map }
    }

    /// Served job types, sorted.
    pub fn job_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers.keys().cloned().collect();
        types.sort();
        types
    }
}

pub fn build_router(state: Arc<WorkerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(EXECUTE_PATH, post(execute))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<Arc<WorkerState>>) -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "job_types": state.job_types() }))
}

/// POST /execute
///
/// Responds with the bare result object on success.
async fn execute(
    State(state): State<Arc<WorkerState>>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<JsonMap>, WorkerError> {
    let handler = state
        .handlers
        .get(&request.job_type)
        .cloned()
        .ok_or_else(|| WorkerError::UnknownJobType(request.job_type.clone()))?;

    let mut job = Job::new(request.job_type, request.payload, request.metadata);
    job.id = request.job_id;
    tracing::info!(job_id = %job.id, job_type = %job.job_type, handler = handler.name(), "Executing job");

    if !handler.validate(&job).await {
        return Err(WorkerError::Rejected {
            handler: handler.name().to_string(),
            job_id: job.id,
        });
    }

    match handler.execute(&job).await {
        Ok(result) => Ok(Json(result)),
        Err(e @ (HandlerError::MissingParameter(_) | HandlerError::InvalidParameter { .. })) => {
            Err(WorkerError::BadPayload(e))
        }
        Err(e) => Err(WorkerError::Handler(e)),
    }
}
