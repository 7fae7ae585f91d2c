use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use serde_json::json;

use crate::state::AppState;

const SERVICE_NAME: &str = "mcp-orchestrator";

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    pub jobs: usize,
    pub active_jobs: usize,
    pub artifacts: usize,
}

/// GET /health -- liveness plus store sizes.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let orchestrator = &state.orchestrator;
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        jobs: orchestrator.job_count().await,
        active_jobs: orchestrator.active_tasks().await,
        artifacts: orchestrator.artifact_count().await,
    })
}

/// GET /health/ready -- 503 once shutdown has begun.
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    if state.orchestrator.is_closed() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "shutting_down", "service": SERVICE_NAME })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({ "status": "ready", "service": SERVICE_NAME })),
    )
}

/// GET / -- service description.
async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Central orchestrator for ML experiments and backtests",
        "endpoints": {
            "health": "/health",
            "jobs": "/api/v1/jobs",
            "artifacts": "/api/v1/artifacts",
            "backends": "/api/v1/backends",
        },
    }))
}

/// Mount health and info routes (root level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
}
