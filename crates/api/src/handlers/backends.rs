//! Handlers for the `/backends` resource.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use mcp_dispatch::Backend;
use serde::Deserialize;

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `PUT /backends/{job_type}`.
#[derive(Debug, Deserialize)]
pub struct RegisterService {
    pub service_url: String,
}

/// GET /api/v1/backends
pub async fn list_backends(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let backends = state.orchestrator.backends().await;
    Ok(Json(DataResponse { data: backends }))
}

/// PUT /api/v1/backends/{job_type}
///
/// Route `job_type` to a remote service, replacing whatever handled it
/// before. Responds with the updated backend list.
pub async fn register_service(
    State(state): State<AppState>,
    Path(job_type): Path<String>,
    AppJson(input): AppJson<RegisterService>,
) -> AppResult<impl IntoResponse> {
    let backend = Backend::remote(input.service_url)?;
    state.orchestrator.register_backend(&job_type, backend).await?;

    let backends = state.orchestrator.backends().await;
    Ok(Json(DataResponse { data: backends }))
}
