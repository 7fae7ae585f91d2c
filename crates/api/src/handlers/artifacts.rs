//! Handlers for the `/artifacts` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use mcp_core::artifact::{ArtifactFilter, ArtifactRegistration, ArtifactType};
use mcp_core::error::CoreError;
use serde_json::json;

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::query::{ArtifactListParams, DEFAULT_LIST_LIMIT};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/artifacts
///
/// Returns 201 with `{artifact_id, status: "registered"}`. A caller-chosen
/// id that is already taken is a 409.
pub async fn register_artifact(
    State(state): State<AppState>,
    AppJson(input): AppJson<ArtifactRegistration>,
) -> AppResult<impl IntoResponse> {
    let artifact_id = state.orchestrator.register_artifact(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: json!({ "artifact_id": artifact_id, "status": "registered" }),
        }),
    ))
}

/// GET /api/v1/artifacts
pub async fn list_artifacts(
    State(state): State<AppState>,
    Query(params): Query<ArtifactListParams>,
) -> AppResult<impl IntoResponse> {
    let artifact_type = params
        .artifact_type
        .as_deref()
        .map(str::parse::<ArtifactType>)
        .transpose()?;

    let filter = ArtifactFilter {
        artifact_type,
        job_id: params.job_id,
        service_id: params.service_id,
        limit: Some(params.limit.unwrap_or(DEFAULT_LIST_LIMIT)),
    };

    let artifacts = state.orchestrator.list_artifacts(&filter).await;
    Ok(Json(DataResponse { data: artifacts }))
}

/// GET /api/v1/artifacts/{id}
pub async fn get_artifact(
    State(state): State<AppState>,
    Path(artifact_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let artifact = state.orchestrator.get_artifact(&artifact_id).await?;
    Ok(Json(DataResponse { data: artifact }))
}

/// GET /api/v1/artifacts/{id}/dependencies
pub async fn get_dependencies(
    State(state): State<AppState>,
    Path(artifact_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let artifacts = state.orchestrator.artifact_dependencies(&artifact_id).await?;
    Ok(Json(DataResponse { data: artifacts }))
}

/// GET /api/v1/artifacts/{id}/references
pub async fn get_references(
    State(state): State<AppState>,
    Path(artifact_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let artifacts = state.orchestrator.artifact_references(&artifact_id).await?;
    Ok(Json(DataResponse { data: artifacts }))
}

/// GET /api/v1/artifacts/job/{job_id}
///
/// Artifacts produced by a job, in registration order.
pub async fn list_by_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let artifacts = state.orchestrator.artifacts_for_job(&job_id).await;
    Ok(Json(DataResponse { data: artifacts }))
}

/// DELETE /api/v1/artifacts/{id}
///
/// Does not cascade: dependents keep a dangling edge.
pub async fn delete_artifact(
    State(state): State<AppState>,
    Path(artifact_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    if !state.orchestrator.delete_artifact(&artifact_id).await {
        return Err(CoreError::artifact_not_found(&artifact_id).into());
    }

    Ok(Json(DataResponse {
        data: json!({ "artifact_id": artifact_id, "status": "deleted" }),
    }))
}
