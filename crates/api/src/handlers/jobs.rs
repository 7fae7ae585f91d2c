//! Handlers for the `/jobs` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use mcp_core::job::{JobStatus, JobSubmission};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::query::{JobListParams, DEFAULT_LIST_LIMIT};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/jobs
///
/// Submit a job. Returns 201 with `{job_id, status: "submitted"}`; the job
/// itself starts out pending and runs in the background.
pub async fn submit_job(
    State(state): State<AppState>,
    AppJson(input): AppJson<JobSubmission>,
) -> AppResult<impl IntoResponse> {
    let job_id = state
        .orchestrator
        .submit(
            &input.job_type,
            input.payload,
            input.metadata.unwrap_or_default(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: json!({ "job_id": job_id, "status": "submitted" }),
        }),
    ))
}

/// GET /api/v1/jobs
///
/// Newest first. Optional `status` filter; `limit` defaults to 100.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<JobListParams>,
) -> AppResult<impl IntoResponse> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<JobStatus>)
        .transpose()?;
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);

    let jobs = state.orchestrator.list(status, Some(limit)).await;
    Ok(Json(DataResponse { data: jobs }))
}

/// GET /api/v1/jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let job = state.orchestrator.status(&job_id).await?;
    Ok(Json(DataResponse { data: job }))
}

/// DELETE /api/v1/jobs/{id}
///
/// Cancel a pending or running job. 404 when the job is unknown or has
/// already finished.
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    if !state.orchestrator.cancel(&job_id).await {
        return Err(AppError::NotFound(format!(
            "Job {job_id} not found or cannot be cancelled"
        )));
    }

    Ok(Json(DataResponse {
        data: json!({ "job_id": job_id, "status": "cancelled" }),
    }))
}
