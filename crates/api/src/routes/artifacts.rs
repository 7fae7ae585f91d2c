//! Route definitions for the `/artifacts` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::artifacts;
use crate::state::AppState;

/// Routes mounted at `/artifacts`.
///
/// ```text
/// GET    /                    -> list_artifacts
/// POST   /                    -> register_artifact
/// GET    /job/{job_id}        -> list_by_job
/// GET    /{id}                -> get_artifact
/// DELETE /{id}                -> delete_artifact
/// GET    /{id}/dependencies   -> get_dependencies
/// GET    /{id}/references     -> get_references
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(artifacts::list_artifacts).post(artifacts::register_artifact),
        )
        .route("/job/{job_id}", get(artifacts::list_by_job))
        .route(
            "/{id}",
            get(artifacts::get_artifact).delete(artifacts::delete_artifact),
        )
        .route("/{id}/dependencies", get(artifacts::get_dependencies))
        .route("/{id}/references", get(artifacts::get_references))
}
