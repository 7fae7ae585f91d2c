pub mod artifacts;
pub mod backends;
pub mod health;
pub mod jobs;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /jobs                                 list, submit
/// /jobs/{id}                            get, cancel (DELETE)
///
/// /backends                             list
/// /backends/{job_type}                  register remote service (PUT)
///
/// /artifacts                            list, register
/// /artifacts/{id}                       get, delete
/// /artifacts/{id}/dependencies          forward edges
/// /artifacts/{id}/references            reverse edges
/// /artifacts/job/{job_id}               artifacts produced by a job
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/jobs", jobs::router())
        .nest("/backends", backends::router())
        .nest("/artifacts", artifacts::router())
}
