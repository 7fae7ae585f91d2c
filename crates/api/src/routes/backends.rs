use axum::routing::{get, put};
use axum::Router;

use crate::handlers::backends;
use crate::state::AppState;

/// Routes mounted at `/backends`.
///
/// ```text
/// GET    /                -> list_backends
/// PUT    /{job_type}      -> register_service
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(backends::list_backends))
        .route("/{job_type}", put(backends::register_service))
}
