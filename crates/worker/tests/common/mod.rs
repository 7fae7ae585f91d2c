use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use mcp_worker::{build_router, WorkerState};

/// Worker router hosting the sample handlers with no simulated delay.
pub fn build_test_app() -> Router {
    let handlers = mcp_agents::handlers_with_delay(Duration::ZERO);
    build_router(Arc::new(WorkerState::new(handlers)))
}

/// POST a JSON body and return the status and parsed response.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}
