use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use mcp_api::config::ServerConfig;
use mcp_api::router::build_app_router;
use mcp_api::state::AppState;
use mcp_dispatch::DispatchRegistry;
use mcp_engine::{Orchestrator, OrchestratorConfig};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
    }
}

/// Build the production router around an orchestrator that hosts the
/// sample handlers with no simulated delay.
///
/// The orchestrator is returned alongside so tests can wait on jobs or
/// trigger shutdown directly.
pub async fn build_test_app() -> (Router, Arc<Orchestrator>) {
    let registry = Arc::new(DispatchRegistry::new());
    mcp_agents::register_all(&registry, mcp_agents::handlers_with_delay(Duration::ZERO))
        .await
        .unwrap();

    let config = OrchestratorConfig {
        remote_timeout: Duration::from_secs(5),
        shutdown_timeout: Duration::from_secs(2),
        remote_backends: Vec::new(),
    };
    let orchestrator = Orchestrator::new(registry, &config).unwrap();

    let state = AppState {
        orchestrator: Arc::clone(&orchestrator),
        config: Arc::new(test_config()),
    };
    (build_app_router(state), orchestrator)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body)).await
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

/// Collect the response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert the status and return the parsed body.
pub async fn expect_status(response: Response<Body>, status: StatusCode) -> serde_json::Value {
    assert_eq!(response.status(), status);
    body_json(response).await
}

/// Poll `GET /api/v1/jobs/{id}` until the job reaches a terminal status.
pub async fn wait_terminal(app: &Router, id: &str) -> serde_json::Value {
    for _ in 0..500 {
        let job = body_json(get(app.clone(), &format!("/api/v1/jobs/{id}")).await).await;
        let status = job["data"]["status"].as_str().unwrap_or_default();
        if matches!(status, "completed" | "failed" | "cancelled") {
            return job["data"].clone();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {id} never reached a terminal state");
}
