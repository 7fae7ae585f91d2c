use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use mcp_core::job::Job;
use mcp_core::types::JsonMap;
use mcp_dispatch::DispatchRegistry;
use mcp_engine::{Orchestrator, OrchestratorConfig};

/// Test configuration: short shutdown budget, caller-chosen remote timeout.
pub fn test_config(remote_timeout: Duration) -> OrchestratorConfig {
    OrchestratorConfig {
        remote_timeout,
        shutdown_timeout: Duration::from_secs(2),
        remote_backends: Vec::new(),
    }
}

/// Orchestrator with the sample handlers registered locally (no delay).
pub async fn local_orchestrator() -> Arc<Orchestrator> {
    local_orchestrator_with_delay(Duration::ZERO).await
}

/// Orchestrator whose sample handlers simulate `delay` of work per job.
pub async fn local_orchestrator_with_delay(delay: Duration) -> Arc<Orchestrator> {
    let registry = Arc::new(DispatchRegistry::new());
    mcp_agents::register_all(&registry, mcp_agents::handlers_with_delay(delay))
        .await
        .unwrap();
    Orchestrator::new(registry, &test_config(Duration::from_secs(5))).unwrap()
}

/// Orchestrator with an empty registry.
pub fn bare_orchestrator(remote_timeout: Duration) -> Arc<Orchestrator> {
    Orchestrator::new(Arc::new(DispatchRegistry::new()), &test_config(remote_timeout)).unwrap()
}

/// Serve `app` on an ephemeral port and return its base URL.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn object(value: serde_json::Value) -> JsonMap {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

/// Poll until the job is terminal.
pub async fn wait_terminal(orch: &Orchestrator, id: &str) -> Job {
    for _ in 0..1000 {
        let job = orch.status(id).await.unwrap();
        if job.is_terminal() {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {id} never reached a terminal state");
}
