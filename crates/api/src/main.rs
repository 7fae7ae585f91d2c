use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mcp_api::config::ServerConfig;
use mcp_api::router::build_app_router;
use mcp_api::state::AppState;
use mcp_dispatch::{Backend, DispatchRegistry};
use mcp_engine::{Orchestrator, OrchestratorConfig};
use mcp_events::{EventBus, EventLogger};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mcp_api=debug,mcp_engine=debug,tower_http=debug".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid server configuration");
    let orchestrator_config =
        OrchestratorConfig::from_env().expect("Invalid orchestrator configuration");
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Dispatch registry ---
    let registry = Arc::new(DispatchRegistry::new());
    mcp_agents::register_defaults(&registry)
        .await
        .expect("Failed to register sample handlers");
    for remote in &orchestrator_config.remote_backends {
        let backend = Backend::remote(remote.service_url.as_str())
            .unwrap_or_else(|e| panic!("Invalid remote backend for {}: {e}", remote.job_type));
        registry
            .register(&remote.job_type, backend)
            .await
            .unwrap_or_else(|e| panic!("Invalid remote backend for {}: {e}", remote.job_type));
    }

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let logger_cancel = CancellationToken::new();
    let logger_handle = tokio::spawn(EventLogger::run(
        event_bus.subscribe(),
        logger_cancel.clone(),
    ));

    // --- Orchestrator ---
    let orchestrator =
        Orchestrator::with_events(registry, &orchestrator_config, Arc::clone(&event_bus))
            .expect("Failed to start orchestrator");
    tracing::info!(backends = orchestrator.backends().await.len(), "Orchestrator started");

    // --- App state ---
    let state = AppState {
        orchestrator: Arc::clone(&orchestrator),
        config: Arc::new(config.clone()),
    };

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, build_app_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    orchestrator.shutdown().await;

    logger_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), logger_handle).await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
