//! Thin HTTP client for the orchestrator's `/api/v1` endpoints.
//!
//! Every successful response carries a `{"data": ...}` envelope; errors
//! carry `{"error", "code"}`. Both are unwrapped here so commands deal in
//! plain JSON values.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use mcp_core::job::JobSubmission;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};

pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base_url)
    }

    pub async fn submit(&self, submission: &JobSubmission) -> Result<Value> {
        self.send(self.http.post(self.url("/jobs")).json(submission))
            .await
    }

    pub async fn status(&self, job_id: &str) -> Result<Value> {
        self.send(self.http.get(self.url(&format!("/jobs/{job_id}"))))
            .await
    }

    pub async fn cancel(&self, job_id: &str) -> Result<Value> {
        self.send(self.http.delete(self.url(&format!("/jobs/{job_id}"))))
            .await
    }

    pub async fn list(&self, status: Option<&str>, limit: Option<usize>) -> Result<Value> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(status) = status {
            query.push(("status", status.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        self.send(self.http.get(self.url("/jobs")).query(&query))
            .await
    }

    pub async fn backends(&self) -> Result<Value> {
        self.send(self.http.get(self.url("/backends"))).await
    }

    pub async fn register_service(&self, job_type: &str, service_url: &str) -> Result<Value> {
        let body = json!({ "service_url": service_url });
        self.send(
            self.http
                .put(self.url(&format!("/backends/{job_type}")))
                .json(&body),
        )
        .await
    }

    pub async fn artifacts(&self, filter: &[(&str, String)]) -> Result<Value> {
        self.send(self.http.get(self.url("/artifacts")).query(filter))
            .await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to reach orchestrator at {}", self.base_url))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .with_context(|| format!("Orchestrator returned a non-JSON body ({status})"))?;

        if !status.is_success() {
            let message = body["error"].as_str().unwrap_or("unknown error");
            let code = body["code"].as_str().unwrap_or("UNKNOWN");
            bail!("{message} ({code}, HTTP {})", status.as_u16());
        }

        tracing::debug!(%status, "Orchestrator responded");
        Ok(body.get("data").cloned().unwrap_or(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Duration::from_secs(5)).unwrap()
    }

    // ---- Tests ----

    #[tokio::test]
    async fn unwraps_data_envelope() {
        let app = Router::new().route(
            "/api/v1/jobs",
            post(|Json(body): Json<Value>| async move {
                (
                    StatusCode::CREATED,
                    Json(json!({ "data": { "job_id": "j1", "type": body["type"] } })),
                )
            }),
        );
        let base = serve(app).await;

        let submission = JobSubmission {
            job_type: "backtest".into(),
            payload: Default::default(),
            metadata: None,
        };
        let data = client(&base).submit(&submission).await.unwrap();
        assert_eq!(data, json!({ "job_id": "j1", "type": "backtest" }));
    }

    #[tokio::test]
    async fn error_body_becomes_message() {
        let app = Router::new().route(
            "/api/v1/jobs/{id}",
            get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": "Job with id x not found", "code": "NOT_FOUND" })),
                )
            }),
        );
        let base = serve(app).await;

        let err = client(&base).status("x").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Job with id x not found (NOT_FOUND, HTTP 404)"
        );
    }

    #[tokio::test]
    async fn unreachable_server_names_the_url() {
        let err = client("http://127.0.0.1:9").backends().await.unwrap_err();
        assert!(err.to_string().contains("http://127.0.0.1:9"));
    }
}
