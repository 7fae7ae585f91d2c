//! MCP CLI - command-line client for the orchestrator API.
//!
//! ```bash
//! mcp submit --type ml_experiment --config '{"model": "linear", "dataset": "iris"}'
//! mcp status <job-id>
//! mcp list --status running --limit 10
//! mcp register-service --job-type backtest --service-url http://worker:8100
//! ```

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use mcp_core::job::JobSubmission;
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod args;
mod client;
mod input;

use args::{Cli, Command};
use client::ApiClient;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    let client = ApiClient::new(&cli.api_url, Duration::from_secs(cli.timeout))?;
    tracing::debug!(api_url = %cli.api_url, "Using orchestrator");

    match cli.command {
        Command::Submit {
            job_type,
            config,
            metadata,
        } => {
            let submission = JobSubmission {
                job_type,
                payload: input::json_object_arg(&config)?,
                metadata: metadata.as_deref().map(input::parse_object).transpose()?,
            };
            let data = client.submit(&submission).await?;
            println!(
                "Job submitted successfully: {}",
                data["job_id"].as_str().unwrap_or_default()
            );
        }
        Command::Status { job_id } => print_json(&client.status(&job_id).await?)?,
        Command::Cancel { job_id } => {
            client.cancel(&job_id).await?;
            println!("Job cancelled: {job_id}");
        }
        Command::List { status, limit } => {
            let jobs = client.list(status.as_deref(), limit).await?;
            if jobs.as_array().is_some_and(Vec::is_empty) {
                println!("No jobs found");
            } else {
                print_json(&summarize_jobs(&jobs))?;
            }
        }
        Command::Backends => print_json(&client.backends().await?)?,
        Command::RegisterService {
            job_type,
            service_url,
        } => {
            client.register_service(&job_type, &service_url).await?;
            println!("Registered {job_type} service at {service_url}");
        }
        Command::Artifacts {
            artifact_type,
            job_id,
            service_id,
            limit,
        } => {
            let filter: Vec<(&str, String)> = [
                ("artifact_type", artifact_type),
                ("job_id", job_id),
                ("service_id", service_id),
                ("limit", limit.map(|l| l.to_string())),
            ]
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .collect();
            print_json(&client.artifacts(&filter).await?)?;
        }
    }

    Ok(())
}

/// Log to stderr so command output on stdout stays pipeable.
fn init_tracing(verbose: bool, json_logs: bool) {
    let default_level = if verbose { "mcp_cli=debug" } else { "mcp_cli=warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_level.into());
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Keep the listing compact: id, type, status and timestamps only.
fn summarize_jobs(jobs: &Value) -> Value {
    let rows: Vec<Value> = jobs
        .as_array()
        .map(|jobs| {
            jobs.iter()
                .map(|job| {
                    serde_json::json!({
                        "id": job["id"],
                        "type": job["type"],
                        "status": job["status"],
                        "created_at": job["created_at"],
                        "completed_at": job["completed_at"],
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    Value::Array(rows)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ---- Tests ----

    #[test]
    fn summary_drops_payload_and_result() {
        let jobs = json!([{
            "id": "j1",
            "type": "backtest",
            "status": "completed",
            "created_at": "2024-01-01T00:00:00Z",
            "completed_at": "2024-01-01T00:00:03Z",
            "payload": {"ticker": "AAPL"},
            "result": {"final_value": 1.0},
        }]);

        let summary = summarize_jobs(&jobs);
        assert_eq!(summary[0]["id"], "j1");
        assert!(summary[0].get("payload").is_none());
        assert!(summary[0].get("result").is_none());
    }
}
