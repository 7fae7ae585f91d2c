//! Execution coordinator.
//!
//! [`Orchestrator`] ties the job store, the dispatch registry and the
//! artifact registry together: it accepts submissions, runs each job on its
//! backend in a dedicated Tokio task, finalizes the job record and ingests
//! any artifacts the job reports.

pub mod config;
pub mod coordinator;
mod ingest;

pub use config::{OrchestratorConfig, RemoteBackendSpec};
pub use mcp_core::config::ConfigError;
pub use coordinator::Orchestrator;
