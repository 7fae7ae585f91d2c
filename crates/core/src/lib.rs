//! Domain types for the MCP orchestrator.
//!
//! Data types and transition rules: jobs and their lifecycle,
//! artifacts and their dependency references, the shared error type,
//! environment parsing helpers, and the event names published on the
//! platform bus.

pub mod artifact;
pub mod config;
pub mod error;
pub mod job;
pub mod job_events;
pub mod types;
