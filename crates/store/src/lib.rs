//! In-memory state for the orchestrator.
//!
//! [`JobStore`] owns the authoritative job records and enforces legal
//! lifecycle transitions. [`ArtifactRegistry`] owns artifact records, their
//! secondary indices, and the bidirectional dependency graph. Both are
//! process-lifetime only and are shared behind `Arc`.

pub mod artifact_registry;
pub mod job_store;

pub use artifact_registry::ArtifactRegistry;
pub use job_store::JobStore;
