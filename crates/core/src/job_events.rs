//! Event type names published on the platform event bus.
//!
//! Emitted by the orchestrator when a job or artifact changes state.

/// A job was accepted and stored as pending.
pub const EVENT_JOB_SUBMITTED: &str = "job.submitted";

/// A job moved from pending to running.
pub const EVENT_JOB_STARTED: &str = "job.started";

/// Job completed successfully.
pub const EVENT_JOB_COMPLETED: &str = "job.completed";

/// Job failed with an error.
pub const EVENT_JOB_FAILED: &str = "job.failed";

/// Job was cancelled (by a caller or by shutdown).
pub const EVENT_JOB_CANCELLED: &str = "job.cancelled";

/// An artifact was added to the registry.
pub const EVENT_ARTIFACT_REGISTERED: &str = "artifact.registered";

/// An artifact was removed from the registry.
pub const EVENT_ARTIFACT_DELETED: &str = "artifact.deleted";

/// Source entity kind attached to job events.
pub const ENTITY_JOB: &str = "job";

/// Source entity kind attached to artifact events.
pub const ENTITY_ARTIFACT: &str = "artifact";
