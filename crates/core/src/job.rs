//! Job model and lifecycle rules.
//!
//! A job moves `Pending -> Running -> {Completed | Failed | Cancelled}`.
//! A pending job may also be cancelled before it ever starts. Terminal
//! states are absorbing: once reached, no field of the record changes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{new_id, EntityId, JsonMap, Timestamp};

// ---------------------------------------------------------------------------
// Well-known job types
// ---------------------------------------------------------------------------

/// Machine-learning experiment jobs.
pub const JOB_TYPE_ML_EXPERIMENT: &str = "ml_experiment";

/// Quantitative strategy backtest jobs.
pub const JOB_TYPE_BACKTEST: &str = "backtest";

/// Catch-all job type for ad-hoc backends.
pub const JOB_TYPE_GENERIC: &str = "generic";

/// Maximum length of a job type identifier.
const MAX_JOB_TYPE_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Job execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Completed, Failed, and Cancelled are absorbing states.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// Whether moving from `self` to `next` is a legal lifecycle step.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Running)
                | (JobStatus::Pending, JobStatus::Cancelled)
                | (JobStatus::Running, JobStatus::Completed)
                | (JobStatus::Running, JobStatus::Failed)
                | (JobStatus::Running, JobStatus::Cancelled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            "cancelled" => Ok(JobStatus::Cancelled),
            other => Err(CoreError::Validation(format!(
                "Unknown job status: \"{other}\""
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// How a job reached its terminal state.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed(JsonMap),
    Failed(String),
    Cancelled,
}

impl JobOutcome {
    pub fn status(&self) -> JobStatus {
        match self {
            JobOutcome::Completed(_) => JobStatus::Completed,
            JobOutcome::Failed(_) => JobStatus::Failed,
            JobOutcome::Cancelled => JobStatus::Cancelled,
        }
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// A unit of requested work and its tracked lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub job_type: String,
    pub payload: JsonMap,
    pub status: JobStatus,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub result: Option<JsonMap>,
    pub error: Option<String>,
    pub logs: Vec<String>,
    pub metadata: JsonMap,
}

impl Job {
    /// Build a fresh pending job with a newly allocated id.
    pub fn new(job_type: impl Into<String>, payload: JsonMap, metadata: JsonMap) -> Self {
        Self {
            id: new_id(),
            job_type: job_type.into(),
            payload,
            status: JobStatus::Pending,
            created_at: chrono::Utc::now(),
            started_at: None,
            completed_at: None,
            result: None,
            error: None,
            logs: Vec::new(),
            metadata,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply `Pending -> Running`. Returns `false` without touching the
    /// record when the job is not pending.
    pub fn start(&mut self, now: Timestamp) -> bool {
        if !self.status.can_transition_to(JobStatus::Running) {
            return false;
        }
        self.status = JobStatus::Running;
        self.started_at = Some(now);
        true
    }

    /// Move the job into the terminal state described by `outcome`.
    ///
    /// Returns `false` without touching the record when the step is not
    /// legal from the current status.
    pub fn finish(&mut self, outcome: JobOutcome, now: Timestamp) -> bool {
        let next = outcome.status();
        if !self.status.can_transition_to(next) {
            return false;
        }
        match outcome {
            JobOutcome::Completed(result) => self.result = Some(result),
            JobOutcome::Failed(error) => self.error = Some(error),
            JobOutcome::Cancelled => {}
        }
        self.status = next;
        self.completed_at = Some(now);
        true
    }

    /// Append a timestamped line to the job log while it is still live.
    pub fn push_log(&mut self, line: &str, now: Timestamp) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.logs.push(format!("[{}] {line}", now.to_rfc3339()));
        true
    }
}

/// Submission request: `{ "type": ..., "payload": {...}, "metadata": {...} }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSubmission {
    #[serde(rename = "type")]
    pub job_type: String,
    #[serde(default)]
    pub payload: JsonMap,
    #[serde(default)]
    pub metadata: Option<JsonMap>,
}

/// Validate a job type identifier before it is looked up or registered.
///
/// Rules:
/// - Must not be empty.
/// - Must not exceed `MAX_JOB_TYPE_LEN` characters.
/// - Only lowercase ASCII letters, digits, underscore, hyphen, or dot.
pub fn validate_job_type(job_type: &str) -> Result<(), CoreError> {
    if job_type.is_empty() {
        return Err(CoreError::Validation(
            "Job type must not be empty".to_string(),
        ));
    }
    if job_type.len() > MAX_JOB_TYPE_LEN {
        return Err(CoreError::Validation(format!(
            "Job type must not exceed {MAX_JOB_TYPE_LEN} characters"
        )));
    }
    if !job_type
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-' | '.'))
    {
        return Err(CoreError::Validation(format!(
            "Job type \"{job_type}\" may only contain lowercase letters, digits, '_', '-' or '.'"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
