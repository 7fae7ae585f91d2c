//! Job lifecycle store.
//!
//! Every mutation takes the table's write lock, so two callers racing to
//! finalize the same job (natural completion vs. cancellation) are
//! serialized and exactly one of them observes a `true` return.

use std::collections::HashMap;

use mcp_core::job::{Job, JobOutcome, JobStatus};
use mcp_core::types::{new_id, EntityId, JsonMap};
use tokio::sync::RwLock;

/// Authoritative, process-wide job records.
#[derive(Debug, Default)]
pub struct JobStore {
    inner: RwLock<JobTable>,
}

#[derive(Debug, Default)]
struct JobTable {
    records: HashMap<EntityId, StoredJob>,
    /// Insertion counter used to break `created_at` ties when listing.
    next_seq: u64,
}

#[derive(Debug)]
struct StoredJob {
    seq: u64,
    job: Job,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new pending job and return its id.
    ///
    /// Does not check whether `job_type` is routable; that is the
    /// orchestrator's responsibility.
    pub async fn create(
        &self,
        job_type: &str,
        payload: JsonMap,
        metadata: JsonMap,
    ) -> EntityId {
        let mut table = self.inner.write().await;

        let mut job = Job::new(job_type, payload, metadata);
        while table.records.contains_key(&job.id) {
            job.id = new_id();
        }

        let id = job.id.clone();
        let seq = table.next_seq;
        table.next_seq += 1;
        table.records.insert(id.clone(), StoredJob { seq, job });

        tracing::debug!(job_id = %id, job_type, "Job record created");
        id
    }

    /// Snapshot of a single job.
    pub async fn get(&self, id: &str) -> Option<Job> {
        self.inner
            .read()
            .await
            .records
            .get(id)
            .map(|stored| stored.job.clone())
    }

    /// `Pending -> Running`. Returns `false` if the job is unknown or no
    /// longer pending (e.g. cancelled before its task was scheduled).
    pub async fn mark_running(&self, id: &str) -> bool {
        let mut table = self.inner.write().await;
        let Some(stored) = table.records.get_mut(id) else {
            return false;
        };
        let now = chrono::Utc::now();
        let started = stored.job.start(now);
        if started {
            stored.job.push_log("Job started", now);
        }
        started
    }

    /// `Running -> Completed` with `result`.
    pub async fn complete(&self, id: &str, result: JsonMap) -> bool {
        self.finish(id, JobOutcome::Completed(result)).await
    }

    /// `Running -> Failed` with `error`.
    pub async fn fail(&self, id: &str, error: impl Into<String>) -> bool {
        self.finish(id, JobOutcome::Failed(error.into())).await
    }

    /// `Pending | Running -> Cancelled`.
    ///
    /// Returns `true` only if the job existed and was not already terminal.
    pub async fn cancel(&self, id: &str) -> bool {
        self.finish(id, JobOutcome::Cancelled).await
    }

    /// Move a job into a terminal state. Terminal states are absorbing, so
    /// a second finalization attempt is a no-op returning `false`.
    pub async fn finish(&self, id: &str, outcome: JobOutcome) -> bool {
        let mut table = self.inner.write().await;
        let Some(stored) = table.records.get_mut(id) else {
            return false;
        };

        if !stored.job.status.can_transition_to(outcome.status()) {
            return false;
        }

        let now = chrono::Utc::now();
        let line = match &outcome {
            JobOutcome::Completed(_) => "Job completed".to_string(),
            JobOutcome::Failed(error) => format!("Job failed: {error}"),
            JobOutcome::Cancelled => "Job cancelled".to_string(),
        };
        // The record is frozen once terminal, so the closing line goes first.
        stored.job.push_log(&line, now);
        stored.job.finish(outcome, now)
    }

    /// Append a line to a live job's log.
    pub async fn append_log(&self, id: &str, line: &str) -> bool {
        let mut table = self.inner.write().await;
        match table.records.get_mut(id) {
            Some(stored) => stored.job.push_log(line, chrono::Utc::now()),
            None => false,
        }
    }

    /// Jobs newest first, optionally filtered by status. The filter is
    /// applied before `limit`.
    pub async fn list(&self, status: Option<JobStatus>, limit: Option<usize>) -> Vec<Job> {
        let table = self.inner.read().await;

        let mut matching: Vec<&StoredJob> = table
            .records
            .values()
            .filter(|stored| status.map_or(true, |s| stored.job.status == s))
            .collect();

        matching.sort_by(|a, b| {
            b.job
                .created_at
                .cmp(&a.job.created_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });

        matching
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|stored| stored.job.clone())
            .collect()
    }

    /// Ids of every job that has not reached a terminal state.
    pub async fn live_ids(&self) -> Vec<EntityId> {
        self.inner
            .read()
            .await
            .records
            .values()
            .filter(|stored| !stored.job.is_terminal())
            .map(|stored| stored.job.id.clone())
            .collect()
    }

    pub async fn count(&self) -> usize {
        self.inner.read().await.records.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
