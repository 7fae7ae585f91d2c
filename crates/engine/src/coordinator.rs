//! Job execution coordinator.
//!
//! Each accepted submission gets one Tokio task holding a child of the
//! orchestrator's master [`CancellationToken`]. The task moves the job to
//! running, races the backend call against the token, and finalizes the
//! record. Finalization goes through the [`JobStore`] write lock, so when a
//! caller cancels while the backend is answering, whichever transition
//! takes the lock first decides the terminal state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use mcp_core::artifact::{Artifact, ArtifactFilter, ArtifactRegistration};
use mcp_core::error::{CoreError, CoreResult};
use mcp_core::job::{Job, JobOutcome, JobStatus};
use mcp_core::job_events::{
    ENTITY_ARTIFACT, ENTITY_JOB, EVENT_ARTIFACT_DELETED, EVENT_ARTIFACT_REGISTERED,
    EVENT_JOB_CANCELLED, EVENT_JOB_COMPLETED, EVENT_JOB_FAILED, EVENT_JOB_STARTED,
    EVENT_JOB_SUBMITTED,
};
use mcp_core::types::{EntityId, JsonMap};
use mcp_dispatch::{Backend, BackendDescriptor, DispatchRegistry, RemoteClient};
use mcp_events::{EventBus, PlatformEvent};
use mcp_store::{ArtifactRegistry, JobStore};
use serde_json::json;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::OrchestratorConfig;
use crate::ingest;

/// Bookkeeping for one in-flight job task.
struct RunningJob {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Accepts jobs, runs them on their registered backend and tracks their
/// lifecycle and artifacts.
///
/// Returned as `Arc<Self>` so it can be cloned into job tasks and Axum
/// state.
pub struct Orchestrator {
    jobs: JobStore,
    artifacts: ArtifactRegistry,
    registry: Arc<DispatchRegistry>,
    remote: RemoteClient,
    events: Arc<EventBus>,
    running: Mutex<HashMap<EntityId, RunningJob>>,
    /// Master cancellation token, cancelled during shutdown.
    cancel: CancellationToken,
    closed: AtomicBool,
    shutdown_timeout: Duration,
}

impl Orchestrator {
    /// Build an orchestrator that dispatches through `registry`.
    pub fn new(
        registry: Arc<DispatchRegistry>,
        config: &OrchestratorConfig,
    ) -> CoreResult<Arc<Self>> {
        Self::with_events(registry, config, Arc::new(EventBus::default()))
    }

    /// Like [`new`](Self::new) but publishing on an existing bus.
    pub fn with_events(
        registry: Arc<DispatchRegistry>,
        config: &OrchestratorConfig,
        events: Arc<EventBus>,
    ) -> CoreResult<Arc<Self>> {
        let remote = RemoteClient::new(config.remote_timeout)
            .map_err(|e| CoreError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Arc::new(Self {
            jobs: JobStore::new(),
            artifacts: ArtifactRegistry::new(),
            registry,
            remote,
            events,
            running: Mutex::new(HashMap::new()),
            cancel: CancellationToken::new(),
            closed: AtomicBool::new(false),
            shutdown_timeout: config.shutdown_timeout,
        }))
    }

    // ---- jobs ----

    /// Accept a job and start executing it in the background.
    ///
    /// Fails with [`CoreError::Dispatch`] before any record is created when
    /// no backend handles `job_type`, and with [`CoreError::ShuttingDown`]
    /// once [`shutdown`](Self::shutdown) has begun.
    pub async fn submit(
        self: &Arc<Self>,
        job_type: &str,
        payload: JsonMap,
        metadata: JsonMap,
    ) -> CoreResult<EntityId> {
        if self.is_closed() {
            return Err(CoreError::ShuttingDown);
        }

        let backend = self
            .registry
            .resolve(job_type)
            .await
            .ok_or_else(|| CoreError::Dispatch {
                job_type: job_type.to_string(),
            })?;

        let id = self.jobs.create(job_type, payload, metadata).await;
        tracing::info!(job_id = %id, job_type, backend = ?backend.kind(), "Job submitted");

        let mut running = self.running.lock().await;
        // Shutdown drains this map, so a submission that raced past the
        // first check must not leave an orphaned task behind.
        if self.is_closed() {
            self.jobs.cancel(&id).await;
            return Err(CoreError::ShuttingDown);
        }

        self.publish_job(EVENT_JOB_SUBMITTED, &id, json!({ "job_type": job_type }));

        let cancel = self.cancel.child_token();
        let handle = tokio::spawn(Arc::clone(self).run_job(id.clone(), backend, cancel.clone()));
        running.insert(id.clone(), RunningJob { cancel, handle });

        Ok(id)
    }

    /// Snapshot of a job.
    pub async fn status(&self, id: &str) -> CoreResult<Job> {
        self.jobs
            .get(id)
            .await
            .ok_or_else(|| CoreError::job_not_found(id))
    }

    /// Cancel a pending or running job.
    ///
    /// Returns `false` if the job is unknown or already terminal. For
    /// remote backends this only stops waiting for the response; the
    /// remote service is not told to abort.
    pub async fn cancel(&self, id: &str) -> bool {
        if !self.jobs.cancel(id).await {
            return false;
        }
        tracing::info!(job_id = %id, "Job cancelled");
        self.publish_job(EVENT_JOB_CANCELLED, id, json!({ "reason": "requested" }));

        if let Some(job) = self.running.lock().await.get(id) {
            job.cancel.cancel();
        }
        true
    }

    /// Jobs newest first, optionally filtered by status.
    pub async fn list(&self, status: Option<JobStatus>, limit: Option<usize>) -> Vec<Job> {
        self.jobs.list(status, limit).await
    }

    pub async fn job_count(&self) -> usize {
        self.jobs.count().await
    }

    /// Number of job tasks that have not finished yet.
    pub async fn active_tasks(&self) -> usize {
        self.running.lock().await.len()
    }

    // ---- artifacts ----

    pub async fn register_artifact(
        &self,
        registration: ArtifactRegistration,
    ) -> CoreResult<EntityId> {
        let id = self.artifacts.register(registration).await?;
        self.publish_artifact(EVENT_ARTIFACT_REGISTERED, &id);
        Ok(id)
    }

    pub async fn get_artifact(&self, id: &str) -> CoreResult<Artifact> {
        self.artifacts
            .get(id)
            .await
            .ok_or_else(|| CoreError::artifact_not_found(id))
    }

    pub async fn list_artifacts(&self, filter: &ArtifactFilter) -> Vec<Artifact> {
        self.artifacts.list(filter).await
    }

    pub async fn artifacts_for_job(&self, job_id: &str) -> Vec<Artifact> {
        self.artifacts.get_by_job(job_id).await
    }

    pub async fn artifact_dependencies(&self, id: &str) -> CoreResult<Vec<Artifact>> {
        self.artifacts.get_dependencies(id).await
    }

    pub async fn artifact_references(&self, id: &str) -> CoreResult<Vec<Artifact>> {
        self.artifacts.get_references(id).await
    }

    pub async fn delete_artifact(&self, id: &str) -> bool {
        let deleted = self.artifacts.delete(id).await;
        if deleted {
            self.publish_artifact(EVENT_ARTIFACT_DELETED, id);
        }
        deleted
    }

    pub async fn artifact_count(&self) -> usize {
        self.artifacts.count().await
    }

    // ---- backends ----

    /// Route `job_type` to `backend`, replacing any existing route.
    pub async fn register_backend(&self, job_type: &str, backend: Backend) -> CoreResult<()> {
        self.registry.register(job_type, backend).await.map(|_| ())
    }

    pub async fn backends(&self) -> Vec<BackendDescriptor> {
        self.registry.descriptors().await
    }

    // ---- events & lifecycle ----

    /// Subscribe to job and artifact lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.events.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Stop accepting work, cancel every live job and wait for job tasks
    /// to exit. Tasks are awaited concurrently, each bounded by the
    /// configured shutdown timeout.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!("Shutting down orchestrator");
        self.cancel.cancel();

        for id in self.jobs.live_ids().await {
            if self.jobs.cancel(&id).await {
                self.publish_job(EVENT_JOB_CANCELLED, &id, json!({ "reason": "shutdown" }));
            }
        }

        // Release the map before awaiting; finishing tasks deregister themselves.
        let tasks: Vec<(EntityId, RunningJob)> = self.running.lock().await.drain().collect();
        let waits = tasks.into_iter().map(|(id, job)| {
            job.cancel.cancel();
            let timeout = self.shutdown_timeout;
            async move {
                if tokio::time::timeout(timeout, job.handle).await.is_err() {
                    tracing::warn!(job_id = %id, "Job task did not stop within the shutdown timeout");
                }
            }
        });
        join_all(waits).await;

        tracing::info!("Orchestrator shut down complete");
    }

    // ---- private helpers ----

    /// Body of a job task.
    async fn run_job(self: Arc<Self>, id: EntityId, backend: Backend, cancel: CancellationToken) {
        if self.jobs.mark_running(&id).await {
            self.publish_job(EVENT_JOB_STARTED, &id, json!({}));
            self.drive(&id, &backend, &cancel).await;
        } else {
            tracing::debug!(job_id = %id, "Job no longer pending, skipping execution");
        }
        self.running.lock().await.remove(&id);
    }

    async fn drive(&self, id: &str, backend: &Backend, cancel: &CancellationToken) {
        let Some(job) = self.jobs.get(id).await else {
            return;
        };

        let target = match backend {
            Backend::Local(handler) => format!("local handler {}", handler.name()),
            Backend::Remote(service) => format!("remote service {}", service.base_url),
        };
        self.jobs
            .append_log(id, &format!("Dispatching to {target}"))
            .await;
        tracing::debug!(job_id = %id, target = %target, "Dispatching job");

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => JobOutcome::Cancelled,
            result = self.execute(backend, &job) => match result {
                Ok(result) => JobOutcome::Completed(result),
                Err(error) => JobOutcome::Failed(error),
            },
        };

        match outcome {
            JobOutcome::Completed(result) => {
                let entries = ingest::artifact_entries(&result, id);
                if self.jobs.complete(id, result).await {
                    tracing::info!(job_id = %id, "Job completed");
                    self.publish_job(EVENT_JOB_COMPLETED, id, json!({ "job_type": job.job_type }));
                    self.ingest_artifacts(id, entries).await;
                } else {
                    tracing::debug!(job_id = %id, "Job finalized elsewhere, discarding result");
                }
            }
            JobOutcome::Failed(error) => {
                if self.jobs.fail(id, error.clone()).await {
                    tracing::warn!(job_id = %id, error = %error, "Job failed");
                    self.publish_job(EVENT_JOB_FAILED, id, json!({ "error": error }));
                }
            }
            JobOutcome::Cancelled => {
                // Usually the canceller already finalized the record.
                if self.jobs.cancel(id).await {
                    self.publish_job(EVENT_JOB_CANCELLED, id, json!({ "reason": "shutdown" }));
                }
                tracing::info!(job_id = %id, "Job task stopped by cancellation");
            }
        }
    }

    /// Run `job` on `backend`; the error string becomes the job's `error`.
    async fn execute(&self, backend: &Backend, job: &Job) -> Result<JsonMap, String> {
        match backend {
            Backend::Local(handler) => {
                if !handler.validate(job).await {
                    return Err(format!(
                        "Validation failed: handler {} rejected job {}",
                        handler.name(),
                        job.id
                    ));
                }
                handler.execute(job).await.map_err(|e| e.to_string())
            }
            Backend::Remote(service) => self
                .remote
                .execute(service, job)
                .await
                .map_err(|e| e.to_string()),
        }
    }

    async fn ingest_artifacts(&self, job_id: &str, entries: Vec<ingest::ParsedEntry>) {
        for entry in entries {
            let registration = match entry {
                Ok(registration) => registration,
                Err(error) => {
                    tracing::warn!(job_id, error = %error, "Skipping malformed artifact descriptor");
                    continue;
                }
            };
            match self.register_artifact(registration).await {
                Ok(artifact_id) => {
                    tracing::debug!(job_id, artifact_id = %artifact_id, "Registered job artifact");
                }
                Err(e) => {
                    tracing::warn!(job_id, error = %e, "Failed to register job artifact");
                }
            }
        }
    }

    fn publish_job(&self, event_type: &str, id: &str, payload: serde_json::Value) {
        self.events.publish(
            PlatformEvent::new(event_type)
                .with_source(ENTITY_JOB, id)
                .with_payload(payload),
        );
    }

    fn publish_artifact(&self, event_type: &str, id: &str) {
        self.events
            .publish(PlatformEvent::new(event_type).with_source(ENTITY_ARTIFACT, id));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use mcp_core::artifact::ArtifactType;
    use mcp_dispatch::{HandlerError, JobHandler};

    /// Local handler whose behaviour is picked per test.
    enum Behaviour {
        Succeed(serde_json::Value),
        Fail(&'static str),
        Reject,
        Hang,
    }

    struct TestHandler(Behaviour);

    #[async_trait]
    impl JobHandler for TestHandler {
        fn name(&self) -> &str {
            "test"
        }

        fn job_types(&self) -> &[&str] {
            &["generic"]
        }

        async fn validate(&self, _job: &Job) -> bool {
            !matches!(self.0, Behaviour::Reject)
        }

        async fn execute(&self, _job: &Job) -> Result<JsonMap, HandlerError> {
            match &self.0 {
                Behaviour::Succeed(value) => Ok(value.as_object().cloned().unwrap_or_default()),
                Behaviour::Fail(msg) => Err(HandlerError::Execution(msg.to_string())),
                Behaviour::Reject => unreachable!("execute called after rejection"),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(JsonMap::new())
                }
            }
        }
    }

    async fn orchestrator(behaviour: Behaviour) -> Arc<Orchestrator> {
        let registry = Arc::new(DispatchRegistry::new());
        registry
            .register("generic", Backend::local(TestHandler(behaviour)))
            .await
            .unwrap();
        let config = OrchestratorConfig {
            shutdown_timeout: Duration::from_secs(2),
            ..OrchestratorConfig::default()
        };
        Orchestrator::new(registry, &config).unwrap()
    }

    async fn wait_terminal(orch: &Orchestrator, id: &str) -> Job {
        for _ in 0..500 {
            let job = orch.status(id).await.unwrap();
            if job.is_terminal() {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {id} never reached a terminal state");
    }

    async fn wait_running(orch: &Orchestrator, id: &str) {
        for _ in 0..500 {
            if orch.status(id).await.unwrap().status == JobStatus::Running {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("job {id} never started");
    }

    #[tokio::test]
    async fn successful_job_completes_with_result() {
        let orch = orchestrator(Behaviour::Succeed(json!({"answer": 42}))).await;
        let id = orch.submit("generic", JsonMap::new(), JsonMap::new()).await.unwrap();

        let job = wait_terminal(&orch, &id).await;
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.result.unwrap()["answer"], 42);
        assert!(job.error.is_none());
        assert!(job.started_at.is_some());
        assert!(job.completed_at.is_some());
    }

    #[tokio::test]
    async fn handler_error_fails_job() {
        let orch = orchestrator(Behaviour::Fail("disk full")).await;
        let id = orch.submit("generic", JsonMap::new(), JsonMap::new()).await.unwrap();

        let job = wait_terminal(&orch, &id).await;
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("disk full"));
        assert!(job.result.is_none());
    }

    #[tokio::test]
    async fn rejected_job_fails_without_execute() {
        let orch = orchestrator(Behaviour::Reject).await;
        let id = orch.submit("generic", JsonMap::new(), JsonMap::new()).await.unwrap();

        let job = wait_terminal(&orch, &id).await;
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(
            job.error.unwrap(),
            format!("Validation failed: handler test rejected job {id}")
        );
    }

    #[tokio::test]
    async fn unroutable_type_creates_no_record() {
        let orch = orchestrator(Behaviour::Hang).await;
        let err = orch
            .submit("backtest", JsonMap::new(), JsonMap::new())
            .await
            .unwrap_err();

        assert_matches!(err, CoreError::Dispatch { job_type } if job_type == "backtest");
        assert_eq!(orch.job_count().await, 0);
    }

    #[tokio::test]
    async fn cancel_running_job() {
        let orch = orchestrator(Behaviour::Hang).await;
        let id = orch.submit("generic", JsonMap::new(), JsonMap::new()).await.unwrap();
        wait_running(&orch, &id).await;

        assert!(orch.cancel(&id).await);
        let job = orch.status(&id).await.unwrap();
        assert_eq!(job.status, JobStatus::Cancelled);
        assert!(job.completed_at.is_some());
        assert!(job.result.is_none());

        assert!(!orch.cancel(&id).await);
        for _ in 0..200 {
            if orch.active_tasks().await == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(orch.active_tasks().await, 0);
    }

    #[tokio::test]
    async fn cancel_terminal_or_unknown_is_false() {
        let orch = orchestrator(Behaviour::Succeed(json!({}))).await;
        let id = orch.submit("generic", JsonMap::new(), JsonMap::new()).await.unwrap();
        let before = wait_terminal(&orch, &id).await;

        assert!(!orch.cancel(&id).await);
        assert_eq!(orch.status(&id).await.unwrap(), before);
        assert!(!orch.cancel("missing").await);
    }

    #[tokio::test]
    async fn status_of_unknown_job_is_not_found() {
        let orch = orchestrator(Behaviour::Hang).await;
        assert_matches!(
            orch.status("missing").await,
            Err(CoreError::NotFound { entity: "Job", .. })
        );
    }

    #[tokio::test]
    async fn result_artifacts_are_registered_for_the_job() {
        let orch = orchestrator(Behaviour::Succeed(json!({
            "artifacts": [
                {"name": "model.pkl", "type": "model", "storage_location": "/m", "job_id": "other"},
                {"name": "broken"},
                {"name": "plot.png", "type": "plot", "storage_location": "/p"},
            ]
        })))
        .await;
        let id = orch.submit("generic", JsonMap::new(), JsonMap::new()).await.unwrap();
        let job = wait_terminal(&orch, &id).await;
        assert_eq!(job.status, JobStatus::Completed);

        let mut artifacts = Vec::new();
        for _ in 0..100 {
            artifacts = orch.artifacts_for_job(&id).await;
            if artifacts.len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].artifact_type, ArtifactType::Model);
        assert!(artifacts.iter().all(|a| a.job_id.as_deref() == Some(id.as_str())));
    }

    #[tokio::test]
    async fn lifecycle_events_are_published() {
        let orch = orchestrator(Behaviour::Succeed(json!({}))).await;
        let mut rx = orch.subscribe();
        let id = orch.submit("generic", JsonMap::new(), JsonMap::new()).await.unwrap();
        wait_terminal(&orch, &id).await;

        let mut seen = Vec::new();
        while seen.len() < 3 {
            let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(event.source_entity_id.as_deref(), Some(id.as_str()));
            seen.push(event.event_type);
        }
        assert_eq!(seen, vec![EVENT_JOB_SUBMITTED, EVENT_JOB_STARTED, EVENT_JOB_COMPLETED]);
    }

    #[tokio::test]
    async fn shutdown_cancels_live_jobs_and_rejects_new_ones() {
        let orch = orchestrator(Behaviour::Hang).await;
        let id = orch.submit("generic", JsonMap::new(), JsonMap::new()).await.unwrap();
        wait_running(&orch, &id).await;

        orch.shutdown().await;

        assert_eq!(orch.status(&id).await.unwrap().status, JobStatus::Cancelled);
        assert_eq!(orch.active_tasks().await, 0);
        assert_matches!(
            orch.submit("generic", JsonMap::new(), JsonMap::new()).await,
            Err(CoreError::ShuttingDown)
        );
        // Second call is a no-op.
        orch.shutdown().await;
    }

    #[tokio::test]
    async fn artifact_passthrough_publishes_events() {
        let orch = orchestrator(Behaviour::Hang).await;
        let mut rx = orch.subscribe();

        let id = orch
            .register_artifact(ArtifactRegistration::new("data.csv", ArtifactType::Data, "/d"))
            .await
            .unwrap();
        assert_eq!(orch.get_artifact(&id).await.unwrap().name, "data.csv");
        assert!(orch.delete_artifact(&id).await);
        assert!(!orch.delete_artifact(&id).await);
        assert_matches!(
            orch.get_artifact(&id).await,
            Err(CoreError::NotFound { entity: "Artifact", .. })
        );

        assert_eq!(rx.recv().await.unwrap().event_type, EVENT_ARTIFACT_REGISTERED);
        assert_eq!(rx.recv().await.unwrap().event_type, EVENT_ARTIFACT_DELETED);
    }
}
