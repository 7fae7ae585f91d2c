//! Job-type to backend routing table.
//!
//! Each job type maps to exactly one [`Backend`]. Registration is
//! last-write-wins with no versioning.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use mcp_core::error::CoreError;
use mcp_core::job::validate_job_type;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::handler::JobHandler;
use crate::remote::EXECUTE_PATH;

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Address of a remote execution service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteService {
    pub base_url: String,
}

impl RemoteService {
    /// Build a descriptor from a base URL such as `http://host:8100`.
    ///
    /// The URL must use `http` or `https`; a trailing slash is dropped.
    pub fn new(base_url: impl Into<String>) -> Result<Self, CoreError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        let has_host = base_url
            .strip_prefix("http://")
            .or_else(|| base_url.strip_prefix("https://"))
            .is_some_and(|rest| !rest.is_empty());
        if !has_host {
            return Err(CoreError::Validation(format!(
                "Service URL must be an http(s) URL with a host, got \"{base_url}\""
            )));
        }
        Ok(Self { base_url })
    }

    /// Full URL of the service's execute endpoint.
    pub fn execute_url(&self) -> String {
        format!("{}{EXECUTE_PATH}", self.base_url)
    }
}

/// Where jobs of a given type are executed.
#[derive(Clone)]
pub enum Backend {
    /// Run in-process through a [`JobHandler`].
    Local(Arc<dyn JobHandler>),
    /// Forward to a remote service over HTTP.
    Remote(RemoteService),
}

impl Backend {
    pub fn local<H: JobHandler + 'static>(handler: H) -> Self {
        Backend::Local(Arc::new(handler))
    }

    pub fn remote(base_url: impl Into<String>) -> Result<Self, CoreError> {
        RemoteService::new(base_url).map(Backend::Remote)
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Local(_) => BackendKind::Local,
            Backend::Remote(_) => BackendKind::Remote,
        }
    }

    fn describe(&self, job_type: &str) -> BackendDescriptor {
        let (handler, service_url) = match self {
            Backend::Local(h) => (Some(h.name().to_string()), None),
            Backend::Remote(s) => (None, Some(s.base_url.clone())),
        };
        BackendDescriptor {
            job_type: job_type.to_string(),
            kind: self.kind(),
            handler,
            service_url,
        }
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Local(h) => f.debug_tuple("Local").field(&h.name()).finish(),
            Backend::Remote(s) => f.debug_tuple("Remote").field(&s.base_url).finish(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Local,
    Remote,
}

/// Read-only view of a registration, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendDescriptor {
    pub job_type: String,
    pub kind: BackendKind,
    /// Handler name for local backends.
    pub handler: Option<String>,
    /// Base URL for remote backends.
    pub service_url: Option<String>,
}

// ---------------------------------------------------------------------------
// DispatchRegistry
// ---------------------------------------------------------------------------

/// Maps job types to backends.
///
/// Created by the composition root and shared with the orchestrator via
/// `Arc`. Independent instances never see each other's registrations.
#[derive(Default)]
pub struct DispatchRegistry {
    backends: RwLock<HashMap<String, Backend>>,
}

impl DispatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `job_type` to `backend`, replacing any previous mapping.
    ///
    /// Returns the backend that was replaced, if any.
    pub async fn register(
        &self,
        job_type: &str,
        backend: Backend,
    ) -> Result<Option<Backend>, CoreError> {
        validate_job_type(job_type)?;

        tracing::info!(job_type, backend = ?backend, "Registered backend");
        let previous = self
            .backends
            .write()
            .await
            .insert(job_type.to_string(), backend);

        if let Some(prev) = &previous {
            tracing::debug!(job_type, replaced = ?prev, "Replaced existing backend");
        }
        Ok(previous)
    }

    /// Register a local handler for every type in its
    /// [`job_types`](JobHandler::job_types).
    pub async fn register_handler(&self, handler: Arc<dyn JobHandler>) -> Result<(), CoreError> {
        for job_type in handler.job_types() {
            self.register(job_type, Backend::Local(Arc::clone(&handler)))
                .await?;
        }
        Ok(())
    }

    /// Remove the mapping for `job_type`. Returns `false` if none existed.
    pub async fn unregister(&self, job_type: &str) -> bool {
        let removed = self.backends.write().await.remove(job_type).is_some();
        if removed {
            tracing::info!(job_type, "Unregistered backend");
        }
        removed
    }

    pub async fn can_handle(&self, job_type: &str) -> bool {
        self.backends.read().await.contains_key(job_type)
    }

    pub async fn resolve(&self, job_type: &str) -> Option<Backend> {
        self.backends.read().await.get(job_type).cloned()
    }

    /// Every registration, sorted by job type.
    pub async fn descriptors(&self) -> Vec<BackendDescriptor> {
        let backends = self.backends.read().await;
        let mut out: Vec<_> = backends
            .iter()
            .map(|(job_type, backend)| backend.describe(job_type))
            .collect();
        out.sort_by(|a, b| a.job_type.cmp(&b.job_type));
        out
    }
}

impl fmt::Debug for DispatchRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchRegistry").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
