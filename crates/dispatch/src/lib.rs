//! Job-type dispatch: backend registry, the local handler trait, and the
//! HTTP client for remote execution services.
//!
//! A [`registry::DispatchRegistry`] is owned by the composition root and
//! handed to the orchestrator; there is no process-global table.

pub mod handler;
pub mod registry;
pub mod remote;

pub use handler::{require_params, HandlerError, JobHandler};
pub use registry::{Backend, BackendDescriptor, BackendKind, DispatchRegistry, RemoteService};
pub use remote::{RemoteClient, RemoteError};
