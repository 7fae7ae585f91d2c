//! Orchestrator event bus.
//!
//! - [`EventBus`] is an in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`] is the envelope for job and artifact lifecycle events.
//! - [`EventLogger`] is a background subscriber that traces every event.

pub mod bus;
pub mod logger;

pub use bus::{EventBus, PlatformEvent};
pub use logger::EventLogger;
