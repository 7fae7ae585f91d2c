//! Background subscriber that writes every bus event to the trace log.

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::bus::PlatformEvent;

/// Traces each [`PlatformEvent`] it receives.
pub struct EventLogger;

impl EventLogger {
    /// Run until `cancel` fires or the bus is dropped.
    ///
    /// Returns the number of events logged.
    pub async fn run(
        mut receiver: broadcast::Receiver<PlatformEvent>,
        cancel: CancellationToken,
    ) -> u64 {
        let mut logged = 0u64;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(logged, "Event logger cancelled");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(event) => {
                        Self::log(&event);
                        logged += 1;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Event logger lagged, some events were not logged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Event bus closed, event logger shutting down");
                        break;
                    }
                },
            }
        }
        logged
    }

    fn log(event: &PlatformEvent) {
        tracing::info!(
            event_type = %event.event_type,
            entity_type = event.source_entity_type.as_deref().unwrap_or("-"),
            entity_id = event.source_entity_id.as_deref().unwrap_or("-"),
            payload = %event.payload,
            "Event"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventBus;

    #[tokio::test]
    async fn stops_when_bus_is_dropped() {
        let bus = EventBus::default();
        let rx = bus.subscribe();
        let handle = tokio::spawn(EventLogger::run(rx, CancellationToken::new()));

        bus.publish(PlatformEvent::new("job.submitted").with_source("job", "a"));
        bus.publish(PlatformEvent::new("job.started").with_source("job", "a"));
        drop(bus);

        assert_eq!(handle.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn stops_on_cancel() {
        let bus = EventBus::default();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(EventLogger::run(bus.subscribe(), cancel.clone()));

        cancel.cancel();
        assert_eq!(handle.await.unwrap(), 0);
    }
}
