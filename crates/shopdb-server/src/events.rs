//! In-process event bus. Handlers publish [`DomainEvent`]s after a change is
//! committed; a background task drains the channel and logs each event.

use shopdb_core::DomainEvent;
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
};

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: mpsc::Sender<DomainEvent>,
}

impl EventBus {
    /// Bus plus its receiving end, for callers that consume events themselves.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<DomainEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Bus with a spawned logging consumer. Must be called inside a tokio runtime.
    #[must_use]
    pub fn spawn_logging() -> (Self, JoinHandle<()>) {
        let (bus, rx) = Self::channel(DEFAULT_CAPACITY);
        let handle = tokio::spawn(log_events(rx));
        (bus, handle)
    }

    /// Publishes without waiting. A full or closed channel drops the event.
    pub fn publish(&self, event: DomainEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                tracing::warn!(event = event.kind(), "event bus full; dropping event");
            }
            Err(TrySendError::Closed(event)) => {
                tracing::warn!(event = event.kind(), "event bus closed; dropping event");
            }
        }
    }
}

async fn log_events(mut rx: mpsc::Receiver<DomainEvent>) {
    while let Some(event) = rx.recv().await {
        match serde_json::to_string(&event) {
            Ok(payload) => tracing::info!(event = event.kind(), %payload, "domain event"),
            Err(e) => tracing::warn!(event = event.kind(), error = %e, "failed to encode event"),
        }
    }
    tracing::debug!("event bus drained");
}
