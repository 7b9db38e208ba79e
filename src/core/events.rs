use tokio::sync::broadcast;

/// Session lifecycle events published by the session actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A wallet was paired
    Connected { address: String },
    /// The session was revoked on request
    Revoked { address: String },
    /// The session was dropped locally (failed liveness check or shutdown)
    Cleared { address: String, reason: String },
}

/// Create the event channel; sends are ignored when nobody is subscribed
pub fn channel() -> broadcast::Sender<SessionEvent> {
    let (tx, _) = broadcast::channel(100);
    tx
}

pub fn publish(bus: &broadcast::Sender<SessionEvent>, event: SessionEvent) {
    tracing::debug!("Session event: {:?}", event);
    // We ignore errors if there are no receivers
    let _ = bus.send(event);
}
