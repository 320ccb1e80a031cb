//! Fans UI notifications out to every connected WebSocket session.
//!
//! Backed by a `tokio::sync::broadcast` channel: [`EventSink::emit`] never
//! waits, and a session that falls too far behind skips the oldest events
//! (it will still see the newest gains, which is all the UI displays).

use tokio::sync::broadcast;
use tracing::trace;

use crate::application::ports::EventSink;
use crate::domain::messages::UiEvent;

/// Events buffered per session before the slowest one starts skipping.
pub const EVENT_CAPACITY: usize = 128;

/// [`EventSink`] that publishes to a broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastEventSink {
    tx: broadcast::Sender<UiEvent>,
}

impl BroadcastEventSink {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    /// A receiver that sees every event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for BroadcastEventSink {
    fn emit(&self, event: UiEvent) {
        // No connected sessions is normal (the UI may not be open yet).
        match self.tx.send(event) {
            Ok(n) => trace!("UI event delivered to {n} session(s)"),
            Err(broadcast::error::SendError(event)) => {
                trace!("no UI session for {}", event.channel)
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
