//! Traits the application layer depends on, implemented by infrastructure.
//!
//! # Architecture
//!
//! The relay and the publisher only know these two seams:
//!
//! - [`BusClient`]: publish / flush / subscribe on the message bus.
//!   Implemented by `NatsBusClient` (real NATS) and `InMemoryBus` (tests and
//!   offline UI work).
//! - [`EventSink`]: the "emit event" capability of the UI host.
//!   Implemented by `BroadcastEventSink`, which fans events out to every
//!   connected WebSocket session.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use thiserror::Error;

use crate::domain::messages::UiEvent;

/// One message received from the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub topic: String,
    pub payload: Bytes,
}

/// A live subscription: a stream of messages that ends when the bus closes.
pub type BusSubscription = BoxStream<'static, BusMessage>;

/// Failures talking to the bus.
///
/// No variant is retried by the bridge; the caller decides.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The client has been closed (shutdown in progress or completed).
    #[error("bus connection is closed")]
    Closed,

    /// The connection could not be established.
    #[error("failed to connect to bus at {addr}: {reason}")]
    Connect { addr: String, reason: String },

    /// A publish was refused by the client.
    #[error("publish to {topic} failed: {reason}")]
    Publish { topic: String, reason: String },

    /// The flush round-trip failed.
    #[error("flush failed: {0}")]
    Flush(String),

    /// The flush round-trip did not complete in time.
    #[error("flush did not complete within {0:?}")]
    FlushTimeout(Duration),

    /// The subscription could not be created.
    #[error("subscribe to {topic} failed: {reason}")]
    Subscribe { topic: String, reason: String },
}

/// Publish/subscribe access to the message bus.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BusClient: Send + Sync {
    /// Queues `payload` for delivery on `topic`.
    ///
    /// Returning `Ok` means the client accepted the message, not that it has
    /// reached the server; call [`BusClient::flush`] for that.
    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), TransportError>;

    /// Waits until every queued message has been written to the server.
    async fn flush(&self) -> Result<(), TransportError>;

    /// Subscribes to exactly `topic`.
    async fn subscribe(&self, topic: &str) -> Result<BusSubscription, TransportError>;

    /// Closes the connection.  Safe to call more than once.
    async fn close(&self);
}

/// The UI host's "emit event" capability.
///
/// `emit` must not block: it is called from relay workers, and a slow UI must
/// never stall a bus subscription.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: UiEvent);
}
