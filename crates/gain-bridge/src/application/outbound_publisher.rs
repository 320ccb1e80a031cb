//! Outbound publisher: UI knob update → bus topic.
//!
//! # Steps
//!
//! ```text
//! KnobUpdate ─► resolve ─► encode ─► publish ─► (flush, bounded) ─► Ok(topic)
//!                  │          │          │             │
//!                  ▼          ▼          ▼             ▼
//!         InvalidIdentifier  Encode   Transport    Transport
//! ```
//!
//! An invalid identifier or value never reaches the bus.  Each successful
//! resolve+encode produces exactly one publish.  Nothing is retried,
//! de-duplicated or coalesced: two identical updates are two messages.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use gain_core::{encode_knob_value, EncodeError, InvalidIdentifierError, KnobId, KnobUpdate};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::application::ports::{BusClient, TransportError};

/// Why a knob update was not published.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The identifier is malformed or names an unknown component.
    #[error(transparent)]
    InvalidIdentifier(#[from] InvalidIdentifierError),

    /// The value cannot be represented on the wire.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The bus refused the publish or the flush failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Whether to wait for the message to reach the server before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushPolicy {
    /// Fire-and-forget; the client buffers and sends when it can.
    Never,
    /// Flush after every publish, failing if it takes longer than the bound.
    Bounded(Duration),
}

/// Publishes knob updates on their resolved topics.
pub struct OutboundPublisher {
    bus: Arc<dyn BusClient>,
    flush: FlushPolicy,
}

impl OutboundPublisher {
    pub fn new(bus: Arc<dyn BusClient>, flush: FlushPolicy) -> Self {
        Self { bus, flush }
    }

    /// Publishes one knob update and returns the topic it went to.
    ///
    /// Must not be called from inside a relay worker: the relay and the
    /// publisher share the bus connection.
    ///
    /// # Errors
    ///
    /// See [`PublishError`].  The bus is not contacted unless the identifier
    /// and value are both valid.
    pub async fn publish(&self, update: &KnobUpdate) -> Result<String, PublishError> {
        info!("knob {} changed to {:.2}", update.knob, update.value);

        let knob = KnobId::parse(&update.knob).map_err(|e| {
            warn!("invalid knob ID {:?}: {e}", update.knob);
            e
        })?;
        let topic = knob.topic();

        let payload = encode_knob_value(update.value).map_err(|e| {
            warn!("failed to encode gain for {knob}: {e}");
            e
        })?;

        self.bus
            .publish(&topic, Bytes::from(payload))
            .await
            .map_err(|e| {
                warn!("failed to publish to {topic}: {e}");
                e
            })?;

        if let FlushPolicy::Bounded(limit) = self.flush {
            self.flush_within(limit).await?;
        }

        debug!("published gain {:.2} to {topic}", update.value);
        Ok(topic)
    }

    async fn flush_within(&self, limit: Duration) -> Result<(), TransportError> {
        match timeout(limit, self.bus.flush()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                warn!("failed to flush bus connection: {e}");
                Err(e)
            }
            Err(_) => {
                warn!("bus flush timed out after {limit:?}");
                Err(TransportError::FlushTimeout(limit))
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
