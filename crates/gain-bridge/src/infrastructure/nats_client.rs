//! [`BusClient`] over a real NATS connection (`async-nats`).
//!
//! One connection is shared by the publisher and both relay subscriptions.
//! `async_nats::Client` is internally a handle to a connection task, so
//! publishing from the UI path never waits on a subscription being drained.
//!
//! [`BusClient::close`] flushes once, bounded by [`CLOSE_FLUSH_TIMEOUT`], so
//! a value published without a per-publish flush still reaches the server.
//! After that the handle is gone: every call returns
//! [`TransportError::Closed`].

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::application::ports::{BusClient, BusMessage, BusSubscription, TransportError};

/// Upper bound on the final flush in [`BusClient::close`].
pub const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_millis(500);

/// A NATS connection that can be closed exactly once.
pub struct NatsBusClient {
    client: RwLock<Option<async_nats::Client>>,
}

impl NatsBusClient {
    /// Connects to `url`, giving up after `limit`.
    ///
    /// # Errors
    ///
    /// [`TransportError::Connect`] if the server refuses, is unreachable, or
    /// does not complete the handshake in time.
    pub async fn connect(url: &str, name: &str, limit: Duration) -> Result<Self, TransportError> {
        debug!("connecting to NATS at {url}");

        let connect = async_nats::ConnectOptions::new()
            .name(name)
            .connection_timeout(limit)
            .connect(url);

        let client = match timeout(limit, connect).await {
            Ok(Ok(client)) => client,
            Ok(Err(e)) => {
                return Err(TransportError::Connect {
                    addr: url.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(TransportError::Connect {
                    addr: url.to_string(),
                    reason: format!("timed out after {limit:?}"),
                })
            }
        };

        info!("connected to NATS at {url}");
        Ok(Self {
            client: RwLock::new(Some(client)),
        })
    }

    async fn handle(&self) -> Result<async_nats::Client, TransportError> {
        self.client.read().await.clone().ok_or(TransportError::Closed)
    }
}

#[async_trait]
impl BusClient for NatsBusClient {
    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), TransportError> {
        let client = self.handle().await?;
        client
            .publish(topic.to_string(), payload)
            .await
            .map_err(|e| TransportError::Publish {
                topic: topic.to_string(),
                reason: e.to_string(),
            })
    }

    async fn flush(&self) -> Result<(), TransportError> {
        let client = self.handle().await?;
        client
            .flush()
            .await
            .map_err(|e| TransportError::Flush(e.to_string()))
    }

    async fn subscribe(&self, topic: &str) -> Result<BusSubscription, TransportError> {
        let client = self.handle().await?;
        let subscriber = client
            .subscribe(topic.to_string())
            .await
            .map_err(|e| TransportError::Subscribe {
                topic: topic.to_string(),
                reason: e.to_string(),
            })?;

        debug!("subscribed to {topic}");
        let stream = subscriber.map(|msg| BusMessage {
            topic: msg.subject.to_string(),
            payload: msg.payload,
        });
        Ok(Box::pin(stream))
    }

    async fn close(&self) {
        let Some(client) = self.client.write().await.take() else {
            return;
        };

        match timeout(CLOSE_FLUSH_TIMEOUT, client.flush()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("final flush before close failed: {e}"),
            Err(_) => warn!("final flush before close timed out after {CLOSE_FLUSH_TIMEOUT:?}"),
        }

        // Dropping the last client handle lets the connection task finish
        // once the remaining subscribers are gone.
        drop(client);
        info!("NATS connection closed");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
