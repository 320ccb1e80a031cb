//! In-process [`BusClient`] built on tokio broadcast channels.
//!
//! Used by `--bus memory` (UI work without a controller) and by the tests.
//! Semantics follow core NATS closely enough for the bridge:
//!
//! - a publish with no subscribers succeeds and the message is lost;
//! - every subscriber on a topic receives every message published after it
//!   subscribed;
//! - after [`BusClient::close`] publishes fail with
//!   [`TransportError::Closed`] and every subscription stream ends.
//!
//! Topics are matched exactly; wildcards are not supported.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};

use crate::application::ports::{BusClient, BusMessage, BusSubscription, TransportError};

/// Per-topic buffer.  A subscriber more than this many messages behind skips
/// ahead and logs how many it missed.
const TOPIC_CAPACITY: usize = 64;

/// Topic map of broadcast senders.
#[derive(Debug, Default)]
pub struct InMemoryBus {
    topics: RwLock<HashMap<String, broadcast::Sender<BusMessage>>>,
    closed: AtomicBool,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    async fn sender_for(&self, topic: &str) -> broadcast::Sender<BusMessage> {
        let mut topics = self.topics.write().await;
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .clone()
    }

    fn ensure_open(&self) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            Err(TransportError::Closed)
        } else {
            Ok(())
        }
    }

    /// Number of live subscriptions on `topic`.
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .await
            .get(topic)
            .map_or(0, |tx| tx.receiver_count())
    }
}

#[async_trait]
impl BusClient for InMemoryBus {
    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), TransportError> {
        self.ensure_open()?;
        let sender = self.sender_for(topic).await;
        let msg = BusMessage {
            topic: topic.to_string(),
            payload,
        };
        // `send` only fails when nobody is listening, which is not an error
        // on a pub/sub bus.
        if sender.send(msg).is_err() {
            debug!("no subscribers on {topic}; message dropped");
        }
        Ok(())
    }

    async fn flush(&self) -> Result<(), TransportError> {
        self.ensure_open()
    }

    async fn subscribe(&self, topic: &str) -> Result<BusSubscription, TransportError> {
        self.ensure_open()?;
        let rx = self.sender_for(topic).await.subscribe();
        let topic = topic.to_string();

        let stream = futures_util::stream::unfold((rx, topic), |(mut rx, topic)| async move {
            loop {
                match rx.recv().await {
                    Ok(msg) => return Some((msg, (rx, topic))),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("subscriber on {topic} lagged; skipped {n} messages");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });
        Ok(Box::pin(stream))
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        // Dropping every sender ends every subscription stream.
        self.topics.write().await.clear();
        debug!("in-memory bus closed");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures_util::StreamExt;

    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_published_message() {
        // Arrange
        let bus = InMemoryBus::new();
        let mut sub = bus.subscribe("pid.gains.pos").await.unwrap();

        // Act
        bus.publish("pid.gains.pos", Bytes::from_static(b"1.5"))
            .await
            .unwrap();

        // Assert
        let msg = sub.next().await.unwrap();
        assert_eq!(msg.topic, "pid.gains.pos");
        assert_eq!(msg.payload, Bytes::from_static(b"1.5"));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let bus = InMemoryBus::new();
        assert!(bus
            .publish("pid.gains.att.p.x", Bytes::from_static(b"0"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_topics_are_matched_exactly() {
        // Arrange
        let bus = InMemoryBus::new();
        let mut pos = bus.subscribe("pid.gains.pos").await.unwrap();

        // Act: publish on a different topic, then on the subscribed one.
        bus.publish("pid.gains.att", Bytes::from_static(b"att"))
            .await
            .unwrap();
        bus.publish("pid.gains.pos", Bytes::from_static(b"pos"))
            .await
            .unwrap();

        // Assert: the first message seen is the one for our topic.
        assert_eq!(pos.next().await.unwrap().payload, Bytes::from_static(b"pos"));
    }

    #[tokio::test]
    async fn test_every_subscriber_gets_a_copy() {
        let bus = InMemoryBus::new();
        let mut a = bus.subscribe("t").await.unwrap();
        let mut b = bus.subscribe("t").await.unwrap();
        assert_eq!(bus.subscriber_count("t").await, 2);

        bus.publish("t", Bytes::from_static(b"x")).await.unwrap();

        assert_eq!(a.next().await.unwrap().payload, Bytes::from_static(b"x"));
        assert_eq!(b.next().await.unwrap().payload, Bytes::from_static(b"x"));
    }

    #[tokio::test]
    async fn test_close_ends_streams_and_rejects_publish() {
        // Arrange
        let bus = InMemoryBus::new();
        let mut sub = bus.subscribe("t").await.unwrap();

        // Act
        bus.close().await;
        bus.close().await;

        // Assert
        let next = tokio::time::timeout(Duration::from_secs(1), sub.next())
            .await
            .expect("stream must end promptly after close");
        assert!(next.is_none());
        assert!(matches!(
            bus.publish("t", Bytes::new()).await,
            Err(TransportError::Closed)
        ));
        assert!(matches!(bus.flush().await, Err(TransportError::Closed)));
        assert!(bus.subscribe("t").await.is_err());
    }
}
