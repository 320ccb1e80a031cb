//! Inbound relay: controller broadcasts → gain cache → UI notification.
//!
//! One worker task runs per loop subscription.  Each worker cycles through
//!
//! ```text
//! Idle ─spawn─► Awaiting-Message ─msg─► Decoding ─┬─ok──► Cache-Updated ──┐
//!                     ▲                           └─err─► Decode-Failed ──┤
//!                     └───────────────────────────────────────────────────┘
//! ```
//!
//! A malformed broadcast is logged and dropped; the cached value stays as it
//! was and the worker keeps listening.  A worker only ends when its
//! subscription stream ends (the bus was closed) or when it is aborted.
//!
//! Workers are independent tasks.  The position worker never waits on the
//! attitude worker, and neither waits on the UI: [`EventSink::emit`] is
//! non-blocking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::StreamExt;
use gain_core::{decode_gain_vector, AxisGroup, DecodeError, GainVector};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::gain_cache::GainCache;
use crate::application::ports::{BusMessage, BusSubscription, EventSink};
use crate::domain::messages::UiEvent;

// ── Counters ──────────────────────────────────────────────────────────────────

/// Per-worker message counters.
#[derive(Debug, Default)]
struct RelayStats {
    received: AtomicU64,
    applied: AtomicU64,
    rejected: AtomicU64,
}

/// A point-in-time copy of a worker's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayCounts {
    /// Messages taken off the subscription.
    pub received: u64,
    /// Messages decoded and written to the cache.
    pub applied: u64,
    /// Messages dropped because they failed to decode.
    pub rejected: u64,
}

impl RelayStats {
    fn counts(&self) -> RelayCounts {
        RelayCounts {
            received: self.received.load(Ordering::Relaxed),
            applied: self.applied.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

// ── Relay ─────────────────────────────────────────────────────────────────────

/// Applies decoded broadcasts to the cache and notifies the UI.
#[derive(Clone)]
pub struct InboundRelay {
    cache: Arc<GainCache>,
    sink: Arc<dyn EventSink>,
}

impl InboundRelay {
    pub fn new(cache: Arc<GainCache>, sink: Arc<dyn EventSink>) -> Self {
        Self { cache, sink }
    }

    /// Handles one broadcast payload for `group`.
    ///
    /// On success the cache slot is replaced and exactly one
    /// `update:<group>` event is emitted.  On failure nothing changes.
    ///
    /// # Errors
    ///
    /// Returns the [`DecodeError`] so the caller can log and count it.  It is
    /// never fatal to the subscription.
    pub async fn apply(&self, group: AxisGroup, payload: &[u8]) -> Result<GainVector, DecodeError> {
        let gains = decode_gain_vector(payload)?;
        self.cache.replace(group, gains).await;
        self.sink.emit(UiEvent::gains_updated(group, gains));
        Ok(gains)
    }

    /// Spawns the worker that drains `subscription` into the cache.
    pub fn spawn(&self, group: AxisGroup, subscription: BusSubscription) -> RelayWorker {
        let stats = Arc::new(RelayStats::default());
        let relay = self.clone();
        let worker_stats = Arc::clone(&stats);

        let handle = tokio::spawn(async move {
            relay.run(group, subscription, &worker_stats).await;
        });

        RelayWorker {
            group,
            handle,
            stats,
        }
    }

    async fn run(&self, group: AxisGroup, mut subscription: BusSubscription, stats: &RelayStats) {
        debug!("relay[{group}]: awaiting broadcasts");

        while let Some(BusMessage { topic, payload }) = subscription.next().await {
            stats.received.fetch_add(1, Ordering::Relaxed);

            match self.apply(group, &payload).await {
                Ok(gains) => {
                    stats.applied.fetch_add(1, Ordering::Relaxed);
                    info!("updated {group} gains: {gains:?}");
                }
                Err(e) => {
                    stats.rejected.fetch_add(1, Ordering::Relaxed);
                    warn!("failed to decode {topic} broadcast ({} bytes): {e}", payload.len());
                }
            }
        }

        debug!("relay[{group}]: subscription ended");
    }
}

// ── Worker handle ─────────────────────────────────────────────────────────────

/// Handle to a running relay worker.
///
/// Dropping the handle does not stop the worker; call [`RelayWorker::abort`].
#[derive(Debug)]
pub struct RelayWorker {
    group: AxisGroup,
    handle: JoinHandle<()>,
    stats: Arc<RelayStats>,
}

impl RelayWorker {
    pub fn group(&self) -> AxisGroup {
        self.group
    }

    pub fn counts(&self) -> RelayCounts {
        self.stats.counts()
    }

    /// `true` once the subscription has ended or the task was aborted.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stops the worker.  Has no effect if it already finished.
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Waits for the worker to end (after its subscription closes).
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            if !e.is_cancelled() {
                warn!("relay[{}] worker panicked: {e}", self.group);
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
