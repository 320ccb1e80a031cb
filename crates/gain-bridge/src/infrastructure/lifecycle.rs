//! Startup and shutdown of the bus server, the client and the relays.
//!
//! # Startup order
//!
//! ```text
//! 1. bus server   (NATS mode with spawn_server; waits for readiness)
//! 2. bus client   (connect, bounded by connect_timeout)
//! 3. relays       (subscribe to pid.gains.pos and pid.gains.att,
//!                  one worker task each)
//! ```
//!
//! If any step fails, everything already created is torn down before the
//! error is returned: a failed start never leaves a server process or a
//! half-subscribed client behind.
//!
//! # Shutdown order
//!
//! The reverse: stop the relay workers, close the client, stop the server.
//! Each step tolerates resources that are absent or already closed, and
//! [`RunningBridge::shutdown`] may be called any number of times.

use std::net::SocketAddr;
use std::sync::Arc;

use gain_core::{broadcast_topic, AxisGroup};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::gain_cache::GainCache;
use crate::application::inbound_relay::{InboundRelay, RelayCounts, RelayWorker};
use crate::application::outbound_publisher::{FlushPolicy, OutboundPublisher};
use crate::application::ports::{BusClient, EventSink, TransportError};
use crate::application::ui_service::UiService;
use crate::domain::config::{BusConfig, BusMode};
use crate::infrastructure::bus_server::{NatsServerProcess, ServerError};
use crate::infrastructure::memory_bus::InMemoryBus;
use crate::infrastructure::nats_client::NatsBusClient;

/// Why the bridge could not start.  All variants are fatal.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to spawn bus server {binary}: {source}")]
    ServerSpawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("bus server on {addr} did not become ready: {reason}")]
    ServerNotReady { addr: SocketAddr, reason: String },

    #[error("failed to connect to bus: {0}")]
    Connect(#[source] TransportError),

    #[error("failed to subscribe to broadcasts: {0}")]
    Subscribe(#[source] TransportError),
}

impl From<ServerError> for StartupError {
    fn from(e: ServerError) -> Self {
        match e {
            ServerError::Spawn { binary, source } => StartupError::ServerSpawn { binary, source },
            ServerError::NotReady { addr, reason } => StartupError::ServerNotReady { addr, reason },
        }
    }
}

/// Builds a [`RunningBridge`] from configuration.
pub struct BusLifecycle;

impl BusLifecycle {
    /// Starts the bus (server and client, per `config.mode`) and both relays.
    ///
    /// # Errors
    ///
    /// See [`StartupError`].  Partial state has been cleaned up by the time
    /// the error is returned.
    pub async fn start(
        config: &BusConfig,
        cache: Arc<GainCache>,
        sink: Arc<dyn EventSink>,
    ) -> Result<RunningBridge, StartupError> {
        match config.mode {
            BusMode::Memory => {
                info!("using in-process bus (no controller will be reachable)");
                Self::attach(config, Arc::new(InMemoryBus::new()), None, cache, sink).await
            }
            BusMode::Nats => {
                let mut server = if config.spawn_server {
                    Some(NatsServerProcess::start(config).await?)
                } else {
                    debug!("using an externally managed bus server at {}", config.addr);
                    None
                };

                let connected =
                    NatsBusClient::connect(&config.url(), &config.client_name, config.connect_timeout)
                        .await;

                match connected {
                    Ok(client) => Self::attach(config, Arc::new(client), server, cache, sink).await,
                    Err(e) => {
                        if let Some(server) = server.as_mut() {
                            server.stop().await;
                        }
                        Err(StartupError::Connect(e))
                    }
                }
            }
        }
    }

    /// Subscribes both relays on an already connected `bus`.
    ///
    /// `server`, if any, is owned by the returned bridge and stopped on
    /// shutdown.  On failure `bus` is closed and `server` stopped.
    ///
    /// # Errors
    ///
    /// [`StartupError::Subscribe`] if either subscription is refused.
    pub async fn attach(
        config: &BusConfig,
        bus: Arc<dyn BusClient>,
        server: Option<NatsServerProcess>,
        cache: Arc<GainCache>,
        sink: Arc<dyn EventSink>,
    ) -> Result<RunningBridge, StartupError> {
        let flush = if config.flush_on_publish {
            FlushPolicy::Bounded(config.flush_timeout)
        } else {
            FlushPolicy::Never
        };
        let publisher = Arc::new(OutboundPublisher::new(Arc::clone(&bus), flush));
        let relay = InboundRelay::new(Arc::clone(&cache), sink);

        let mut bridge = RunningBridge {
            cache,
            publisher,
            bus: Some(Arc::clone(&bus)),
            server,
            workers: Vec::with_capacity(AxisGroup::ALL.len()),
        };

        for group in AxisGroup::ALL {
            let topic = broadcast_topic(group);
            match bus.subscribe(&topic).await {
                Ok(subscription) => {
                    info!("relaying {topic} to update:{group}");
                    bridge.workers.push(relay.spawn(group, subscription));
                }
                Err(e) => {
                    warn!("failed to subscribe to {topic}: {e}");
                    bridge.shutdown().await;
                    return Err(StartupError::Subscribe(e));
                }
            }
        }

        Ok(bridge)
    }
}

/// A started bridge: cache, publisher, connection, relays and (optionally)
/// the server process.
pub struct RunningBridge {
    cache: Arc<GainCache>,
    publisher: Arc<OutboundPublisher>,
    bus: Option<Arc<dyn BusClient>>,
    server: Option<NatsServerProcess>,
    workers: Vec<RelayWorker>,
}

impl RunningBridge {
    pub fn cache(&self) -> &Arc<GainCache> {
        &self.cache
    }

    pub fn publisher(&self) -> &Arc<OutboundPublisher> {
        &self.publisher
    }

    /// Request handler for UI sessions, wired to this bridge's publisher and
    /// cache.
    pub fn ui_service(&self) -> UiService {
        UiService::new(Arc::clone(&self.publisher), Arc::clone(&self.cache))
    }

    /// Counters of each live relay worker.
    pub fn relay_counts(&self) -> Vec<(AxisGroup, RelayCounts)> {
        self.workers.iter().map(|w| (w.group(), w.counts())).collect()
    }

    /// `true` until [`Self::shutdown`] has run.
    pub fn is_running(&self) -> bool {
        self.bus.is_some()
    }

    /// Stops the relays, closes the client and stops the server.
    pub async fn shutdown(&mut self) {
        if self.bus.is_none() && self.server.is_none() && self.workers.is_empty() {
            return;
        }
        info!("shutting down bus bridge");

        for worker in self.workers.drain(..) {
            worker.abort();
            worker.join().await;
        }

        if let Some(bus) = self.bus.take() {
            bus.close().await;
        }

        if let Some(mut server) = self.server.take() {
            server.stop().await;
        }

        info!("bus bridge stopped");
    }
}

impl Drop for RunningBridge {
    fn drop(&mut self) {
        // The server child is killed by its own drop; workers would keep
        // running on a closed subscription, so stop them here.
        for worker in &self.workers {
            worker.abort();
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
