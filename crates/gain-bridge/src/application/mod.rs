//! Application layer for gain-bridge.
//!
//! The application layer holds the bridge's behaviour: it knows *what* to do
//! with a knob update or a controller broadcast, but delegates *how* bytes move
//! to the infrastructure layer through the traits in [`ports`].
//!
//! # Responsibilities
//!
//! - Caching the latest gains per loop ([`GainCache`])
//! - Applying controller broadcasts to the cache and notifying the UI
//!   ([`InboundRelay`])
//! - Validating, encoding and publishing knob updates ([`OutboundPublisher`])
//! - Answering UI requests ([`UiService`])
//!
//! # What does NOT belong here?
//!
//! - Opening sockets, spawning the bus server, WebSocket framing
//!   (that is infrastructure)
//! - Choosing NATS or the in-memory bus (that is the lifecycle manager)

pub mod gain_cache;
pub mod inbound_relay;
pub mod outbound_publisher;
pub mod ports;
pub mod ui_service;

pub use gain_cache::GainCache;
pub use inbound_relay::{InboundRelay, RelayCounts, RelayWorker};
pub use outbound_publisher::{FlushPolicy, OutboundPublisher, PublishError};
pub use ports::{BusClient, BusMessage, BusSubscription, EventSink, TransportError};
pub use ui_service::UiService;
