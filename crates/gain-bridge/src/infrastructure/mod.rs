//! Infrastructure layer for gain-bridge.
//!
//! The infrastructure layer handles all I/O: the bus server process, the bus
//! connection, and the UI WebSocket surface.
//!
//! # Responsibilities
//!
//! - Spawning `nats-server` and probing it until it accepts clients
//! - Implementing the `BusClient` port over NATS and over in-process channels
//! - Starting and stopping the relays in the right order
//! - Fanning UI notifications out to WebSocket sessions
//! - Accepting UI WebSocket connections
//! - Reading the optional TOML configuration file
//!
//! # What does NOT belong here?
//!
//! - Knob validation, payload encoding, caching (that is the application
//!   layer and `gain-core`)
//! - Message type definitions (that is the domain layer)

pub mod bus_server;
pub mod config_file;
pub mod event_sink;
pub mod lifecycle;
pub mod memory_bus;
pub mod nats_client;
pub mod ws_server;

pub use bus_server::{NatsServerProcess, ServerError};
pub use config_file::{load_config, ConfigError, FileConfig};
pub use event_sink::BroadcastEventSink;
pub use lifecycle::{BusLifecycle, RunningBridge, StartupError};
pub use memory_bus::InMemoryBus;
pub use nats_client::NatsBusClient;
pub use ws_server::run_server;
