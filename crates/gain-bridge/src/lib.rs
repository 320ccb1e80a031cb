//! gain-bridge library crate.
//!
//! This crate keeps a PID tuning UI and a real-time controller in sync over a
//! NATS publish/subscribe bus.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Tuning UI (JSON over WebSocket)
//!         ↕
//! [gain-bridge]
//!   ├── domain/            Pure types: BridgeConfig, UI JSON messages
//!   ├── application/       GainCache, InboundRelay, OutboundPublisher,
//!   │                      UI request handling, BusClient/EventSink ports
//!   └── infrastructure/
//!         ├── nats_client/  BusClient over async-nats
//!         ├── memory_bus/   BusClient over tokio channels (tests, offline)
//!         ├── bus_server/   nats-server child process + readiness probe
//!         ├── lifecycle/    Startup/shutdown of server, client, relays
//!         ├── event_sink/   Fan-out of UI notifications
//!         ├── ws_server/    UI WebSocket accept loop
//!         └── config_file/  Optional TOML configuration
//!         ↕
//! NATS bus  ↔  controller process
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain`, `gain-core`, and the port traits it
//!   defines; it never names a concrete transport.
//! - `infrastructure` implements the ports and owns every socket, task and
//!   child process.

/// Domain layer: configuration and UI message types (no I/O).
pub mod domain;

/// Application layer: cache, relay, publisher and UI request handling.
pub mod application;

/// Infrastructure layer: bus client/server, lifecycle, UI WebSocket server.
pub mod infrastructure;
