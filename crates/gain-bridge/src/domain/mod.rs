//! Domain layer for gain-bridge.
//!
//! The domain layer contains pure types with no dependencies on I/O,
//! networking, or async runtimes.
//!
//! # What belongs in the domain layer?
//!
//! - Configuration structures
//! - Message types (the JSON "language" between the UI and the bridge)
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, `async_nats`, or `WebSocket` types
//! - File I/O or environment variable reading

pub mod config;
pub mod messages;

pub use config::{BridgeConfig, BusConfig, BusMode};
pub use messages::{BridgeToUiMsg, GainsSnapshot, UiEvent, UiToBridgeMsg};
