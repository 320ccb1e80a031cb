//! Bridge configuration types.
//!
//! [`BridgeConfig`] is the single source of truth for all runtime settings.
//! It is built from CLI arguments layered over an optional TOML file (see
//! `infrastructure::config_file`), or from [`Default`] in tests.
//!
//! The bus address is plain configuration: nothing in the lifecycle manager
//! assumes a particular host or port.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which transport the bridge talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusMode {
    /// A NATS server (spawned by the bridge or already running).
    #[default]
    Nats,
    /// An in-process bus; useful for UI development without a controller.
    Memory,
}

impl FromStr for BusMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nats" => Ok(BusMode::Nats),
            "memory" => Ok(BusMode::Memory),
            other => Err(format!("unknown bus mode '{other}' (expected 'nats' or 'memory')")),
        }
    }
}

/// Settings for the message bus and its server process.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Transport selection.
    pub mode: BusMode,

    /// Address the bus server listens on and the client connects to.
    pub addr: SocketAddr,

    /// Whether the bridge starts the bus server itself.
    ///
    /// Set to `false` when a NATS server is already running (for example one
    /// shared with the controller on another machine).
    pub spawn_server: bool,

    /// Path or name of the `nats-server` executable.
    pub server_binary: PathBuf,

    /// Pass `-DV` (debug + protocol trace) to the server.
    pub server_verbose: bool,

    /// Maximum time to wait for the spawned server to accept clients.
    pub ready_timeout: Duration,

    /// Maximum time to wait for the client connection.
    pub connect_timeout: Duration,

    /// Flush the client after every publish so the knob value is on the wire
    /// before the UI is told it succeeded.
    pub flush_on_publish: bool,

    /// Upper bound on a single flush.
    pub flush_timeout: Duration,

    /// Connection name reported to the server (visible in `nats-top`).
    pub client_name: String,
}

impl Default for BusConfig {
    /// | Field            | Default            |
    /// |------------------|--------------------|
    /// | mode             | `Nats`             |
    /// | addr             | `127.0.0.1:4222`   |
    /// | spawn_server     | `true`             |
    /// | server_binary    | `nats-server`      |
    /// | server_verbose   | `false`            |
    /// | ready_timeout    | 5 seconds          |
    /// | connect_timeout  | 5 seconds          |
    /// | flush_on_publish | `true`             |
    /// | flush_timeout    | 2 seconds          |
    /// | client_name      | `gain-bridge`      |
    fn default() -> Self {
        Self {
            mode: BusMode::Nats,
            addr: SocketAddr::from(([127, 0, 0, 1], 4222)),
            spawn_server: true,
            server_binary: PathBuf::from("nats-server"),
            server_verbose: false,
            ready_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(5),
            flush_on_publish: true,
            flush_timeout: Duration::from_secs(2),
            client_name: "gain-bridge".to_string(),
        }
    }
}

impl BusConfig {
    /// The `nats://` URL for [`Self::addr`].
    pub fn url(&self) -> String {
        format!("nats://{}", self.addr)
    }
}

/// All runtime configuration for the bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Message bus settings.
    pub bus: BusConfig,

    /// Address the UI WebSocket server binds to.
    ///
    /// Defaults to loopback: the UI and the bridge are a trusted local pair.
    pub ui_bind_addr: SocketAddr,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bus: BusConfig::default(),
            ui_bind_addr: SocketAddr::from(([127, 0, 0, 1], 24850)),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
