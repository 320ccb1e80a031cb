//! Optional TOML configuration file.
//!
//! Every field is optional; anything missing falls back to the same default
//! as [`BridgeConfig::default`].  Command-line flags override file values
//! (see `main.rs`).
//!
//! ```toml
//! log_level = "debug"
//!
//! [bus]
//! mode = "nats"              # or "memory"
//! addr = "127.0.0.1:4222"
//! spawn_server = true
//! server_binary = "/usr/local/bin/nats-server"
//! server_verbose = false
//! ready_timeout_ms = 5000
//! connect_timeout_ms = 5000
//! flush_on_publish = true
//! flush_timeout_ms = 2000
//! client_name = "gain-bridge"
//!
//! [ui]
//! bind_addr = "127.0.0.1:24850"
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::config::{BridgeConfig, BusConfig, BusMode};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Schema ────────────────────────────────────────────────────────────────────

/// Top-level file layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub bus: BusSection,
    #[serde(default)]
    pub ui: UiSection,
}

/// `[bus]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusSection {
    #[serde(default)]
    pub mode: BusMode,
    #[serde(default = "default_bus_addr")]
    pub addr: SocketAddr,
    #[serde(default = "default_true")]
    pub spawn_server: bool,
    #[serde(default = "default_server_binary")]
    pub server_binary: PathBuf,
    #[serde(default)]
    pub server_verbose: bool,
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_true")]
    pub flush_on_publish: bool,
    #[serde(default = "default_flush_timeout_ms")]
    pub flush_timeout_ms: u64,
    #[serde(default = "default_client_name")]
    pub client_name: String,
}

/// `[ui]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiSection {
    #[serde(default = "default_ui_bind_addr")]
    pub bind_addr: SocketAddr,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_bus_addr() -> SocketAddr {
    BusConfig::default().addr
}
fn default_server_binary() -> PathBuf {
    BusConfig::default().server_binary
}
fn default_ready_timeout_ms() -> u64 {
    5000
}
fn default_connect_timeout_ms() -> u64 {
    5000
}
fn default_flush_timeout_ms() -> u64 {
    2000
}
fn default_client_name() -> String {
    BusConfig::default().client_name
}
fn default_ui_bind_addr() -> SocketAddr {
    BridgeConfig::default().ui_bind_addr
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            bus: BusSection::default(),
            ui: UiSection::default(),
        }
    }
}

impl Default for BusSection {
    fn default() -> Self {
        Self {
            mode: BusMode::default(),
            addr: default_bus_addr(),
            spawn_server: true,
            server_binary: default_server_binary(),
            server_verbose: false,
            ready_timeout_ms: default_ready_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            flush_on_publish: true,
            flush_timeout_ms: default_flush_timeout_ms(),
            client_name: default_client_name(),
        }
    }
}

impl Default for UiSection {
    fn default() -> Self {
        Self {
            bind_addr: default_ui_bind_addr(),
        }
    }
}

impl FileConfig {
    /// Converts the file layout into runtime configuration.
    pub fn into_bridge_config(self) -> BridgeConfig {
        let bus = self.bus;
        BridgeConfig {
            bus: BusConfig {
                mode: bus.mode,
                addr: bus.addr,
                spawn_server: bus.spawn_server,
                server_binary: bus.server_binary,
                server_verbose: bus.server_verbose,
                ready_timeout: Duration::from_millis(bus.ready_timeout_ms),
                connect_timeout: Duration::from_millis(bus.connect_timeout_ms),
                flush_on_publish: bus.flush_on_publish,
                flush_timeout: Duration::from_millis(bus.flush_timeout_ms),
                client_name: bus.client_name,
            },
            ui_bind_addr: self.ui.bind_addr,
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Parses a configuration file from TOML text.
///
/// # Errors
///
/// [`ConfigError::Parse`] if the TOML is malformed or a value has the wrong
/// type (for example an unparseable address).
pub fn parse_config(content: &str) -> Result<FileConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Loads the configuration file at `path`.
///
/// The file was named explicitly, so a missing file is an error rather than
/// an implicit default.
///
/// # Errors
///
/// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Parse`] if
/// it is not valid.
pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
