//! PID gain bridge: entry point.
//!
//! This binary keeps a PID tuning UI and a real-time controller in sync:
//!
//! - knob moves from the UI are validated and published on
//!   `pid.gains.<group>.<term>.<axis>`;
//! - gain broadcasts from the controller on `pid.gains.pos` /
//!   `pid.gains.att` are cached and pushed to the UI as `update:<group>`.
//!
//! # Usage
//!
//! ```text
//! gain-bridge [OPTIONS]
//!
//! Options:
//!   --config <FILE>            TOML configuration file
//!   --bus <MODE>               nats | memory [default: nats]
//!   --bus-addr <ADDR>          Bus server address [default: 127.0.0.1:4222]
//!   --no-spawn-server          Connect to an already running nats-server
//!   --server-binary <PATH>     nats-server executable [default: nats-server]
//!   --server-verbose           Pass -DV to nats-server
//!   --ui-bind <ADDR>           UI WebSocket address [default: 127.0.0.1:24850]
//!   --no-flush                 Do not flush after each publish
//!   --flush-timeout-ms <MS>    Flush bound [default: 2000]
//!   --ready-timeout-ms <MS>    Server readiness bound [default: 5000]
//!   --connect-timeout-ms <MS>  Client connect bound [default: 5000]
//! ```
//!
//! # Precedence
//!
//! Command line (or its environment variable) beats the config file, which
//! beats the built-in default.
//!
//! | Variable        | Flag          |
//! |-----------------|---------------|
//! | `GAIN_CONFIG`   | `--config`    |
//! | `GAIN_BUS_ADDR` | `--bus-addr`  |
//! | `GAIN_UI_BIND`  | `--ui-bind`   |
//!
//! # Architecture overview
//!
//! ```text
//! Tuning UI  (JSON over WebSocket)
//!       ↕
//! gain-bridge  ← this process
//!   domain/          BridgeConfig, UI JSON messages
//!   application/     GainCache, InboundRelay, OutboundPublisher, UiService
//!   infrastructure/  nats-server child, NATS client, lifecycle, ws_server
//!       ↕
//! NATS  ↔  controller
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use gain_bridge::application::GainCache;
use gain_bridge::domain::{BridgeConfig, BusMode};
use gain_bridge::infrastructure::{
    load_config, run_server, BroadcastEventSink, BusLifecycle, FileConfig,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Bridge between a PID tuning UI and a controller over NATS.
///
/// Optional values left unset fall back to the config file, then to the
/// built-in defaults.
#[derive(Debug, Parser)]
#[command(
    name = "gain-bridge",
    about = "Keeps a PID tuning UI and a controller in sync over NATS",
    version
)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, env = "GAIN_CONFIG")]
    config: Option<PathBuf>,

    /// Bus transport: `nats`, or `memory` for UI work without a controller.
    #[arg(long)]
    bus: Option<BusMode>,

    /// Address of the bus server (spawned or external).
    #[arg(long, env = "GAIN_BUS_ADDR")]
    bus_addr: Option<SocketAddr>,

    /// Do not start nats-server; connect to one that is already running.
    #[arg(long)]
    no_spawn_server: bool,

    /// Path or name of the nats-server executable.
    #[arg(long)]
    server_binary: Option<PathBuf>,

    /// Let nats-server log debug and protocol trace output.
    #[arg(long)]
    server_verbose: bool,

    /// Address for the UI WebSocket server.
    #[arg(long, env = "GAIN_UI_BIND")]
    ui_bind: Option<SocketAddr>,

    /// Do not flush the bus connection after each knob publish.
    #[arg(long)]
    no_flush: bool,

    /// Upper bound on one flush, in milliseconds.
    #[arg(long)]
    flush_timeout_ms: Option<u64>,

    /// Upper bound on waiting for nats-server to accept clients, in milliseconds.
    #[arg(long)]
    ready_timeout_ms: Option<u64>,

    /// Upper bound on connecting to the bus, in milliseconds.
    #[arg(long)]
    connect_timeout_ms: Option<u64>,
}

impl Cli {
    /// Layers the command-line values over `file`.
    fn into_bridge_config(self, file: FileConfig) -> BridgeConfig {
        let mut config = file.into_bridge_config();
        let bus = &mut config.bus;

        if let Some(mode) = self.bus {
            bus.mode = mode;
        }
        if let Some(addr) = self.bus_addr {
            bus.addr = addr;
        }
        if self.no_spawn_server {
            bus.spawn_server = false;
        }
        if let Some(binary) = self.server_binary {
            bus.server_binary = binary;
        }
        if self.server_verbose {
            bus.server_verbose = true;
        }
        if self.no_flush {
            bus.flush_on_publish = false;
        }
        if let Some(ms) = self.flush_timeout_ms {
            bus.flush_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.ready_timeout_ms {
            bus.ready_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.connect_timeout_ms {
            bus.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(addr) = self.ui_bind {
            config.ui_bind_addr = addr;
        }
        config
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// # What happens at startup
///
/// 1. CLI arguments are parsed and the config file (if any) is loaded.
/// 2. Logging is initialised from `RUST_LOG`, else the file's `log_level`.
/// 3. The bus is started: nats-server, client connection, both relays.
/// 4. A Ctrl+C handler clears the shared `running` flag.
/// 5. The UI WebSocket server runs until the flag is cleared.
/// 6. The bus is shut down in reverse order.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config file {}", path.display()))?,
        None => FileConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&file.log_level)),
        )
        .init();

    let config = cli.into_bridge_config(file);

    info!(
        "gain bridge starting: bus={:?} at {}, ui={}",
        config.bus.mode, config.bus.addr, config.ui_bind_addr
    );

    // ── Bus startup ───────────────────────────────────────────────────────────
    let events = BroadcastEventSink::new();
    let mut bridge = BusLifecycle::start(
        &config.bus,
        Arc::new(GainCache::new()),
        Arc::new(events.clone()),
    )
    .await
    .map_err(|e| {
        error!("bus startup failed: {e}");
        e
    })?;

    // ── Graceful shutdown flag ────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C; initiating graceful shutdown");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    // ── UI server loop ────────────────────────────────────────────────────────
    let served = run_server(config.ui_bind_addr, bridge.ui_service(), events, running).await;

    bridge.shutdown().await;
    served?;

    info!("gain bridge stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
