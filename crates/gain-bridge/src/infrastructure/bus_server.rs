//! The `nats-server` child process.
//!
//! The bridge owns the bus: it starts `nats-server` on the configured address
//! and only proceeds once the server is accepting clients.
//!
//! # Readiness
//!
//! A NATS server greets every new TCP connection with a single
//! `INFO {...}\r\n` line before anything else.  [`probe`] connects and waits
//! for that line, which is a stronger signal than "the port is open": it
//! proves the listener belongs to a NATS server that has finished starting.
//!
//! A server that already answers on the address before anything is spawned
//! belongs to someone else, so startup fails instead of adopting it.  A
//! greeting is also only trusted while the spawned child is still alive.
//!
//! ```text
//! probe ──► INFO received ────────────────────► NotReady (address in use)
//!   │
//!   ▼
//! spawn ──► poll ──┬─ INFO received ───────────► Ready
//!             ▲    │   (child exited meanwhile ─► NotReady)
//!             │    ├─ refused / no INFO yet ──► sleep ─┐
//!             │    │                                   │
//!             └────┼───────────────────────────────────┘
//!                  ├─ child exited ───────────► NotReady (kill)
//!                  └─ ready_timeout elapsed ──► NotReady (kill)
//! ```

use std::net::SocketAddr;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::domain::config::BusConfig;

/// Delay between readiness probes.
const PROBE_INTERVAL: Duration = Duration::from_millis(50);

/// How long a single probe waits for the `INFO` line once connected.
const PROBE_READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Upper bound on waiting for the process to exit after it was killed.
const STOP_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum ServerError {
    /// The executable could not be started (not found, not executable, ...).
    #[error("failed to spawn {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// The process started but never accepted clients.
    #[error("bus server on {addr} did not become ready: {reason}")]
    NotReady { addr: SocketAddr, reason: String },
}

/// A running `nats-server` process.
///
/// The process is killed when this value is dropped, so a panic or an early
/// return never leaves an orphaned server holding the port.
pub struct NatsServerProcess {
    child: Option<Child>,
    addr: SocketAddr,
}

impl NatsServerProcess {
    /// Spawns the server and waits until it is ready.
    ///
    /// # Errors
    ///
    /// - [`ServerError::Spawn`] if the executable cannot be started.
    /// - [`ServerError::NotReady`] if another server already answers on
    ///   `config.addr`, or if the spawned process exits or stays silent for
    ///   longer than `config.ready_timeout`.  The process has been killed by
    ///   then.
    pub async fn start(config: &BusConfig) -> Result<Self, ServerError> {
        if probe(config.addr, PROBE_READ_TIMEOUT).await.is_ok() {
            return Err(ServerError::NotReady {
                addr: config.addr,
                reason: "address already in use by another server".to_string(),
            });
        }

        let binary = config.server_binary.display().to_string();
        let mut cmd = Command::new(&config.server_binary);
        cmd.arg("-a")
            .arg(config.addr.ip().to_string())
            .arg("-p")
            .arg(config.addr.port().to_string())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        if config.server_verbose {
            cmd.arg("-DV").stdout(Stdio::inherit()).stderr(Stdio::inherit());
        } else {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }

        let child = cmd.spawn().map_err(|source| ServerError::Spawn {
            binary: binary.clone(),
            source,
        })?;
        info!("spawned {binary} (pid {:?}) on {}", child.id(), config.addr);

        let mut server = Self {
            child: Some(child),
            addr: config.addr,
        };

        if let Err(reason) = server.wait_ready(config.ready_timeout).await {
            server.stop().await;
            return Err(ServerError::NotReady {
                addr: config.addr,
                reason,
            });
        }

        info!("bus server ready on {}", config.addr);
        Ok(server)
    }

    /// Polls until the server answers, exits, or `limit` elapses.
    async fn wait_ready(&mut self, limit: Duration) -> Result<(), String> {
        let deadline = Instant::now() + limit;

        loop {
            if let Some(child) = self.child.as_mut() {
                match child.try_wait() {
                    Ok(Some(status)) => return Err(format!("process exited early ({status})")),
                    Ok(None) => {}
                    Err(e) => return Err(format!("failed to poll process: {e}")),
                }
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(format!("no INFO greeting within {limit:?}"));
            }

            match probe(self.addr, remaining.min(PROBE_READ_TIMEOUT)).await {
                Ok(()) => return self.ensure_alive(),
                Err(e) => debug!("readiness probe on {}: {e}", self.addr),
            }

            sleep(PROBE_INTERVAL.min(deadline.saturating_duration_since(Instant::now()))).await;
        }
    }

    /// Fails if the child has exited, in which case a greeting came from
    /// some other listener.
    fn ensure_alive(&mut self) -> Result<(), String> {
        let Some(child) = self.child.as_mut() else {
            return Err("process already stopped".to_string());
        };
        match child.try_wait() {
            Ok(None) => Ok(()),
            Ok(Some(status)) => Err(format!(
                "process exited ({status}) while another listener answered"
            )),
            Err(e) => Err(format!("failed to poll process: {e}")),
        }
    }

    /// Kills the process and waits briefly for it to exit.
    ///
    /// Safe to call more than once; later calls do nothing.
    pub async fn stop(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        if let Ok(Some(status)) = child.try_wait() {
            debug!("bus server already exited ({status})");
            return;
        }

        match timeout(STOP_TIMEOUT, child.kill()).await {
            Ok(Ok(())) => info!("bus server on {} stopped", self.addr),
            Ok(Err(e)) => warn!("failed to kill bus server on {}: {e}", self.addr),
            Err(_) => warn!("bus server on {} did not exit within {STOP_TIMEOUT:?}", self.addr),
        }
    }
}

/// Connects to `addr` and waits up to `read_limit` for a NATS `INFO` line.
///
/// # Errors
///
/// A short human-readable reason: connection refused, timeout, or an
/// unexpected greeting.
pub async fn probe(addr: SocketAddr, read_limit: Duration) -> Result<(), String> {
    let stream = timeout(read_limit, TcpStream::connect(addr))
        .await
        .map_err(|_| "connect timed out".to_string())?
        .map_err(|e| e.to_string())?;

    let mut line = String::new();
    let mut reader = BufReader::new(stream);
    let n = timeout(read_limit, reader.read_line(&mut line))
        .await
        .map_err(|_| "no greeting".to_string())?
        .map_err(|e| e.to_string())?;

    if n == 0 {
        return Err("connection closed before greeting".to_string());
    }
    if line.starts_with("INFO ") {
        Ok(())
    } else {
        Err(format!("unexpected greeting: {:?}", line.trim_end()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
