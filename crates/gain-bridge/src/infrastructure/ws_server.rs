//! UI WebSocket server: accept loop and per-session task management.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured UI address.
//! 2. Accepting incoming connections from the tuning UI.
//! 3. Upgrading each connection to a WebSocket session.
//! 4. Running two concurrent tasks per session:
//!    - **Requests**: reads JSON frames, hands them to [`UiService`], writes
//!      exactly one reply per request.
//!    - **Events**: forwards every `update:<group>` notification to the UI.
//! 5. Stopping the accept loop when the `running` flag is cleared.
//!
//! Every session shares the same [`UiService`] and receives every event.
//! Sessions are not arbitrated against each other.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Mutex};
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
    WebSocketStream,
};
use tracing::{debug, error, info, warn};

use crate::application::ui_service::UiService;
use crate::domain::messages::{BridgeToUiMsg, UiEvent};
use crate::infrastructure::event_sink::BroadcastEventSink;

type WsSink = SplitSink<WebSocketStream<TcpStream>, WsMessage>;

/// How often the accept loop re-checks the `running` flag when idle.
const ACCEPT_POLL: Duration = Duration::from_millis(200);

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds `bind_addr` and serves UI sessions until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound (port in use, no
/// permission).
pub async fn run_server(
    bind_addr: SocketAddr,
    service: UiService,
    events: BroadcastEventSink,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind UI WebSocket listener on {bind_addr}"))?;

    info!("UI WebSocket server listening on {bind_addr}");
    serve(listener, service, events, running).await;
    Ok(())
}

/// Runs the accept loop on an already bound listener.
pub async fn serve(
    listener: TcpListener,
    service: UiService,
    events: BroadcastEventSink,
    running: Arc<AtomicBool>,
) {
    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping UI accept loop");
            break;
        }

        match timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                info!("new UI connection from {peer_addr}");
                // Subscribe before the handshake so no event emitted while
                // the session starts up is missed.
                let rx = events.subscribe();
                let service = service.clone();
                tokio::spawn(async move {
                    handle_ui_session(stream, peer_addr, service, rx).await;
                });
            }
            Ok(Err(e)) => error!("accept error: {e}"),
            Err(_) => {}
        }
    }
}

// ── Per-session handler ───────────────────────────────────────────────────────

async fn handle_ui_session(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    service: UiService,
    events: broadcast::Receiver<UiEvent>,
) {
    match run_session(raw_stream, peer_addr, service, events).await {
        Ok(()) => info!("UI session {peer_addr} closed"),
        Err(e) => warn!("UI session {peer_addr} closed with error: {e:#}"),
    }
}

async fn run_session(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    service: UiService,
    mut events: broadcast::Receiver<UiEvent>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(raw_stream)
        .await
        .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;

    debug!("UI session established: {peer_addr}");

    let (ws_tx, mut ws_rx) = ws_stream.split();
    let ws_tx = Arc::new(Mutex::new(ws_tx));

    // ── Task A: UI requests ───────────────────────────────────────────────────
    let ws_tx_req = Arc::clone(&ws_tx);
    let mut requests_task = tokio::spawn(async move {
        loop {
            let frame = match ws_rx.next().await {
                Some(Ok(frame)) => frame,
                Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) | None => {
                    debug!("session {peer_addr}: UI stream ended");
                    break;
                }
                Some(Err(e)) => {
                    warn!("session {peer_addr}: WebSocket error: {e}");
                    break;
                }
            };

            let reply = match frame {
                WsMessage::Text(text) => service.handle_text(&text).await,
                WsMessage::Binary(_) => BridgeToUiMsg::Error {
                    description: "binary frames are not supported".to_string(),
                },
                WsMessage::Close(_) => {
                    debug!("session {peer_addr}: Close frame received");
                    break;
                }
                WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => continue,
            };

            if !send_json(&ws_tx_req, &reply).await {
                debug!("session {peer_addr}: reply failed (UI disconnected)");
                break;
            }
        }
    });

    // ── Task B: cache notifications ───────────────────────────────────────────
    let ws_tx_evt = Arc::clone(&ws_tx);
    let mut events_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if !send_json(&ws_tx_evt, &BridgeToUiMsg::from(event)).await {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("session {peer_addr}: UI fell behind; skipped {n} events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // The session ends as soon as either side is done.
    tokio::select! {
        _ = &mut requests_task => debug!("session {peer_addr}: request task ended"),
        _ = &mut events_task => debug!("session {peer_addr}: event task ended"),
    }
    requests_task.abort();
    events_task.abort();

    Ok(())
}

/// Serialises `msg` and sends it as a text frame.  `false` if the UI is gone.
async fn send_json(tx: &Mutex<WsSink>, msg: &BridgeToUiMsg) -> bool {
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            error!("JSON serialization error: {e}");
            return true;
        }
    };
    tx.lock().await.send(WsMessage::Text(json)).await.is_ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
