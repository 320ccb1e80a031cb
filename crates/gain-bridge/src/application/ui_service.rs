//! Request handling for UI sessions.
//!
//! Every UI session shares one [`UiService`].  It has no per-session state:
//! a request goes in, exactly one reply comes out.
//!
//! ```text
//! PublishKnob { knob, value } ─► OutboundPublisher::publish ─► PublishResult
//! GetGains                    ─► GainCache::snapshot        ─► Gains
//! (unparseable text)          ─────────────────────────────► Error
//! ```
//!
//! A rejected knob update is answered with `success: false` and the error
//! text; it is never dropped silently.

use std::sync::Arc;

use gain_core::KnobUpdate;
use tracing::{debug, warn};

use crate::application::gain_cache::GainCache;
use crate::application::outbound_publisher::OutboundPublisher;
use crate::domain::messages::{BridgeToUiMsg, UiToBridgeMsg};

/// Turns UI requests into publisher and cache calls.
#[derive(Clone)]
pub struct UiService {
    publisher: Arc<OutboundPublisher>,
    cache: Arc<GainCache>,
}

impl UiService {
    pub fn new(publisher: Arc<OutboundPublisher>, cache: Arc<GainCache>) -> Self {
        Self { publisher, cache }
    }

    /// Handles one parsed request.
    pub async fn handle(&self, msg: UiToBridgeMsg) -> BridgeToUiMsg {
        match msg {
            UiToBridgeMsg::PublishKnob { knob, value } => {
                let update = KnobUpdate::new(knob, value);
                match self.publisher.publish(&update).await {
                    Ok(topic) => BridgeToUiMsg::PublishResult {
                        knob: update.knob,
                        success: true,
                        topic: Some(topic),
                        error: None,
                    },
                    Err(e) => BridgeToUiMsg::PublishResult {
                        knob: update.knob,
                        success: false,
                        topic: None,
                        error: Some(e.to_string()),
                    },
                }
            }
            UiToBridgeMsg::GetGains => self.cache.snapshot().await.into(),
        }
    }

    /// Parses one JSON text frame and handles it.
    ///
    /// A frame that is not a known request produces [`BridgeToUiMsg::Error`]
    /// instead of closing the session.
    pub async fn handle_text(&self, text: &str) -> BridgeToUiMsg {
        match serde_json::from_str::<UiToBridgeMsg>(text) {
            Ok(msg) => {
                debug!("UI request: {}", request_type_name(&msg));
                self.handle(msg).await
            }
            Err(e) => {
                warn!("invalid JSON from UI: {e}");
                BridgeToUiMsg::Error {
                    description: format!("invalid request: {e}"),
                }
            }
        }
    }
}

/// Short variant name for log lines.
fn request_type_name(msg: &UiToBridgeMsg) -> &'static str {
    match msg {
        UiToBridgeMsg::PublishKnob { .. } => "PublishKnob",
        UiToBridgeMsg::GetGains => "GetGains",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
