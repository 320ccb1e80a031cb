//! JSON message types for the UI-facing WebSocket protocol.
//!
//! # Message flow
//!
//! ```text
//! UI     → Bridge:  JSON text frame  →  UiToBridgeMsg
//! Bridge → UI:      BridgeToUiMsg    →  JSON text frame
//! ```
//!
//! Every message is a JSON object with a `"type"` field that identifies the
//! variant (`#[serde(tag = "type")]`).  For example:
//!
//! ```json
//! {"type":"PublishKnob","knob":"posxp","value":1.5}
//! {"type":"Event","channel":"update:pos","gains":{"kp":[1.5,0,0],"ki":[0,0,0],"kd":[0,0,0]}}
//! ```

use gain_core::{ui_channel, AxisGroup, GainVector};
use serde::{Deserialize, Serialize};

// ── UI → Bridge ───────────────────────────────────────────────────────────────

/// All messages the UI can send to the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UiToBridgeMsg {
    /// A knob moved.  Answered with exactly one [`BridgeToUiMsg::PublishResult`].
    PublishKnob {
        /// Raw knob identifier, e.g. `"posxp"`.
        knob: String,
        /// New gain value.
        value: f32,
    },

    /// Ask for the currently cached gains.  Answered with
    /// [`BridgeToUiMsg::Gains`].
    GetGains,
}

// ── Bridge → UI ───────────────────────────────────────────────────────────────

/// Copy of both cache slots, as sent in reply to `GetGains`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GainsSnapshot {
    pub pos: GainVector,
    pub att: GainVector,
}

/// All messages the bridge sends to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BridgeToUiMsg {
    /// Outcome of one `PublishKnob` request.
    PublishResult {
        /// The knob identifier exactly as the UI sent it.
        knob: String,
        /// `true` if the value was published (and flushed, when enabled).
        success: bool,
        /// Topic the value went to; present on success.
        #[serde(skip_serializing_if = "Option::is_none")]
        topic: Option<String>,
        /// Human-readable reason; present on failure.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Current cache contents.
    Gains {
        pos: GainVector,
        att: GainVector,
    },

    /// The controller broadcast new gains for one loop.
    Event {
        /// `update:pos` or `update:att`.
        channel: String,
        gains: GainVector,
    },

    /// The UI sent a frame the bridge could not understand.
    Error { description: String },
}

impl From<GainsSnapshot> for BridgeToUiMsg {
    fn from(s: GainsSnapshot) -> Self {
        BridgeToUiMsg::Gains {
            pos: s.pos,
            att: s.att,
        }
    }
}

// ── Notification ──────────────────────────────────────────────────────────────

/// A cache change, as handed to the UI event sink.
#[derive(Debug, Clone, PartialEq)]
pub struct UiEvent {
    /// Named channel, `update:<group>`.
    pub channel: String,
    /// Loop whose gains changed.
    pub group: AxisGroup,
    /// New gains for that loop.
    pub gains: GainVector,
}

impl UiEvent {
    pub fn gains_updated(group: AxisGroup, gains: GainVector) -> Self {
        Self {
            channel: ui_channel(group),
            group,
            gains,
        }
    }
}

impl From<UiEvent> for BridgeToUiMsg {
    fn from(e: UiEvent) -> Self {
        BridgeToUiMsg::Event {
            channel: e.channel,
            gains: e.gains,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
