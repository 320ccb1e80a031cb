//! Topic naming for the gain bus.
//!
//! # Topic layout
//!
//! ```text
//! pid.gains.pos            ← controller broadcasts full position GainVector
//! pid.gains.att            ← controller broadcasts full attitude GainVector
//! pid.gains.<g>.<t>.<a>    ← bridge publishes one knob value
//!                            g ∈ {pos, att}, t ∈ {p, i, d}, a ∈ {x, y, z}
//! ```
//!
//! Knob topics put the gain term before the axis so that a controller can
//! subscribe to `pid.gains.pos.p.>` to receive every proportional gain of the
//! position loop in one subscription.

use tracing::trace;

use crate::domain::knob::{AxisGroup, InvalidIdentifierError, KnobId};

/// Common prefix of every topic used by the bridge.
pub const TOPIC_PREFIX: &str = "pid.gains";

/// Resolves a raw knob identifier to the topic its value is published on.
///
/// This is a pure function: the same input always yields the same output and
/// nothing outside the return value is affected.
///
/// # Errors
///
/// Returns [`InvalidIdentifierError`] naming the offending component when the
/// identifier has the wrong length or an unknown group, axis or term.
///
/// # Example
///
/// ```rust
/// assert_eq!(gain_core::resolve("posxp").unwrap(), "pid.gains.pos.p.x");
/// assert!(gain_core::resolve("xyz12").is_err());
/// ```
pub fn resolve(identifier: &str) -> Result<String, InvalidIdentifierError> {
    let knob = KnobId::parse(identifier)?;
    let topic = knob.topic();
    trace!("resolve({identifier}) -> {topic}");
    Ok(topic)
}

impl KnobId {
    /// The topic this knob's value is published on.
    pub fn topic(&self) -> String {
        format!(
            "{TOPIC_PREFIX}.{}.{}.{}",
            self.group.token(),
            self.term.token(),
            self.axis.token()
        )
    }
}

/// The topic on which the controller broadcasts the full gains of `group`.
pub fn broadcast_topic(group: AxisGroup) -> String {
    format!("{TOPIC_PREFIX}.{}", group.token())
}

/// The UI event channel notified when the cached gains of `group` change.
pub fn ui_channel(group: AxisGroup) -> String {
    format!("update:{}", group.token())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
