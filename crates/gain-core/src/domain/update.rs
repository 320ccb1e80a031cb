//! A single knob movement reported by the UI.

use serde::{Deserialize, Serialize};

/// One knob change: an unvalidated identifier and its new value.
///
/// The identifier is kept as the raw string the UI sent so that a rejected
/// update can be reported back verbatim.  It is validated when the update is
/// published.
///
/// # Serde representation
///
/// ```json
/// {"knob":"posxp","value":1.5}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnobUpdate {
    /// Raw knob identifier, e.g. `"posxp"`.
    pub knob: String,
    /// New gain value.
    pub value: f32,
}

impl KnobUpdate {
    pub fn new(knob: impl Into<String>, value: f32) -> Self {
        Self {
            knob: knob.into(),
            value,
        }
    }
}
