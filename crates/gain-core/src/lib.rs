//! # gain-core
//!
//! Shared library for the PID gain bridge containing the knob vocabulary, the
//! topic resolver, and the JSON payload codec used on the message bus.
//!
//! It has zero dependencies on sockets, async runtimes, or UI frameworks.
//!
//! # Architecture overview (for beginners)
//!
//! A flight controller runs two independent PID loops: one for **position**
//! and one for **attitude**.  Each loop has three gain terms (proportional,
//! integral, derivative) for each of the three spatial axes (x, y, z).  A
//! tuning UI exposes one *knob* per (loop, axis, term) triple.
//!
//! This crate defines:
//!
//! - **`domain`** – The vocabulary: [`AxisGroup`], [`SpatialAxis`],
//!   [`GainTerm`], the validated [`KnobId`], the raw [`KnobUpdate`] a UI
//!   sends, and the [`GainVector`] that a controller broadcasts for one loop.
//!
//! - **`protocol`** – How those values travel over the bus.  Knob identifiers
//!   are resolved to topic strings, knob values are encoded as JSON numbers,
//!   and gain broadcasts are decoded from JSON objects.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `gain_core::KnobId` instead of `gain_core::domain::knob::KnobId`.
pub use domain::gains::GainVector;
pub use domain::knob::{AxisGroup, GainTerm, InvalidIdentifierError, KnobId, SpatialAxis};
pub use domain::update::KnobUpdate;
pub use protocol::codec::{
    decode_gain_vector, decode_knob_value, encode_gain_vector, encode_knob_value, DecodeError,
    EncodeError,
};
pub use protocol::topics::{broadcast_topic, resolve, ui_channel};
