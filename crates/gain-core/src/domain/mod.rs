//! Domain types: the knob vocabulary and per-loop gain vectors.

pub mod gains;
pub mod knob;
pub mod update;

pub use gains::GainVector;
pub use knob::{AxisGroup, GainTerm, InvalidIdentifierError, KnobId, SpatialAxis};
pub use update::KnobUpdate;
