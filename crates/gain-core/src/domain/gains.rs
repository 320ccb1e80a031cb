//! Gain vectors broadcast by the controller.

use serde::{Deserialize, Serialize};

/// The full set of PID gains for one control loop.
///
/// Each array holds one coefficient per spatial axis: x, y, z in that order.
///
/// # Serde representation
///
/// ```json
/// {"kp":[1.5,0.0,0.0],"ki":[0.0,0.0,0.0],"kd":[0.0,0.0,0.0]}
/// ```
///
/// All three fields are required.  Arrays must contain exactly three numbers;
/// serde rejects shorter or longer arrays for `[f32; 3]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GainVector {
    /// Proportional gains.
    pub kp: [f32; 3],
    /// Integral gains.
    pub ki: [f32; 3],
    /// Derivative gains.
    pub kd: [f32; 3],
}
