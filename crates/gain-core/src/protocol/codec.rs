//! JSON payload codec for the gain bus.
//!
//! Two payload shapes travel over the bus:
//!
//! | Direction            | Topic                    | Payload                    |
//! |----------------------|--------------------------|----------------------------|
//! | bridge → controller  | `pid.gains.<g>.<t>.<a>`  | one JSON number, e.g. `1.5` |
//! | controller → bridge  | `pid.gains.<g>`          | [`GainVector`] JSON object |
//!
//! JSON has no representation for NaN or infinity.  `serde_json` would quietly
//! write `null` for them, which the controller would then fail to parse, so
//! the encoder rejects non-finite values up front and the decoder rejects
//! numbers that overflow `f32`.

use thiserror::Error;

use crate::domain::gains::GainVector;

// ── Error types ───────────────────────────────────────────────────────────────

/// A value could not be encoded for the bus.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The value is NaN or infinite.
    #[error("gain value {0} is not a finite number")]
    NonFinite(f32),

    /// JSON serialization failed.
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// A payload received from the bus could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload is not valid JSON of the expected shape (missing field,
    /// wrong array length, non-numeric entry, ...).
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    /// A number in the payload does not fit in an `f32`.
    #[error("payload contains a non-finite gain")]
    NonFinite,
}

// ── Knob values ───────────────────────────────────────────────────────────────

/// Encodes a single knob value as a JSON number.
///
/// # Errors
///
/// Returns [`EncodeError::NonFinite`] for NaN or ±∞.
pub fn encode_knob_value(value: f32) -> Result<Vec<u8>, EncodeError> {
    if !value.is_finite() {
        return Err(EncodeError::NonFinite(value));
    }
    Ok(serde_json::to_vec(&value)?)
}

/// Decodes a single knob value, as the controller would.
///
/// # Errors
///
/// Returns [`DecodeError`] if the payload is not one finite JSON number.
pub fn decode_knob_value(bytes: &[u8]) -> Result<f32, DecodeError> {
    let value: f32 = serde_json::from_slice(bytes)?;
    if !value.is_finite() {
        return Err(DecodeError::NonFinite);
    }
    Ok(value)
}

// ── Gain vectors ──────────────────────────────────────────────────────────────

/// Encodes a full gain vector, as the controller would when broadcasting.
///
/// # Errors
///
/// Returns [`EncodeError::NonFinite`] if any coefficient is NaN or ±∞.
pub fn encode_gain_vector(gains: &GainVector) -> Result<Vec<u8>, EncodeError> {
    if let Some(bad) = all_values(gains).find(|v| !v.is_finite()) {
        return Err(EncodeError::NonFinite(bad));
    }
    Ok(serde_json::to_vec(gains)?)
}

/// Decodes a gain broadcast payload.
///
/// Extra fields are ignored so the controller may add diagnostics to its
/// broadcast without breaking the bridge.
///
/// # Errors
///
/// Returns [`DecodeError::Json`] if a field is missing or malformed, and
/// [`DecodeError::NonFinite`] if a number overflows `f32`.
pub fn decode_gain_vector(bytes: &[u8]) -> Result<GainVector, DecodeError> {
    let gains: GainVector = serde_json::from_slice(bytes)?;
    if all_values(&gains).any(|v| !v.is_finite()) {
        return Err(DecodeError::NonFinite);
    }
    Ok(gains)
}

fn all_values(gains: &GainVector) -> impl Iterator<Item = f32> + '_ {
    gains.kp.iter().chain(&gains.ki).chain(&gains.kd).copied()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_knob_value_is_plain_json_number() {
        assert_eq!(encode_knob_value(1.5).unwrap(), b"1.5");
    }

    #[test]
    fn test_encode_knob_value_negative() {
        assert_eq!(encode_knob_value(-0.25).unwrap(), b"-0.25");
    }

    #[test]
    fn test_encode_knob_value_rejects_nan() {
        assert!(matches!(
            encode_knob_value(f32::NAN),
            Err(EncodeError::NonFinite(_))
        ));
    }

    #[test]
    fn test_encode_knob_value_rejects_infinity() {
        assert!(matches!(
            encode_knob_value(f32::INFINITY),
            Err(EncodeError::NonFinite(_))
        ));
        assert!(matches!(
            encode_knob_value(f32::NEG_INFINITY),
            Err(EncodeError::NonFinite(_))
        ));
    }

    #[test]
    fn test_decode_knob_value_rejects_object() {
        assert!(decode_knob_value(br#"{"value":1.5}"#).is_err());
    }

    #[test]
    fn test_decode_gain_vector_scenario_payload() {
        // Arrange
        let payload = br#"{"kp":[1.5,0,0],"ki":[0,0,0],"kd":[0,0,0]}"#;

        // Act
        let gains = decode_gain_vector(payload).unwrap();

        // Assert
        assert_eq!(
            gains,
            GainVector {
                kp: [1.5, 0.0, 0.0],
                ki: [0.0; 3],
                kd: [0.0; 3],
            }
        );
    }

    #[test]
    fn test_decode_gain_vector_missing_field_fails() {
        let payload = br#"{"kp":[1,2,3],"ki":[0,0,0]}"#;
        assert!(matches!(
            decode_gain_vector(payload),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn test_decode_gain_vector_short_array_fails() {
        let payload = br#"{"kp":[1,2],"ki":[0,0,0],"kd":[0,0,0]}"#;
        assert!(decode_gain_vector(payload).is_err());
    }

    #[test]
    fn test_decode_gain_vector_long_array_fails() {
        let payload = br#"{"kp":[1,2,3,4],"ki":[0,0,0],"kd":[0,0,0]}"#;
        assert!(decode_gain_vector(payload).is_err());
    }

    #[test]
    fn test_decode_gain_vector_string_entry_fails() {
        let payload = br#"{"kp":["1",2,3],"ki":[0,0,0],"kd":[0,0,0]}"#;
        assert!(decode_gain_vector(payload).is_err());
    }

    #[test]
    fn test_decode_gain_vector_not_json_fails() {
        assert!(decode_gain_vector(b"not json").is_err());
    }

    #[test]
    fn test_decode_gain_vector_ignores_extra_fields() {
        let payload = br#"{"kp":[1,2,3],"ki":[0,0,0],"kd":[0,0,0],"loop_hz":400}"#;
        let gains = decode_gain_vector(payload).unwrap();
        assert_eq!(gains.kp, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_decode_gain_vector_overflowing_number_fails() {
        let payload = br#"{"kp":[1e300,0,0],"ki":[0,0,0],"kd":[0,0,0]}"#;
        assert!(decode_gain_vector(payload).is_err());
    }

    #[test]
    fn test_encode_gain_vector_rejects_nan_entry() {
        let gains = GainVector {
            kd: [0.0, f32::NAN, 0.0],
            ..GainVector::default()
        };
        assert!(matches!(
            encode_gain_vector(&gains),
            Err(EncodeError::NonFinite(_))
        ));
    }

    #[test]
    fn test_encoded_gain_vector_decodes_to_same_value() {
        let gains = GainVector {
            kp: [0.8, 0.8, 1.2],
            ki: [0.05, 0.05, 0.1],
            kd: [0.2, 0.2, 0.0],
        };
        let bytes = encode_gain_vector(&gains).unwrap();
        assert_eq!(decode_gain_vector(&bytes).unwrap(), gains);
    }
}
