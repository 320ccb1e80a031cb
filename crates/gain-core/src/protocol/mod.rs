//! Protocol module: bus topic naming and the JSON payload codec.

pub mod codec;
pub mod topics;

pub use codec::{
    decode_gain_vector, decode_knob_value, encode_gain_vector, encode_knob_value, DecodeError,
    EncodeError,
};
pub use topics::{broadcast_topic, resolve, ui_channel, TOPIC_PREFIX};
