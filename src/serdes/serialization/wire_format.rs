//! Schema registry wire format
//!
//! Registry-aware payloads carry a 5-byte prefix: one magic byte (`0x00`) followed by the
//! schema id as a big-endian `u32`.

use crate::serdes::error::{SerdeError, SerdeResult};

pub const MAGIC_BYTE: u8 = 0;
pub const PREFIX_LENGTH: usize = 5;

/// Strip the wire-format prefix and return the payload
///
/// Only the length is checked; the magic byte is not validated.
pub fn decode(message: &[u8]) -> SerdeResult<&[u8]> {
    decode_with_id(message).map(|(_, payload)| payload)
}

/// Strip the wire-format prefix, returning the schema id alongside the payload
pub fn decode_with_id(message: &[u8]) -> SerdeResult<(u32, &[u8])> {
    if message.len() < PREFIX_LENGTH {
        return Err(SerdeError::MessageTooShort {
            length: message.len(),
        });
    }
    let id = u32::from_be_bytes([message[1], message[2], message[3], message[4]]);
    Ok((id, &message[PREFIX_LENGTH..]))
}

/// Read the schema id from a framed message
pub fn schema_id(message: &[u8]) -> SerdeResult<u32> {
    decode_with_id(message).map(|(id, _)| id)
}

/// Prepend the wire-format prefix for `schema_id`
///
/// Id 0 means "no schema": a payload encoded locally without a registry id.
pub fn encode(payload: &[u8], schema_id: u32) -> Vec<u8> {
    let mut framed = Vec::with_capacity(PREFIX_LENGTH + payload.len());
    framed.push(MAGIC_BYTE);
    framed.extend_from_slice(&schema_id.to_be_bytes());
    framed.extend_from_slice(payload);
    framed
}
