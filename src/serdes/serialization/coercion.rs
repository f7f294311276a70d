//! Type coercion helpers shared by the Avro transcoder and the simple codecs

use super::value::GenericValue;
use crate::serdes::error::{SerdeError, SerdeResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

// 2^63; i64::MAX is not representable as f64
const I64_UPPER_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Narrow a float to int32, refusing fractional or out-of-range input
pub fn float_to_i32(f: f64) -> SerdeResult<i32> {
    if !f.is_finite() || f.fract() != 0.0 {
        return Err(SerdeError::invalid_data(format!(
            "cannot convert float64 to int32: not an integer: {}",
            f
        )));
    }
    if f < i32::MIN as f64 || f > i32::MAX as f64 {
        return Err(SerdeError::invalid_data(format!(
            "cannot convert float64 to int32: out of range: {}",
            f
        )));
    }
    Ok(f as i32)
}

/// Narrow a float to int64, refusing fractional or out-of-range input
pub fn float_to_i64(f: f64) -> SerdeResult<i64> {
    if !f.is_finite() || f.fract() != 0.0 {
        return Err(SerdeError::invalid_data(format!(
            "cannot convert float64 to int64: not an integer: {}",
            f
        )));
    }
    if !(-I64_UPPER_BOUND..I64_UPPER_BOUND).contains(&f) {
        return Err(SerdeError::invalid_data(format!(
            "cannot convert float64 to int64: out of range: {}",
            f
        )));
    }
    Ok(f as i64)
}

/// Coerce an integer or integral float to int32
pub fn to_i32(value: &GenericValue) -> SerdeResult<i32> {
    match value {
        GenericValue::Integer(i) => i32::try_from(*i).map_err(|_| {
            SerdeError::invalid_data(format!("cannot convert {} to int32: out of range", i))
        }),
        GenericValue::Float(f) => float_to_i32(*f),
        other => Err(SerdeError::invalid_data(format!(
            "expected int, got {}",
            other.type_name()
        ))),
    }
}

/// Coerce an integer or integral float to int64
pub fn to_i64(value: &GenericValue) -> SerdeResult<i64> {
    match value {
        GenericValue::Integer(i) => Ok(*i),
        GenericValue::Float(f) => float_to_i64(*f),
        other => Err(SerdeError::invalid_data(format!(
            "expected long, got {}",
            other.type_name()
        ))),
    }
}

/// Convert a numeric value to a single byte using cast truncation (256 -> 0, -1 -> 255)
pub fn to_byte(value: &GenericValue) -> Option<u8> {
    match value {
        GenericValue::Integer(i) => Some(*i as u8),
        GenericValue::Float(f) if f.is_finite() => Some((*f as i64) as u8),
        _ => None,
    }
}

/// Convert a sequence of numbers into a byte vector
pub fn to_byte_array(items: &[GenericValue]) -> SerdeResult<Vec<u8>> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            to_byte(item).ok_or_else(|| {
                SerdeError::invalid_data(format!(
                    "cannot convert value to byte at index {}: {}",
                    index,
                    item.type_name()
                ))
            })
        })
        .collect()
}

/// True when the bytes hold a JSON object
pub fn is_json(data: &[u8]) -> bool {
    to_json_object(data).is_ok()
}

/// Parse bytes holding a JSON object into a generic object value
pub fn to_json_object(data: &[u8]) -> SerdeResult<GenericValue> {
    let map: serde_json::Map<String, serde_json::Value> =
        serde_json::from_slice(data).map_err(SerdeError::json_unmarshal)?;
    Ok(GenericValue::from(serde_json::Value::Object(map)))
}

pub fn base64_to_bytes(data: &str) -> SerdeResult<Vec<u8>> {
    Ok(STANDARD.decode(data)?)
}

/// True when the string is valid standard base64
pub fn is_base64_encoded(data: &str) -> bool {
    STANDARD.decode(data).is_ok()
}

pub fn is_valid_utf8(data: &[u8]) -> bool {
    std::str::from_utf8(data).is_ok()
}
