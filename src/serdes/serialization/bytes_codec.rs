//! Byte-array codec

use super::coercion::to_byte;
use super::traits::Serdes;
use super::value::GenericValue;
use crate::serdes::error::{SerdeError, SerdeResult};
use crate::serdes::schema::{ReferenceResolver, Schema};

pub struct ByteArraySerde;

impl Serdes for ByteArraySerde {
    /// Accepts a byte vector, or an array of integers / integral floats narrowed to bytes
    fn serialize(
        &self,
        data: &GenericValue,
        _schema: Option<&Schema>,
        _resolver: &ReferenceResolver<'_>,
    ) -> SerdeResult<Vec<u8>> {
        match data {
            GenericValue::Bytes(bytes) => Ok(bytes.clone()),
            GenericValue::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| match item {
                    GenericValue::Float(f) if f.fract() != 0.0 => None,
                    other => to_byte(other),
                }
                .ok_or_else(|| {
                    SerdeError::invalid_data(format!(
                        "byte array serializer requires integers, got {} at index {}",
                        item, index
                    ))
                }))
                .collect(),
            other => Err(SerdeError::invalid_data(format!(
                "byte array serializer requires an array of bytes, got {}",
                other.type_name()
            ))),
        }
    }

    fn deserialize(
        &self,
        data: &[u8],
        _schema: Option<&Schema>,
        _resolver: &ReferenceResolver<'_>,
    ) -> SerdeResult<GenericValue> {
        Ok(GenericValue::Bytes(data.to_vec()))
    }

    fn format_name(&self) -> &'static str {
        "BYTES"
    }
}
