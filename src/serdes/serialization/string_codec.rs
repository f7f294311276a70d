//! Plain string codec

use super::traits::Serdes;
use super::value::GenericValue;
use crate::serdes::error::{SerdeError, SerdeResult};
use crate::serdes::schema::{ReferenceResolver, Schema};

pub struct StringSerde;

impl Serdes for StringSerde {
    fn serialize(
        &self,
        data: &GenericValue,
        _schema: Option<&Schema>,
        _resolver: &ReferenceResolver<'_>,
    ) -> SerdeResult<Vec<u8>> {
        match data {
            GenericValue::String(s) => Ok(s.as_bytes().to_vec()),
            other => Err(SerdeError::invalid_data(format!(
                "string serializer requires a string, got {}",
                other.type_name()
            ))),
        }
    }

    /// Never fails; invalid UTF-8 is replaced
    fn deserialize(
        &self,
        data: &[u8],
        _schema: Option<&Schema>,
        _resolver: &ReferenceResolver<'_>,
    ) -> SerdeResult<GenericValue> {
        Ok(GenericValue::String(
            String::from_utf8_lossy(data).into_owned(),
        ))
    }

    fn format_name(&self) -> &'static str {
        "STRING"
    }
}
