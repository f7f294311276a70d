//! JSON and JSON Schema codec

use super::traits::Serdes;
use super::value::GenericValue;
use crate::serdes::error::{SerdeError, SerdeResult};
use crate::serdes::schema::{ReferenceResolver, Schema};
use serde_json::Value;

/// JSON codec with optional JSON Schema validation
///
/// Serialization validates strictly. Deserialization is best effort: a payload that parses but
/// fails validation is still returned, with the failure logged.
pub struct JsonSerde;

impl JsonSerde {
    /// Parse `data`, returning the value together with any validation failure
    pub fn deserialize_validated(
        &self,
        data: &[u8],
        schema: Option<&Schema>,
    ) -> SerdeResult<(GenericValue, Option<SerdeError>)> {
        let json: Value = serde_json::from_slice(data).map_err(SerdeError::json_unmarshal)?;
        let validation = match schema {
            Some(schema) => validate(&json, schema).err(),
            None => None,
        };
        Ok((GenericValue::from(json), validation))
    }
}

impl Serdes for JsonSerde {
    fn serialize(
        &self,
        data: &GenericValue,
        schema: Option<&Schema>,
        _resolver: &ReferenceResolver<'_>,
    ) -> SerdeResult<Vec<u8>> {
        if data.as_object().is_none() {
            return Err(SerdeError::invalid_data(format!(
                "JSON serializer requires an object, got {}",
                data.type_name()
            )));
        }
        let json = data.to_json();
        if let Some(schema) = schema {
            validate(&json, schema)?;
        }
        serde_json::to_vec(&json).map_err(SerdeError::json_unmarshal)
    }

    fn deserialize(
        &self,
        data: &[u8],
        schema: Option<&Schema>,
        _resolver: &ReferenceResolver<'_>,
    ) -> SerdeResult<GenericValue> {
        let (value, validation) = self.deserialize_validated(data, schema)?;
        if let Some(err) = validation {
            log::warn!("Decoded JSON does not match its schema: {}", err);
        }
        Ok(value)
    }

    fn format_name(&self) -> &'static str {
        "JSON"
    }
}

fn validate(instance: &Value, schema: &Schema) -> SerdeResult<()> {
    let schema_json: Value = serde_json::from_str(&schema.schema)
        .map_err(|e| SerdeError::invalid_schema_with_source("JSON schema is not valid JSON", e))?;
    let validator = jsonschema::validator_for(&schema_json).map_err(|e| {
        SerdeError::FailedCreateJsonSchemaCodec {
            message: e.to_string(),
        }
    })?;

    let errors: Vec<String> = validator
        .iter_errors(instance)
        .map(|e| e.to_string())
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        log::debug!("JSON validation failed with {} error(s)", errors.len());
        Err(SerdeError::FailedValidateJson { errors })
    }
}
