//! Avro codec for generic values

use super::avro_schema::SchemaTree;
use super::helpers::{avro_to_tagged, generic_to_avro, unwrap_union_values};
use super::traits::Serdes;
use super::value::GenericValue;
use crate::serdes::error::{SerdeError, SerdeResult};
use crate::serdes::schema::{ReferenceResolver, Schema};
use apache_avro::Schema as AvroSchema;

/// Compiled Avro schema able to encode and decode generic values
///
/// Built from self-contained schema JSON: any named references must already be inlined
/// (see [`crate::serdes::schema::ReferenceResolver`]).
#[derive(Debug, Clone)]
pub struct AvroCodec {
    schema: AvroSchema,
    tree: SchemaTree,
    flattened: serde_json::Value,
}

impl AvroCodec {
    /// Create a new AvroCodec from schema text with no external references
    pub fn new(schema_json: &str) -> SerdeResult<Self> {
        let json: serde_json::Value = serde_json::from_str(schema_json).map_err(|e| {
            SerdeError::codec_creation("schema is not valid JSON", Some(Box::new(e)))
        })?;
        Self::from_json(json)
    }

    /// Create a new AvroCodec from parsed, self-contained schema JSON
    pub fn from_json(flattened: serde_json::Value) -> SerdeResult<Self> {
        let schema = AvroSchema::parse(&flattened).map_err(|e| {
            log::error!("Failed to parse Avro schema: {}", e);
            SerdeError::codec_creation("Failed to parse Avro schema", Some(Box::new(e)))
        })?;
        let tree = SchemaTree::parse(&flattened)
            .map_err(|e| SerdeError::codec_creation(e.to_string(), Some(Box::new(e))))?;

        Ok(AvroCodec {
            schema,
            tree,
            flattened,
        })
    }

    /// Encode a generic value as a raw Avro datum (no container header)
    pub fn serialize(&self, value: &GenericValue) -> SerdeResult<Vec<u8>> {
        let avro_value = generic_to_avro(value, &self.tree.root, &self.tree)?;

        log::debug!("Serializing Avro value: {:?}", avro_value);

        apache_avro::to_avro_datum(&self.schema, avro_value).map_err(|e| {
            log::error!("to_avro_datum() failed with error: {:?}", e);
            SerdeError::avro_encode_with_source(format!("Failed to encode Avro data: {}", e), e)
        })
    }

    /// Decode a raw Avro datum into a generic value with union wrappers removed
    pub fn deserialize(&self, bytes: &[u8]) -> SerdeResult<GenericValue> {
        let avro_value =
            apache_avro::from_avro_datum(&self.schema, &mut &bytes[..], None).map_err(|e| {
                SerdeError::avro_decode("Failed to decode Avro datum", Some(Box::new(e)))
            })?;

        let tagged = avro_to_tagged(&avro_value, &self.tree.root, &self.tree)?;
        Ok(unwrap_union_values(tagged, &self.tree.root, &self.tree))
    }

    pub fn schema(&self) -> &AvroSchema {
        &self.schema
    }

    pub fn tree(&self) -> &SchemaTree {
        &self.tree
    }

    /// Fully-qualified name of the root type, if it is a named type
    pub fn full_name(&self) -> Option<&str> {
        self.tree.full_name()
    }

    /// Schema JSON with every reference inlined
    pub fn flattened_json(&self) -> &serde_json::Value {
        &self.flattened
    }
}

/// Convenience function to encode one value with a self-contained schema
pub fn serialize_to_avro(value: &GenericValue, schema_json: &str) -> SerdeResult<Vec<u8>> {
    AvroCodec::new(schema_json)?.serialize(value)
}

/// Convenience function to decode one value with a self-contained schema
pub fn deserialize_from_avro(bytes: &[u8], schema_json: &str) -> SerdeResult<GenericValue> {
    AvroCodec::new(schema_json)?.deserialize(bytes)
}

/// Schema-driven Avro codec
///
/// Compiles the schema through the resolver on first use; later calls reuse the codec
/// memoized on the schema.
pub struct AvroSerde;

impl AvroSerde {
    fn codec_for(
        schema: Option<&Schema>,
        resolver: &ReferenceResolver<'_>,
    ) -> SerdeResult<std::sync::Arc<AvroCodec>> {
        let schema =
            schema.ok_or_else(|| SerdeError::invalid_schema("Avro codec requires a schema"))?;
        schema.codec(resolver)
    }
}

impl Serdes for AvroSerde {
    fn serialize(
        &self,
        data: &GenericValue,
        schema: Option<&Schema>,
        resolver: &ReferenceResolver<'_>,
    ) -> SerdeResult<Vec<u8>> {
        Self::codec_for(schema, resolver)?.serialize(data)
    }

    fn deserialize(
        &self,
        data: &[u8],
        schema: Option<&Schema>,
        resolver: &ReferenceResolver<'_>,
    ) -> SerdeResult<GenericValue> {
        Self::codec_for(schema, resolver)?.deserialize(data)
    }

    fn format_name(&self) -> &'static str {
        "AVRO"
    }
}
