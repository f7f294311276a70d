//! Factory for schema-type codecs

use super::avro_codec::AvroSerde;
use super::bytes_codec::ByteArraySerde;
use super::json_codec::JsonSerde;
use super::string_codec::StringSerde;
use super::traits::Serdes;
use crate::serdes::error::{SerdeError, SerdeResult};
use crate::serdes::schema::SchemaType;

/// Get the codec for a schema type
///
/// # Supported Types
///
/// - `String`, `Bytes`, `Json`, `Avro`
/// - `Protobuf` has no codec and returns [`SerdeError::UnsupportedOperation`]
///
/// # Examples
///
/// ```rust
/// use velostream_serdes::serdes::schema::SchemaType;
/// use velostream_serdes::serdes::serialization::get_serdes;
///
/// let json = get_serdes(SchemaType::Json)?;
/// assert_eq!(json.format_name(), "JSON");
/// assert!(get_serdes(SchemaType::Protobuf).is_err());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn get_serdes(schema_type: SchemaType) -> SerdeResult<Box<dyn Serdes>> {
    match schema_type {
        SchemaType::String => Ok(Box::new(StringSerde)),
        SchemaType::Bytes => Ok(Box::new(ByteArraySerde)),
        SchemaType::Json => Ok(Box::new(JsonSerde)),
        SchemaType::Avro => Ok(Box::new(AvroSerde)),
        SchemaType::Protobuf => Err(SerdeError::unsupported(
            "Protobuf serialization is not implemented",
        )),
    }
}

/// Get the codec for a schema type given by name (case-insensitive)
pub fn get_serdes_by_name(name: &str) -> SerdeResult<Box<dyn Serdes>> {
    get_serdes(name.parse()?)
}

/// Schema types that have a codec
pub fn supported_types() -> Vec<SchemaType> {
    vec![
        SchemaType::String,
        SchemaType::Bytes,
        SchemaType::Json,
        SchemaType::Avro,
    ]
}
