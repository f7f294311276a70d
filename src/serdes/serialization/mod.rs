//! Payload codecs and the Avro transcoder
//!
//! - [`wire_format`]: 5-byte schema registry framing
//! - [`coercion`]: numeric narrowing and payload probing
//! - [`avro_schema`] / [`helpers`]: schema-kind tree and generic <-> Avro conversion
//! - [`Serdes`] implementations for string, byte-array, JSON and Avro payloads

pub mod avro_codec;
pub mod avro_schema;
pub mod bytes_codec;
pub mod coercion;
pub mod factory;
pub mod helpers;
pub mod json_codec;
pub mod string_codec;
pub mod traits;
pub mod value;
pub mod wire_format;

pub use avro_codec::{deserialize_from_avro, serialize_to_avro, AvroCodec, AvroSerde};
pub use bytes_codec::ByteArraySerde;
pub use factory::{get_serdes, get_serdes_by_name, supported_types};
pub use json_codec::JsonSerde;
pub use string_codec::StringSerde;
pub use traits::Serdes;
pub use value::GenericValue;
