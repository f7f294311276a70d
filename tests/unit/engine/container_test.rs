use crate::unit::test_utils::{avro_schema, init_logger, EVENT_SCHEMA};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::json;
use std::sync::Arc;
use velostream_serdes::serdes::schema::{Schema, SchemaType};
use velostream_serdes::serdes::serialization::{wire_format, GenericValue};
use velostream_serdes::{Container, SerdeEngine, SerdeError};

const NUMBERS_SCHEMA: &str =
    r#"{"type":"object","properties":{"n":{"type":"integer"}},"required":["n"]}"#;

fn event() -> GenericValue {
    GenericValue::from(json!({"id": 7, "optional": null, "enumField": "INACTIVE"}))
}

fn expected_event() -> GenericValue {
    GenericValue::from(json!({"id": 7, "optional": null, "enumField": "INACTIVE"}))
}

#[test]
fn test_avro_bytes_round_trip() {
    init_logger();
    let engine = SerdeEngine::default();
    let schema = avro_schema(11, EVENT_SCHEMA, "events-value", false);

    let bytes = engine
        .serialize(&Container::new(event(), SchemaType::Avro).with_schema(Arc::clone(&schema)))
        .unwrap();
    assert_eq!(&bytes[..5], &[0u8, 0, 0, 0, 11]);

    let decoded = engine
        .deserialize(&Container::new(bytes, SchemaType::Avro).with_schema(schema))
        .unwrap();
    assert_eq!(decoded, expected_event());
}

#[test]
fn test_avro_accepts_base64_and_byte_arrays() {
    let engine = SerdeEngine::default();
    let schema = avro_schema(11, EVENT_SCHEMA, "events-value", false);
    let bytes = engine
        .serialize(&Container::new(event(), SchemaType::Avro).with_schema(Arc::clone(&schema)))
        .unwrap();

    let encoded = STANDARD.encode(&bytes);
    let decoded = engine
        .deserialize(&Container::new(encoded, SchemaType::Avro).with_schema(Arc::clone(&schema)))
        .unwrap();
    assert_eq!(decoded, expected_event());

    let as_array = GenericValue::Array(bytes.iter().map(|b| GenericValue::Integer(*b as i64)).collect());
    let decoded = engine
        .deserialize(&Container::new(as_array, SchemaType::Avro).with_schema(schema))
        .unwrap();
    assert_eq!(decoded, expected_event());
}

#[test]
fn test_schema_id_zero_is_not_framed() {
    let engine = SerdeEngine::default();
    let schema = avro_schema(0, EVENT_SCHEMA, "events-value", false);
    let bytes = engine
        .serialize(&Container::new(event(), SchemaType::Avro).with_schema(Arc::clone(&schema)))
        .unwrap();
    // zigzag(7)
    assert_eq!(bytes[0], 14);

    let decoded = engine
        .deserialize(&Container::new(bytes, SchemaType::Avro).with_schema(schema))
        .unwrap();
    assert_eq!(decoded, expected_event());
}

#[test]
fn test_short_framed_message_is_rejected() {
    let engine = SerdeEngine::default();
    let schema = avro_schema(3, EVENT_SCHEMA, "events-value", false);
    let err = engine
        .deserialize(&Container::new(vec![0u8, 0, 3], SchemaType::Avro).with_schema(schema))
        .unwrap_err();
    assert!(matches!(err, SerdeError::FailedDecodeFromWireFormat { .. }));
}

#[test]
fn test_json_container_with_schema() {
    let engine = SerdeEngine::default();
    let schema = Arc::new(Schema::new(3, NUMBERS_SCHEMA, SchemaType::Json, "nums-value"));

    let bytes = engine
        .serialize(
            &Container::new(GenericValue::from(json!({"n": 4})), SchemaType::Json)
                .with_schema(Arc::clone(&schema)),
        )
        .unwrap();
    assert_eq!(wire_format::decode(&bytes).unwrap(), br#"{"n":4}"#);

    let err = engine
        .serialize(
            &Container::new(GenericValue::from(json!({"n": 4.5})), SchemaType::Json)
                .with_schema(Arc::clone(&schema)),
        )
        .unwrap_err();
    assert!(matches!(err, SerdeError::FailedValidateJson { .. }));

    let decoded = engine
        .deserialize(&Container::new(bytes, SchemaType::Json).with_schema(schema))
        .unwrap();
    assert_eq!(decoded, GenericValue::from(json!({"n": 4})));
}

#[test]
fn test_decoded_value_must_be_an_object() {
    let engine = SerdeEngine::default();
    let schema = Arc::new(Schema::new(0, "{}", SchemaType::Json, "list-value"));
    let err = engine
        .deserialize(&Container::new(b"[1,2]".to_vec(), SchemaType::Json).with_schema(schema))
        .unwrap_err();
    assert!(matches!(err, SerdeError::InvalidDataType { .. }));
}

#[test]
fn test_caching_schema_is_replaced_by_cached_subject_entry() {
    let engine = SerdeEngine::default();
    assert!(engine.register_schema(
        "events-value",
        avro_schema(21, EVENT_SCHEMA, "events-value", true)
    ));

    let stale = avro_schema(20, EVENT_SCHEMA, "events-value", true);
    let bytes = engine
        .serialize(&Container::new(event(), SchemaType::Avro).with_schema(Arc::clone(&stale)))
        .unwrap();
    assert_eq!(wire_format::schema_id(&bytes).unwrap(), 21);

    // caching disabled ignores the cache
    let uncached = avro_schema(20, EVENT_SCHEMA, "events-value", false);
    let bytes = engine
        .serialize(&Container::new(event(), SchemaType::Avro).with_schema(uncached))
        .unwrap();
    assert_eq!(wire_format::schema_id(&bytes).unwrap(), 20);
}

#[test]
fn test_protobuf_is_unsupported() {
    let engine = SerdeEngine::default();
    let err = engine
        .serialize(&Container::new(GenericValue::from(json!({"a": 1})), SchemaType::Protobuf))
        .unwrap_err();
    assert!(matches!(err, SerdeError::UnsupportedOperation { .. }));
    assert_eq!(err.code(), 2016);
}

#[test]
fn test_bytes_type_with_schema_is_unsupported() {
    let engine = SerdeEngine::default();
    let schema = avro_schema(1, EVENT_SCHEMA, "events-value", false);
    let err = engine
        .deserialize(&Container::new(vec![0u8, 0, 0, 0, 1], SchemaType::Bytes).with_schema(schema))
        .unwrap_err();
    assert!(matches!(err, SerdeError::UnsupportedOperation { .. }));
}

#[test]
fn test_schemaless_json_probing() {
    let engine = SerdeEngine::default();
    let json_bytes = br#"{"a": 1}"#.to_vec();

    let decoded = engine
        .deserialize(&Container::new(json_bytes.clone(), SchemaType::Avro))
        .unwrap();
    assert_eq!(decoded, GenericValue::from(json!({"a": 1})));

    let decoded = engine
        .deserialize(&Container::new(json_bytes.clone(), SchemaType::Bytes))
        .unwrap();
    assert_eq!(decoded, GenericValue::Bytes(json_bytes));

    let decoded = engine
        .deserialize(&Container::new(vec![1u8, 2, 3], SchemaType::Json))
        .unwrap();
    assert_eq!(decoded, GenericValue::Bytes(vec![1, 2, 3]));
}

#[test]
fn test_schemaless_string_inputs() {
    let engine = SerdeEngine::default();

    let decoded = engine
        .deserialize(&Container::new("aGk=", SchemaType::String))
        .unwrap();
    assert_eq!(decoded, GenericValue::from("hi"));

    // not base64: the text itself becomes the bytes
    let decoded = engine
        .deserialize(&Container::new("hi there", SchemaType::String))
        .unwrap();
    assert_eq!(decoded, GenericValue::Bytes(b"hi there".to_vec()));

    let decoded = engine
        .deserialize(&Container::new(GenericValue::Integer(9), SchemaType::String))
        .unwrap();
    assert_eq!(decoded, GenericValue::Integer(9));
}

#[test]
fn test_schemaless_serialize_uses_type_codec() {
    let engine = SerdeEngine::default();
    let bytes = engine
        .serialize(&Container::new(GenericValue::from(json!({"b": true})), SchemaType::Json))
        .unwrap();
    assert_eq!(bytes, br#"{"b":true}"#);

    let bytes = engine
        .serialize(&Container::new(vec![1u8, 2], SchemaType::Bytes))
        .unwrap();
    assert_eq!(bytes, vec![1, 2]);
}
