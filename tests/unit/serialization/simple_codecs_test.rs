use serde_json::json;
use velostream_serdes::serdes::schema::{ReferenceResolver, Schema, SchemaCache, SchemaType};
use velostream_serdes::serdes::serialization::{get_serdes, GenericValue};
use velostream_serdes::SerdeError;

#[test]
fn test_string_codec() {
    let cache = SchemaCache::new();
    let resolver = ReferenceResolver::new(&cache);
    let serdes = get_serdes(SchemaType::String).unwrap();

    let bytes = serdes
        .serialize(&GenericValue::from("key-1"), None, &resolver)
        .unwrap();
    assert_eq!(bytes, b"key-1");

    // invalid UTF-8 never fails
    let decoded = serdes.deserialize(&[0x66, 0xFF, 0x6F], None, &resolver).unwrap();
    assert_eq!(decoded.as_str(), Some("f\u{FFFD}o"));

    let err = serdes
        .serialize(&GenericValue::from(json!({"a": 1})), None, &resolver)
        .unwrap_err();
    assert!(matches!(err, SerdeError::InvalidDataType { .. }));
}

#[test]
fn test_byte_array_codec() {
    let cache = SchemaCache::new();
    let resolver = ReferenceResolver::new(&cache);
    let serdes = get_serdes(SchemaType::Bytes).unwrap();

    let bytes = serdes
        .serialize(&GenericValue::from(json!([1.0, 2.0, 3.0])), None, &resolver)
        .unwrap();
    assert_eq!(bytes, vec![1, 2, 3]);

    let raw = GenericValue::Bytes(vec![9, 8, 7]);
    assert_eq!(serdes.serialize(&raw, None, &resolver).unwrap(), vec![9, 8, 7]);
    assert_eq!(serdes.deserialize(&[9, 8, 7], None, &resolver).unwrap(), raw);

    let err = serdes
        .serialize(&GenericValue::from("not bytes"), None, &resolver)
        .unwrap_err();
    assert_eq!(err.code(), 2000);
}

#[test]
fn test_json_codec_without_schema() {
    let cache = SchemaCache::new();
    let resolver = ReferenceResolver::new(&cache);
    let serdes = get_serdes(SchemaType::Json).unwrap();

    let value = GenericValue::from(json!({"user": {"id": 1, "tags": ["a", "b"]}, "ok": true}));
    let bytes = serdes.serialize(&value, None, &resolver).unwrap();
    assert!(!bytes.contains(&b' '), "output should be compact");
    assert_eq!(serdes.deserialize(&bytes, None, &resolver).unwrap(), value);
}

#[test]
fn test_json_codec_validation_is_strict_on_encode_lenient_on_decode() {
    let cache = SchemaCache::new();
    let resolver = ReferenceResolver::new(&cache);
    let serdes = get_serdes(SchemaType::Json).unwrap();
    let schema = Schema::new(
        5,
        r#"{"type": "object", "properties": {"count": {"type": "integer", "minimum": 0}}}"#,
        SchemaType::Json,
        "counts-value",
    );

    let invalid = GenericValue::from(json!({"count": -1}));
    let err = serdes.serialize(&invalid, Some(&schema), &resolver).unwrap_err();
    assert!(matches!(err, SerdeError::FailedValidateJson { .. }));

    let decoded = serdes
        .deserialize(br#"{"count":-1}"#, Some(&schema), &resolver)
        .unwrap();
    assert_eq!(decoded, invalid);
}

#[test]
fn test_protobuf_has_no_codec() {
    let err = get_serdes(SchemaType::Protobuf).err().unwrap();
    assert!(matches!(err, SerdeError::UnsupportedOperation { .. }));
}
