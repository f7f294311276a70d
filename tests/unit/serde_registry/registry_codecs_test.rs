use crate::unit::test_utils::{init_logger, EVENT_SCHEMA, ORDER_SCHEMA, USER_SCHEMA};
use serde_json::json;
use velostream_serdes::serdes::schema::{
    Element, InMemorySchemaRegistry, Schema, SchemaCache, SchemaRegistry, SchemaType,
    SubjectNameStrategy,
};
use velostream_serdes::serdes::serde_registry::*;
use velostream_serdes::serdes::serialization::{serialize_to_avro, wire_format, GenericValue};
use velostream_serdes::{SerdeConfig, SerdeError, SerdeResult};

const NUMBERS_SCHEMA: &str =
    r#"{"type":"object","properties":{"n":{"type":"integer"}},"required":["n"]}"#;

/// EVENT_SCHEMA plus a defaulted field
const EVENT_V2_SCHEMA: &str = r#"{"type":"record","name":"Event","namespace":"com.example",
    "fields":[{"name":"id","type":"int"},
              {"name":"optional","type":["null","string"],"default":null},
              {"name":"enumField","type":["null",{"type":"enum","name":"Status","symbols":["ACTIVE","INACTIVE"]}],"default":null},
              {"name":"source","type":"string","default":"unknown"}]}"#;

fn event() -> GenericValue {
    GenericValue::from(json!({"id": 5.0, "optional": "x", "enumField": "ACTIVE"}))
}

fn expected_event() -> GenericValue {
    GenericValue::from(json!({"id": 5, "optional": "x", "enumField": "ACTIVE"}))
}

/// Registry whose every call fails
struct UnavailableRegistry;

impl SchemaRegistry for UnavailableRegistry {
    fn fetch_latest(&self, subject: &str) -> SerdeResult<Schema> {
        Err(unavailable(subject))
    }

    fn fetch_by_version(&self, subject: &str, _version: i32) -> SerdeResult<Schema> {
        Err(unavailable(subject))
    }

    fn fetch_by_id(&self, id: u32) -> SerdeResult<Schema> {
        Err(unavailable(&format!("id {}", id)))
    }

    fn register(&self, subject: &str, _schema: &str, _schema_type: SchemaType) -> SerdeResult<Schema> {
        Err(SerdeError::SchemaCreationFailed {
            subject: subject.to_string(),
            message: "registry unavailable".to_string(),
        })
    }
}

fn unavailable(subject: &str) -> SerdeError {
    SerdeError::SchemaNotFound {
        subject: subject.to_string(),
        message: "registry unavailable".to_string(),
    }
}

#[test]
fn test_avro_serializer_registers_and_frames() {
    init_logger();
    let registry = InMemorySchemaRegistry::new();
    let cache = SchemaCache::new();
    let config = SerdeConfig::default();
    let context = SerdeContext::new(&cache, &config).with_registry(&registry);

    let bytes = get_serializer(AVRO_SERIALIZER, EVENT_SCHEMA)
        .serialize(&context, &event(), EVENT_SCHEMA, "events", Element::Value, 0)
        .unwrap();
    let registered = registry.fetch_latest("events-value").unwrap();
    assert_eq!(wire_format::schema_id(&bytes).unwrap(), registered.id);

    let decoded = get_deserializer(AVRO_DESERIALIZER, "")
        .deserialize(&context, &bytes, "", "events", Element::Value, 0)
        .unwrap();
    assert_eq!(
        decoded,
        GenericValue::from(json!({"id": 5, "optional": "x", "enumField": "ACTIVE"}))
    );
}

#[test]
fn test_avro_serializer_uses_subject_name_strategy() {
    let registry = InMemorySchemaRegistry::new();
    let cache = SchemaCache::new();
    let config = SerdeConfig {
        subject_name_strategy: SubjectNameStrategy::TopicRecordNameStrategy,
        ..SerdeConfig::default()
    };
    let context = SerdeContext::new(&cache, &config).with_registry(&registry);

    get_serializer(AVRO_SERIALIZER, EVENT_SCHEMA)
        .serialize(&context, &event(), EVENT_SCHEMA, "events", Element::Value, 0)
        .unwrap();
    assert!(registry.fetch_latest("events-com.example.Event").is_ok());
    assert!(registry.fetch_latest("events-value").is_err());
}

#[test]
fn test_avro_without_registry_frames_with_id_zero() {
    let cache = SchemaCache::new();
    let config = SerdeConfig::default();
    let context = SerdeContext::new(&cache, &config);

    let bytes = get_serializer(AVRO_SERIALIZER, EVENT_SCHEMA)
        .serialize(&context, &event(), EVENT_SCHEMA, "events", Element::Value, 0)
        .unwrap();
    assert_eq!(&bytes[..5], &[0u8, 0, 0, 0, 0]);
    // zigzag(5)
    assert_eq!(bytes[5], 10);

    let decoded = get_deserializer(AVRO_DESERIALIZER, EVENT_SCHEMA)
        .deserialize(&context, &bytes, EVENT_SCHEMA, "events", Element::Value, 0)
        .unwrap();
    assert_eq!(decoded, expected_event());
}

#[test]
fn test_json_schema_without_registry_round_trip() {
    let cache = SchemaCache::new();
    let config = SerdeConfig::default();
    let context = SerdeContext::new(&cache, &config);

    let bytes = get_serializer(JSON_SCHEMA_SERIALIZER, "")
        .serialize(&context, &GenericValue::from(json!({"n": 2})), NUMBERS_SCHEMA, "nums", Element::Value, 0)
        .unwrap();
    assert_eq!(wire_format::schema_id(&bytes).unwrap(), 0);

    let decoded = get_deserializer(JSON_SCHEMA_DESERIALIZER, "")
        .deserialize(&context, &bytes, NUMBERS_SCHEMA, "nums", Element::Value, 0)
        .unwrap();
    assert_eq!(decoded, GenericValue::from(json!({"n": 2})));
}

#[test]
fn test_failing_registry_falls_back_to_local_schema() {
    init_logger();
    let registry = UnavailableRegistry;
    let cache = SchemaCache::new();
    let config = SerdeConfig::default();
    let context = SerdeContext::new(&cache, &config).with_registry(&registry);

    let bytes = get_serializer(AVRO_SERIALIZER, EVENT_SCHEMA)
        .serialize(&context, &event(), EVENT_SCHEMA, "events", Element::Value, 0)
        .unwrap();
    assert_eq!(wire_format::schema_id(&bytes).unwrap(), 0);
    let decoded = get_deserializer(AVRO_DESERIALIZER, EVENT_SCHEMA)
        .deserialize(&context, &bytes, EVENT_SCHEMA, "events", Element::Value, 0)
        .unwrap();
    assert_eq!(decoded, expected_event());

    let bytes = get_serializer(JSON_SCHEMA_SERIALIZER, "")
        .serialize(&context, &GenericValue::from(json!({"n": 8})), NUMBERS_SCHEMA, "nums", Element::Value, 0)
        .unwrap();
    let decoded = get_deserializer(JSON_SCHEMA_DESERIALIZER, "")
        .deserialize(&context, &bytes, NUMBERS_SCHEMA, "nums", Element::Value, 0)
        .unwrap();
    assert_eq!(decoded, GenericValue::from(json!({"n": 8})));
}

#[test]
fn test_decoding_an_older_version_keeps_the_cached_latest() {
    let registry = InMemorySchemaRegistry::new();
    let v1 = registry
        .register("events-value", EVENT_SCHEMA, SchemaType::Avro)
        .unwrap();
    let v2 = registry
        .register("events-value", EVENT_V2_SCHEMA, SchemaType::Avro)
        .unwrap();
    let cache = SchemaCache::new();
    let mut config = SerdeConfig::default();
    config.schema_registry.cache_schemas = true;
    let context = SerdeContext::new(&cache, &config).with_registry(&registry);

    let old_message = wire_format::encode(
        &serialize_to_avro(&event(), EVENT_SCHEMA).unwrap(),
        v1.id,
    );
    let decoded = get_deserializer(AVRO_DESERIALIZER, "")
        .deserialize(&context, &old_message, "", "events", Element::Value, 0)
        .unwrap();
    assert_eq!(decoded, expected_event());
    assert!(cache.get("events-value").is_none());

    // no text given: encodes with the latest registered schema
    let bytes = get_serializer(AVRO_SERIALIZER, "")
        .serialize(&context, &event(), "", "events", Element::Value, 0)
        .unwrap();
    assert_eq!(wire_format::schema_id(&bytes).unwrap(), v2.id);
    assert_eq!(cache.get("events-value").unwrap().id, v2.id);

    get_deserializer(AVRO_DESERIALIZER, "")
        .deserialize(&context, &old_message, "", "events", Element::Value, 0)
        .unwrap();
    assert_eq!(cache.get("events-value").unwrap().id, v2.id);
}

#[test]
fn test_avro_without_schema_or_registry_fails() {
    let cache = SchemaCache::new();
    let config = SerdeConfig::default();
    let context = SerdeContext::new(&cache, &config);
    let err = get_serializer(AVRO_SERIALIZER, "")
        .serialize(&context, &event(), "", "events", Element::Value, 0)
        .unwrap_err();
    assert!(matches!(err, SerdeError::InvalidSchema { .. }));
}

#[test]
fn test_avro_fetches_latest_when_no_schema_given() {
    let registry = InMemorySchemaRegistry::new();
    let registered = registry
        .register("events-value", EVENT_SCHEMA, SchemaType::Avro)
        .unwrap();
    let cache = SchemaCache::new();
    let config = SerdeConfig::default();
    let context = SerdeContext::new(&cache, &config).with_registry(&registry);

    let bytes = get_serializer(AVRO_SERIALIZER, "")
        .serialize(&context, &event(), "", "events", Element::Value, 0)
        .unwrap();
    assert_eq!(wire_format::schema_id(&bytes).unwrap(), registered.id);
}

#[test]
fn test_cached_schemas_skip_the_registry() {
    let registry = InMemorySchemaRegistry::new();
    let cache = SchemaCache::new();
    let mut config = SerdeConfig::default();
    config.schema_registry.cache_schemas = true;
    let context = SerdeContext::new(&cache, &config).with_registry(&registry);
    let serializer = get_serializer(AVRO_SERIALIZER, EVENT_SCHEMA);

    serializer
        .serialize(&context, &event(), EVENT_SCHEMA, "events", Element::Value, 0)
        .unwrap();
    let after_first = registry.request_count();
    serializer
        .serialize(&context, &event(), EVENT_SCHEMA, "events", Element::Value, 0)
        .unwrap();
    assert_eq!(registry.request_count(), after_first);
    assert!(cache.get("events-value").unwrap().is_compiled());
}

#[test]
fn test_avro_deserializer_requires_wire_format() {
    let cache = SchemaCache::new();
    let config = SerdeConfig::default();
    let context = SerdeContext::new(&cache, &config);
    let err = get_deserializer(AVRO_DESERIALIZER, EVENT_SCHEMA)
        .deserialize(&context, &[0, 1], EVENT_SCHEMA, "events", Element::Value, 0)
        .unwrap_err();
    assert!(matches!(err, SerdeError::FailedDecodeFromWireFormat { .. }));
    assert_eq!(err.code(), 2001);
}

#[test]
fn test_avro_serializer_resolves_references_through_registry() {
    let registry = InMemorySchemaRegistry::new();
    registry
        .register("user-value", USER_SCHEMA, SchemaType::Avro)
        .unwrap();
    registry
        .register_with_references(
            "orders-value",
            ORDER_SCHEMA,
            SchemaType::Avro,
            &[velostream_serdes::serdes::schema::SchemaReference::new(
                "com.example.User",
                "user-value",
                0,
            )],
        )
        .unwrap();

    let cache = SchemaCache::new();
    let mut config = SerdeConfig::default();
    config.schema_registry.use_latest = true;
    let context = SerdeContext::new(&cache, &config).with_registry(&registry);

    let order = GenericValue::from(json!({"orderId": 1, "buyer": {"name": "Ada"}, "total": 3.5}));
    let bytes = get_serializer(AVRO_SERIALIZER, ORDER_SCHEMA)
        .serialize(&context, &order, ORDER_SCHEMA, "orders", Element::Value, 0)
        .unwrap();
    let decoded = get_deserializer(AVRO_DESERIALIZER, "")
        .deserialize(&context, &bytes, "", "orders", Element::Value, 0)
        .unwrap();
    assert_eq!(
        decoded,
        GenericValue::from(json!({"orderId": 1, "buyer": {"name": "Ada", "email": null}, "total": 3.5}))
    );
}

#[test]
fn test_json_schema_serializer_round_trip() {
    let registry = InMemorySchemaRegistry::new();
    let cache = SchemaCache::new();
    let config = SerdeConfig::default();
    let context = SerdeContext::new(&cache, &config).with_registry(&registry);
    let schema = r#"{"type":"object","properties":{"n":{"type":"integer"}},"required":["n"]}"#;

    let serializer = get_serializer(JSON_SCHEMA_SERIALIZER, "");
    let bytes = serializer
        .serialize(&context, &GenericValue::from(r#"{"n": 4}"#), schema, "nums", Element::Value, 0)
        .unwrap();
    assert_eq!(&bytes[5..], br#"{"n":4}"#);

    let err = serializer
        .serialize(&context, &GenericValue::from(json!({"n": "four"})), schema, "nums", Element::Value, 0)
        .unwrap_err();
    assert!(matches!(err, SerdeError::FailedValidateJson { .. }));

    let decoded = get_deserializer(JSON_SCHEMA_DESERIALIZER, "")
        .deserialize(&context, &bytes, "", "nums", Element::Value, 0)
        .unwrap();
    assert_eq!(decoded, GenericValue::from(json!({"n": 4})));
}
