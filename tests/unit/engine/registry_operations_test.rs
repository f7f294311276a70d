use crate::unit::test_utils::{init_logger, EVENT_SCHEMA, ORDER_SCHEMA, USER_SCHEMA};
use serde_json::json;
use std::sync::Arc;
use velostream_serdes::serdes::schema::{
    Element, InMemorySchemaRegistry, SchemaReference, SchemaRegistry, SchemaType,
    SubjectNameStrategy,
};
use velostream_serdes::serdes::serde_registry::{AVRO_DESERIALIZER, AVRO_SERIALIZER, STRING_SERIALIZER};
use velostream_serdes::serdes::serialization::{wire_format, GenericValue};
use velostream_serdes::{Container, SerdeConfig, SerdeEngine, SerdeError};

fn engine_with_registry(config: SerdeConfig) -> (SerdeEngine, Arc<InMemorySchemaRegistry>) {
    let registry = Arc::new(InMemorySchemaRegistry::new());
    let engine = SerdeEngine::new(config).with_registry(registry.clone());
    (engine, registry)
}

fn caching_config() -> SerdeConfig {
    let mut config = SerdeConfig::default();
    config.schema_registry.url = "http://localhost:8081".to_string();
    config.schema_registry.cache_schemas = true;
    config
}

#[test]
fn test_get_schema_without_registry_is_a_configuration_error() {
    let engine = SerdeEngine::default();
    let err = engine.get_schema("events-value", 0).unwrap_err();
    assert!(matches!(err, SerdeError::Configuration { .. }));
    let err = engine
        .create_schema("events-value", EVENT_SCHEMA, SchemaType::Avro, &[])
        .unwrap_err();
    assert_eq!(err.code(), 1001);
}

#[test]
fn test_get_schema_is_served_from_cache() {
    init_logger();
    let (engine, registry) = engine_with_registry(caching_config());
    let created = engine
        .create_schema("events-value", EVENT_SCHEMA, SchemaType::Avro, &[])
        .unwrap();
    assert!(created.enable_caching);
    let requests = registry.request_count();

    let fetched = engine.get_schema("events-value", 0).unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(engine.get_schema("events-value", 1).unwrap().version, 1);
    assert_eq!(registry.request_count(), requests);

    // the cached entry is version 1
    engine.get_schema("events-value", 2).unwrap_err();
    assert_eq!(registry.request_count(), requests + 1);
}

#[test]
fn test_get_schema_without_caching_always_asks_registry() {
    let (engine, registry) = engine_with_registry(SerdeConfig::default());
    registry
        .register("events-value", EVENT_SCHEMA, SchemaType::Avro)
        .unwrap();
    let before = registry.request_count();

    engine.get_schema("events-value", 0).unwrap();
    engine.get_schema("events-value", 0).unwrap();
    assert_eq!(registry.request_count(), before + 2);
    assert!(engine.cache().is_empty());
}

#[test]
fn test_missing_subject_is_not_found() {
    let (engine, _registry) = engine_with_registry(SerdeConfig::default());
    let err = engine.get_schema("nope", 0).unwrap_err();
    assert!(matches!(err, SerdeError::SchemaNotFound { .. }));
}

#[test]
fn test_create_schema_failure_maps_to_creation_error() {
    let (engine, _registry) = engine_with_registry(SerdeConfig::default());
    let err = engine
        .create_schema("events-value", "", SchemaType::Avro, &[])
        .unwrap_err();
    assert!(matches!(err, SerdeError::SchemaCreationFailed { .. }));
}

#[test]
fn test_container_with_registered_references() {
    let (engine, _registry) = engine_with_registry(SerdeConfig::default());
    engine
        .create_schema("user-value", USER_SCHEMA, SchemaType::Avro, &[])
        .unwrap();
    let order = engine
        .create_schema(
            "orders-value",
            ORDER_SCHEMA,
            SchemaType::Avro,
            &[SchemaReference::new("com.example.User", "user-value", 1)],
        )
        .unwrap();

    let value = GenericValue::from(json!({
        "orderId": 99,
        "buyer": {"name": "Grace", "email": "grace@example.com"},
        "total": 12.25
    }));
    let bytes = engine
        .serialize(&Container::new(value.clone(), SchemaType::Avro).with_schema(Arc::clone(&order)))
        .unwrap();
    assert_eq!(wire_format::schema_id(&bytes).unwrap(), order.id);

    let decoded = engine
        .deserialize(&Container::new(bytes, SchemaType::Avro).with_schema(order))
        .unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn test_subject_name_uses_configured_strategy() {
    let config = SerdeConfig {
        subject_name_strategy: SubjectNameStrategy::RecordNameStrategy,
        ..SerdeConfig::default()
    };
    let engine = SerdeEngine::new(config);
    assert_eq!(
        engine
            .get_subject_name(EVENT_SCHEMA, "events", Element::Value)
            .unwrap(),
        "com.example.Event"
    );
    assert_eq!(
        SerdeEngine::default()
            .get_subject_name(EVENT_SCHEMA, "events", Element::Key)
            .unwrap(),
        "events-key"
    );
}

#[test]
fn test_serialize_with_configured_codecs() {
    let mut config = SerdeConfig::default();
    config.producer.key_serializer = STRING_SERIALIZER.to_string();
    config.producer.value_serializer = AVRO_SERIALIZER.to_string();
    config.consumer.value_deserializer = AVRO_DESERIALIZER.to_string();
    let (engine, registry) = engine_with_registry(config);

    let key = engine
        .serialize_with(&GenericValue::from("order-1"), "", "events", Element::Key, 0)
        .unwrap();
    assert_eq!(key, b"order-1");

    let event = GenericValue::from(json!({"id": 1, "optional": "o", "enumField": null}));
    let value = engine
        .serialize_with(&event, EVENT_SCHEMA, "events", Element::Value, 0)
        .unwrap();
    let registered = registry.fetch_latest("events-value").unwrap();
    assert_eq!(wire_format::schema_id(&value).unwrap(), registered.id);

    let decoded = engine
        .deserialize_with(&value, "", "events", Element::Value, 0)
        .unwrap();
    assert_eq!(decoded, event);
}

#[test]
fn test_unset_codec_names_fall_back_to_string() {
    let engine = SerdeEngine::default();
    let bytes = engine
        .serialize_with(&GenericValue::from("plain"), "", "t", Element::Value, 0)
        .unwrap();
    assert_eq!(bytes, b"plain");
    let value = engine
        .deserialize_with(&bytes, "", "t", Element::Value, 0)
        .unwrap();
    assert_eq!(value, GenericValue::from("plain"));
}
