//! Serializer and deserializer registry
//!
//! Maps the Kafka client codec class names a producer or consumer declares to the functions
//! that implement them, together with each codec's native schema type and whether its payloads
//! carry the 5-byte schema registry prefix.
//!
//! Selection rule for both directions: a non-empty raw schema selects Avro regardless of the
//! declared name; otherwise the declared name is looked up exactly; unknown names fall back to
//! the string codec.

use crate::serdes::config::SerdeConfig;
use crate::serdes::error::{SerdeError, SerdeResult};
use crate::serdes::schema::{
    get_subject_name, Element, ReferenceResolver, Schema, SchemaCache, SchemaRegistry, SchemaType,
};
use crate::serdes::serialization::coercion::to_json_object;
use crate::serdes::serialization::wire_format;
use crate::serdes::serialization::{
    AvroSerde, ByteArraySerde, GenericValue, JsonSerde, Serdes, StringSerde,
};
use std::fmt;
use std::sync::Arc;

pub const STRING_SERIALIZER: &str = "org.apache.kafka.common.serialization.StringSerializer";
pub const STRING_DESERIALIZER: &str = "org.apache.kafka.common.serialization.StringDeserializer";
pub const BYTE_ARRAY_SERIALIZER: &str = "org.apache.kafka.common.serialization.ByteArraySerializer";
pub const BYTE_ARRAY_DESERIALIZER: &str =
    "org.apache.kafka.common.serialization.ByteArrayDeserializer";
pub const AVRO_SERIALIZER: &str = "io.confluent.kafka.serializers.KafkaAvroSerializer";
pub const AVRO_DESERIALIZER: &str = "io.confluent.kafka.serializers.KafkaAvroDeserializer";
pub const JSON_SCHEMA_SERIALIZER: &str =
    "io.confluent.kafka.serializers.json.KafkaJsonSchemaSerializer";
pub const JSON_SCHEMA_DESERIALIZER: &str =
    "io.confluent.kafka.serializers.json.KafkaJsonSchemaDeserializer";
pub const PROTOBUF_SERIALIZER: &str =
    "io.confluent.kafka.serializers.protobuf.KafkaProtobufSerializer";
pub const PROTOBUF_DESERIALIZER: &str =
    "io.confluent.kafka.serializers.protobuf.KafkaProtobufDeserializer";

/// Encode `data` for `topic`/`element`, given the declared schema text and registry version
pub type SerializerFn = fn(
    &SerdeContext<'_>,
    &GenericValue,
    &str,
    &str,
    Element,
    i32,
) -> SerdeResult<Vec<u8>>;

/// Decode `data` from `topic`/`element`, given the declared schema text and registry version
pub type DeserializerFn =
    fn(&SerdeContext<'_>, &[u8], &str, &str, Element, i32) -> SerdeResult<GenericValue>;

/// Everything a registry codec function may consult
pub struct SerdeContext<'a> {
    pub cache: &'a SchemaCache,
    pub registry: Option<&'a dyn SchemaRegistry>,
    pub config: &'a SerdeConfig,
}

impl<'a> SerdeContext<'a> {
    pub fn new(cache: &'a SchemaCache, config: &'a SerdeConfig) -> Self {
        Self {
            cache,
            registry: None,
            config,
        }
    }

    pub fn with_registry(mut self, registry: &'a dyn SchemaRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Reference resolver over this context's cache and registry
    pub fn resolver(&self) -> ReferenceResolver<'a> {
        let resolver = ReferenceResolver::new(self.cache);
        match self.registry {
            Some(registry) => resolver.with_registry(registry),
            None => resolver,
        }
    }
}

/// One registry entry
#[derive(Clone, Copy)]
pub struct SerdeType<F> {
    pub name: &'static str,
    /// `None` for codecs with no implementation
    pub function: Option<F>,
    pub schema_type: SchemaType,
    pub wire_formatted: bool,
}

impl<F> fmt::Debug for SerdeType<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerdeType")
            .field("name", &self.name)
            .field("implemented", &self.function.is_some())
            .field("schema_type", &self.schema_type)
            .field("wire_formatted", &self.wire_formatted)
            .finish()
    }
}

pub type SerializerType = SerdeType<SerializerFn>;
pub type DeserializerType = SerdeType<DeserializerFn>;

impl SerdeType<SerializerFn> {
    pub fn serialize(
        &self,
        context: &SerdeContext<'_>,
        data: &GenericValue,
        schema: &str,
        topic: &str,
        element: Element,
        version: i32,
    ) -> SerdeResult<Vec<u8>> {
        let function = self.function.ok_or_else(|| not_implemented(self.name))?;
        function(context, data, schema, topic, element, version)
    }
}

impl SerdeType<DeserializerFn> {
    pub fn deserialize(
        &self,
        context: &SerdeContext<'_>,
        data: &[u8],
        schema: &str,
        topic: &str,
        element: Element,
        version: i32,
    ) -> SerdeResult<GenericValue> {
        let function = self.function.ok_or_else(|| not_implemented(self.name))?;
        function(context, data, schema, topic, element, version)
    }
}

fn not_implemented(name: &str) -> SerdeError {
    SerdeError::unsupported(format!("{} is not implemented", name))
}

static STRING_SERIALIZER_TYPE: SerializerType = SerdeType {
    name: STRING_SERIALIZER,
    function: Some(serialize_string as SerializerFn),
    schema_type: SchemaType::String,
    wire_formatted: false,
};
static BYTE_ARRAY_SERIALIZER_TYPE: SerializerType = SerdeType {
    name: BYTE_ARRAY_SERIALIZER,
    function: Some(serialize_byte_array as SerializerFn),
    schema_type: SchemaType::Bytes,
    wire_formatted: false,
};
static AVRO_SERIALIZER_TYPE: SerializerType = SerdeType {
    name: AVRO_SERIALIZER,
    function: Some(serialize_avro as SerializerFn),
    schema_type: SchemaType::Avro,
    wire_formatted: true,
};
static PROTOBUF_SERIALIZER_TYPE: SerializerType = SerdeType {
    name: PROTOBUF_SERIALIZER,
    function: None,
    schema_type: SchemaType::Protobuf,
    wire_formatted: true,
};
static JSON_SCHEMA_SERIALIZER_TYPE: SerializerType = SerdeType {
    name: JSON_SCHEMA_SERIALIZER,
    function: Some(serialize_json_schema as SerializerFn),
    schema_type: SchemaType::Json,
    wire_formatted: true,
};

static STRING_DESERIALIZER_TYPE: DeserializerType = SerdeType {
    name: STRING_DESERIALIZER,
    function: Some(deserialize_string as DeserializerFn),
    schema_type: SchemaType::String,
    wire_formatted: false,
};
static BYTE_ARRAY_DESERIALIZER_TYPE: DeserializerType = SerdeType {
    name: BYTE_ARRAY_DESERIALIZER,
    function: Some(deserialize_byte_array as DeserializerFn),
    schema_type: SchemaType::Bytes,
    wire_formatted: false,
};
static AVRO_DESERIALIZER_TYPE: DeserializerType = SerdeType {
    name: AVRO_DESERIALIZER,
    function: Some(deserialize_avro as DeserializerFn),
    schema_type: SchemaType::Avro,
    wire_formatted: true,
};
static PROTOBUF_DESERIALIZER_TYPE: DeserializerType = SerdeType {
    name: PROTOBUF_DESERIALIZER,
    function: None,
    schema_type: SchemaType::Protobuf,
    wire_formatted: true,
};
static JSON_SCHEMA_DESERIALIZER_TYPE: DeserializerType = SerdeType {
    name: JSON_SCHEMA_DESERIALIZER,
    function: Some(deserialize_json_schema as DeserializerFn),
    schema_type: SchemaType::Json,
    wire_formatted: true,
};

static SERIALIZERS: [&SerializerType; 5] = [
    &STRING_SERIALIZER_TYPE,
    &BYTE_ARRAY_SERIALIZER_TYPE,
    &AVRO_SERIALIZER_TYPE,
    &PROTOBUF_SERIALIZER_TYPE,
    &JSON_SCHEMA_SERIALIZER_TYPE,
];

static DESERIALIZERS: [&DeserializerType; 5] = [
    &STRING_DESERIALIZER_TYPE,
    &BYTE_ARRAY_DESERIALIZER_TYPE,
    &AVRO_DESERIALIZER_TYPE,
    &PROTOBUF_DESERIALIZER_TYPE,
    &JSON_SCHEMA_DESERIALIZER_TYPE,
];

/// All registered serializers
pub fn serializers() -> &'static [&'static SerializerType] {
    &SERIALIZERS
}

/// All registered deserializers
pub fn deserializers() -> &'static [&'static DeserializerType] {
    &DESERIALIZERS
}

/// Select the serializer for a declared codec name and raw schema text
pub fn get_serializer(declared: &str, schema: &str) -> &'static SerializerType {
    if !schema.is_empty() {
        return &AVRO_SERIALIZER_TYPE;
    }
    SERIALIZERS
        .iter()
        .copied()
        .find(|entry| entry.name == declared)
        .unwrap_or(&STRING_SERIALIZER_TYPE)
}

/// Select the deserializer for a declared codec name and raw schema text
pub fn get_deserializer(declared: &str, schema: &str) -> &'static DeserializerType {
    if !schema.is_empty() {
        return &AVRO_DESERIALIZER_TYPE;
    }
    DESERIALIZERS
        .iter()
        .copied()
        .find(|entry| entry.name == declared)
        .unwrap_or(&STRING_DESERIALIZER_TYPE)
}

/// Whether the named codec frames its payloads; false for unknown names
pub fn is_wire_formatted(name: &str) -> bool {
    SERIALIZERS
        .iter()
        .map(|entry| (entry.name, entry.wire_formatted))
        .chain(DESERIALIZERS.iter().map(|entry| (entry.name, entry.wire_formatted)))
        .any(|(entry_name, wire_formatted)| entry_name == name && wire_formatted)
}

/// Native schema type of the named codec
pub fn schema_type_of(name: &str) -> Option<SchemaType> {
    SERIALIZERS
        .iter()
        .map(|entry| (entry.name, entry.schema_type))
        .chain(DESERIALIZERS.iter().map(|entry| (entry.name, entry.schema_type)))
        .find(|(entry_name, _)| *entry_name == name)
        .map(|(_, schema_type)| schema_type)
}

fn serialize_string(
    context: &SerdeContext<'_>,
    data: &GenericValue,
    _schema: &str,
    _topic: &str,
    _element: Element,
    _version: i32,
) -> SerdeResult<Vec<u8>> {
    StringSerde.serialize(data, None, &context.resolver())
}

fn deserialize_string(
    context: &SerdeContext<'_>,
    data: &[u8],
    _schema: &str,
    _topic: &str,
    _element: Element,
    _version: i32,
) -> SerdeResult<GenericValue> {
    StringSerde.deserialize(data, None, &context.resolver())
}

fn serialize_byte_array(
    context: &SerdeContext<'_>,
    data: &GenericValue,
    _schema: &str,
    _topic: &str,
    _element: Element,
    _version: i32,
) -> SerdeResult<Vec<u8>> {
    ByteArraySerde.serialize(data, None, &context.resolver())
}

fn deserialize_byte_array(
    context: &SerdeContext<'_>,
    data: &[u8],
    _schema: &str,
    _topic: &str,
    _element: Element,
    _version: i32,
) -> SerdeResult<GenericValue> {
    ByteArraySerde.deserialize(data, None, &context.resolver())
}

fn serialize_avro(
    context: &SerdeContext<'_>,
    data: &GenericValue,
    schema: &str,
    topic: &str,
    element: Element,
    version: i32,
) -> SerdeResult<Vec<u8>> {
    let subject = subject_for(context, schema, topic, element)?;
    let writer = writer_schema(context, &subject, schema, SchemaType::Avro, version)?
        .ok_or_else(|| {
            SerdeError::invalid_schema(format!(
                "No Avro schema given and none available for subject '{}'",
                subject
            ))
        })?;

    let payload = AvroSerde.serialize(data, Some(&*writer), &context.resolver())?;
    Ok(wire_format::encode(&payload, writer.id))
}

fn deserialize_avro(
    context: &SerdeContext<'_>,
    data: &[u8],
    schema: &str,
    topic: &str,
    element: Element,
    version: i32,
) -> SerdeResult<GenericValue> {
    let (id, payload) = wire_format::decode_with_id(data).map_err(SerdeError::wire_format)?;
    let subject = subject_for(context, schema, topic, element)?;
    let reader = reader_schema(context, &subject, id, schema, SchemaType::Avro, version)?
        .ok_or_else(|| {
            SerdeError::invalid_schema(format!(
                "No Avro schema given and none available for subject '{}'",
                subject
            ))
        })?;

    AvroSerde.deserialize(payload, Some(&*reader), &context.resolver())
}

fn serialize_json_schema(
    context: &SerdeContext<'_>,
    data: &GenericValue,
    schema: &str,
    topic: &str,
    element: Element,
    version: i32,
) -> SerdeResult<Vec<u8>> {
    // JSON text is accepted in place of an object
    let parsed;
    let data = match data {
        GenericValue::String(text) => {
            parsed = to_json_object(text.as_bytes())?;
            &parsed
        }
        other => other,
    };

    let subject = subject_for(context, schema, topic, element)?;
    let writer = writer_schema(context, &subject, schema, SchemaType::Json, version)?;
    let payload = JsonSerde.serialize(data, writer.as_deref(), &context.resolver())?;
    let schema_id = writer.map_or(0, |writer| writer.id);
    Ok(wire_format::encode(&payload, schema_id))
}

fn deserialize_json_schema(
    context: &SerdeContext<'_>,
    data: &[u8],
    schema: &str,
    topic: &str,
    element: Element,
    version: i32,
) -> SerdeResult<GenericValue> {
    let (id, payload) = wire_format::decode_with_id(data).map_err(SerdeError::wire_format)?;
    let subject = subject_for(context, schema, topic, element)?;
    let reader = reader_schema(context, &subject, id, schema, SchemaType::Json, version)?;
    JsonSerde.deserialize(payload, reader.as_deref(), &context.resolver())
}

fn subject_for(
    context: &SerdeContext<'_>,
    schema: &str,
    topic: &str,
    element: Element,
) -> SerdeResult<String> {
    get_subject_name(schema, topic, element, context.config.subject_name_strategy)
}

/// Schema to encode with
///
/// Registers the given text (or fetches the subject's latest / requested version when no text
/// is given or `use_latest` is set). When the registry is missing or fails and schema text was
/// given, falls back to a local schema with id 0; payloads are still framed, with id 0.
fn writer_schema(
    context: &SerdeContext<'_>,
    subject: &str,
    schema: &str,
    schema_type: SchemaType,
    version: i32,
) -> SerdeResult<Option<Arc<Schema>>> {
    let registry_config = &context.config.schema_registry;
    if registry_config.cache_schemas {
        if let Some(cached) = context.cache.get(subject) {
            let reusable = cached.schema_type == schema_type
                && (schema.is_empty() || (!registry_config.use_latest && cached.schema == schema));
            if reusable {
                log::debug!("Using cached schema id {} for subject '{}'", cached.id, subject);
                return Ok(Some(cached));
            }
        }
    }

    let fetched = match context.registry {
        Some(registry) if !schema.is_empty() && !registry_config.use_latest => {
            registry.register(subject, schema, schema_type)
        }
        Some(registry) => registry.get_schema(subject, version),
        None => Err(SerdeError::SchemaNotFound {
            subject: subject.to_string(),
            message: "no schema registry configured".to_string(),
        }),
    };

    match fetched {
        Ok(found) => {
            let found = Arc::new(found.with_caching(registry_config.cache_schemas));
            context.cache.insert(subject, Arc::clone(&found));
            Ok(Some(found))
        }
        Err(e) if !schema.is_empty() => {
            log::warn!(
                "Failed to create or get schema for subject '{}', encoding without registry: {}",
                subject,
                e
            );
            Ok(Some(local_schema(context, subject, schema, schema_type)))
        }
        Err(e) if context.registry.is_none() => {
            log::debug!("No schema for subject '{}': {}", subject, e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Schema to decode with
///
/// A non-zero frame id is resolved through the cache (by subject) and then the registry; with
/// no usable id the declared text or the subject's registered schema is used. Schemas fetched
/// by id are not written to the cache.
fn reader_schema(
    context: &SerdeContext<'_>,
    subject: &str,
    id: u32,
    schema: &str,
    schema_type: SchemaType,
    version: i32,
) -> SerdeResult<Option<Arc<Schema>>> {
    if id != 0 {
        if let Some(registry) = context.registry {
            if let Some(cached) = context.cache.get(subject).filter(|cached| cached.id == id) {
                log::debug!("Writer schema id {} found in cache for '{}'", id, subject);
                return Ok(Some(cached));
            }
            match registry.fetch_by_id(id) {
                // the subject entry tracks the writer side; an older id must not replace it
                Ok(found) => return Ok(Some(Arc::new(found))),
                Err(e) if !schema.is_empty() => {
                    log::warn!(
                        "Writer schema id {} unavailable, decoding with the given schema: {}",
                        id,
                        e
                    );
                    return Ok(Some(local_schema(context, subject, schema, schema_type)));
                }
                Err(e) => return Err(e),
            }
        }
    }

    if !schema.is_empty() && context.registry.is_none() {
        return Ok(Some(local_schema(context, subject, schema, schema_type)));
    }
    writer_schema(context, subject, schema, schema_type, version)
}

fn local_schema(
    context: &SerdeContext<'_>,
    subject: &str,
    schema: &str,
    schema_type: SchemaType,
) -> Arc<Schema> {
    Arc::new(
        Schema::new(0, schema, schema_type, subject)
            .with_caching(context.config.schema_registry.cache_schemas),
    )
}
