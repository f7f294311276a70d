//! Container-level serde engine
//!
//! The engine owns the schema cache and the optional registry collaborator. Callers hand it a
//! [`Container`] (payload, optional schema, schema type) and get wire bytes back, or the
//! reverse.

use crate::serdes::config::SerdeConfig;
use crate::serdes::error::{SerdeError, SerdeResult};
use crate::serdes::schema::{
    get_subject_name, Element, ReferenceResolver, Schema, SchemaCache, SchemaReference,
    SchemaRegistry, SchemaType,
};
use crate::serdes::serde_registry::{get_deserializer, get_serializer, SerdeContext};
use crate::serdes::serialization::coercion::{
    base64_to_bytes, is_base64_encoded, is_json, to_byte_array, to_json_object,
};
use crate::serdes::serialization::{get_serdes, wire_format, GenericValue, Serdes};
use std::borrow::Cow;
use std::sync::Arc;

/// Payload plus the schema metadata needed to (de)serialize it
#[derive(Debug, Clone)]
pub struct Container {
    pub data: GenericValue,
    pub schema: Option<Arc<Schema>>,
    pub schema_type: SchemaType,
}

impl Container {
    pub fn new(data: impl Into<GenericValue>, schema_type: SchemaType) -> Self {
        Self {
            data: data.into(),
            schema: None,
            schema_type,
        }
    }

    pub fn with_schema(mut self, schema: Arc<Schema>) -> Self {
        self.schema = Some(schema);
        self
    }
}

/// Top-level transcoding engine
pub struct SerdeEngine {
    cache: SchemaCache,
    registry: Option<Arc<dyn SchemaRegistry>>,
    config: SerdeConfig,
}

impl Default for SerdeEngine {
    fn default() -> Self {
        Self::new(SerdeConfig::default())
    }
}

impl SerdeEngine {
    pub fn new(config: SerdeConfig) -> Self {
        Self {
            cache: SchemaCache::new(),
            registry: None,
            config,
        }
    }

    pub fn with_registry(mut self, registry: Arc<dyn SchemaRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn cache(&self) -> &SchemaCache {
        &self.cache
    }

    pub fn config(&self) -> &SerdeConfig {
        &self.config
    }

    pub fn registry(&self) -> Option<&dyn SchemaRegistry> {
        self.registry.as_deref()
    }

    /// Context handed to registry codec functions
    pub fn context(&self) -> SerdeContext<'_> {
        let context = SerdeContext::new(&self.cache, &self.config);
        match self.registry() {
            Some(registry) => context.with_registry(registry),
            None => context,
        }
    }

    pub fn resolver(&self) -> ReferenceResolver<'_> {
        self.context().resolver()
    }

    /// Make `schema` visible to reference resolution under `subject`
    ///
    /// Returns false when the schema has caching disabled.
    pub fn register_schema(&self, subject: impl Into<String>, schema: Arc<Schema>) -> bool {
        self.cache.insert(subject, schema)
    }

    /// Serialize a container
    ///
    /// Without a schema the payload goes through the codec for its schema type unframed. With a
    /// schema only Avro and JSON are supported; the payload is framed with the schema id unless
    /// the id is 0.
    pub fn serialize(&self, container: &Container) -> SerdeResult<Vec<u8>> {
        let serdes = get_serdes(container.schema_type)?;
        let resolver = self.resolver();

        let Some(schema) = &container.schema else {
            return serdes.serialize(&container.data, None, &resolver);
        };
        ensure_schema_based(container.schema_type)?;

        let schema = self.effective_schema(schema);
        let payload = serdes.serialize(&container.data, Some(&*schema), &resolver)?;
        if schema.id == 0 {
            Ok(payload)
        } else {
            Ok(wire_format::encode(&payload, schema.id))
        }
    }

    /// Deserialize a container whose data holds the message bytes
    ///
    /// The data may be raw bytes, an array of byte values or a base64 string.
    pub fn deserialize(&self, container: &Container) -> SerdeResult<GenericValue> {
        let serdes = get_serdes(container.schema_type)?;
        let resolver = self.resolver();

        let Some(schema) = &container.schema else {
            return self.deserialize_schemaless(container, serdes.as_ref(), &resolver);
        };
        ensure_schema_based(container.schema_type)?;

        let schema = self.effective_schema(schema);
        let bytes = message_bytes(&container.data)?;
        let payload = if schema.id == 0 {
            &bytes[..]
        } else {
            let (id, payload) =
                wire_format::decode_with_id(&bytes).map_err(SerdeError::wire_format)?;
            if id != schema.id {
                log::debug!(
                    "Message framed with schema id {} decoded with schema id {}",
                    id,
                    schema.id
                );
            }
            payload
        };

        let value = serdes.deserialize(payload, Some(&*schema), &resolver)?;
        if value.as_object().is_none() {
            return Err(SerdeError::invalid_data(format!(
                "expected a decoded object, got {}",
                value.type_name()
            )));
        }
        Ok(value)
    }

    fn deserialize_schemaless(
        &self,
        container: &Container,
        serdes: &dyn Serdes,
        resolver: &ReferenceResolver<'_>,
    ) -> SerdeResult<GenericValue> {
        match &container.data {
            GenericValue::Bytes(bytes) => match container.schema_type {
                SchemaType::String => Ok(GenericValue::String(
                    String::from_utf8_lossy(bytes).into_owned(),
                )),
                SchemaType::Avro | SchemaType::Json if is_json(bytes) => to_json_object(bytes),
                _ => Ok(GenericValue::Bytes(bytes.clone())),
            },
            GenericValue::String(text) if is_base64_encoded(text) => {
                let decoded = base64_to_bytes(text)?;
                serdes.deserialize(&decoded, None, resolver)
            }
            GenericValue::String(text) => Ok(GenericValue::Bytes(text.as_bytes().to_vec())),
            other => Ok(other.clone()),
        }
    }

    /// The cached schema for the subject when the given schema opts into caching
    fn effective_schema(&self, schema: &Arc<Schema>) -> Arc<Schema> {
        if schema.enable_caching {
            if let Some(cached) = self.cache.get(&schema.subject) {
                return cached;
            }
        }
        Arc::clone(schema)
    }

    /// Fetch a schema from the registry; version 0 means latest
    ///
    /// With `cacheSchemas` set, a cached schema for the subject is returned without a registry
    /// call and fetched schemas are cached.
    pub fn get_schema(&self, subject: &str, version: i32) -> SerdeResult<Arc<Schema>> {
        let cache_schemas = self.config.schema_registry.cache_schemas;
        if cache_schemas {
            if let Some(cached) = self
                .cache
                .get(subject)
                .filter(|cached| version <= 0 || cached.version == version)
            {
                return Ok(cached);
            }
        }

        let registry = self.require_registry()?;
        let schema = Arc::new(registry.get_schema(subject, version)?.with_caching(cache_schemas));
        self.cache.insert(subject, Arc::clone(&schema));
        Ok(schema)
    }

    /// Register a schema with the registry
    pub fn create_schema(
        &self,
        subject: &str,
        schema: &str,
        schema_type: SchemaType,
        references: &[SchemaReference],
    ) -> SerdeResult<Arc<Schema>> {
        let registry = self.require_registry()?;
        let created = registry
            .register_with_references(subject, schema, schema_type, references)
            .map_err(|e| match e {
                SerdeError::SchemaCreationFailed { .. } => e,
                other => SerdeError::SchemaCreationFailed {
                    subject: subject.to_string(),
                    message: other.to_string(),
                },
            })?;

        let created = Arc::new(created.with_caching(self.config.schema_registry.cache_schemas));
        self.cache.insert(subject, Arc::clone(&created));
        log::debug!("Created schema id {} for subject '{}'", created.id, subject);
        Ok(created)
    }

    /// Derive a subject using the configured naming strategy
    pub fn get_subject_name(&self, schema: &str, topic: &str, element: Element) -> SerdeResult<String> {
        get_subject_name(schema, topic, element, self.config.subject_name_strategy)
    }

    /// Serialize with the codec the configuration declares for `element`
    pub fn serialize_with(
        &self,
        data: &GenericValue,
        schema: &str,
        topic: &str,
        element: Element,
        version: i32,
    ) -> SerdeResult<Vec<u8>> {
        get_serializer(self.config.serializer(element), schema).serialize(
            &self.context(),
            data,
            schema,
            topic,
            element,
            version,
        )
    }

    /// Deserialize with the codec the configuration declares for `element`
    pub fn deserialize_with(
        &self,
        data: &[u8],
        schema: &str,
        topic: &str,
        element: Element,
        version: i32,
    ) -> SerdeResult<GenericValue> {
        get_deserializer(self.config.deserializer(element), schema).deserialize(
            &self.context(),
            data,
            schema,
            topic,
            element,
            version,
        )
    }

    fn require_registry(&self) -> SerdeResult<&dyn SchemaRegistry> {
        self.registry()
            .ok_or_else(|| SerdeError::config("No schema registry configured"))
    }
}

fn ensure_schema_based(schema_type: SchemaType) -> SerdeResult<()> {
    match schema_type {
        SchemaType::Avro | SchemaType::Json => Ok(()),
        other => Err(SerdeError::unsupported(format!(
            "schema-based {} serialization",
            other
        ))),
    }
}

fn message_bytes(data: &GenericValue) -> SerdeResult<Cow<'_, [u8]>> {
    match data {
        GenericValue::Bytes(bytes) => Ok(Cow::Borrowed(bytes)),
        GenericValue::String(text) if is_base64_encoded(text) => {
            Ok(Cow::Owned(base64_to_bytes(text)?))
        }
        GenericValue::Array(items) => Ok(Cow::Owned(to_byte_array(items)?)),
        other => Err(SerdeError::invalid_data(format!(
            "expected message bytes or a base64 string, got {}",
            other.type_name()
        ))),
    }
}
