//! Serde configuration
//!
//! Codec names, schema registry connection settings and the subject naming strategy. A
//! configuration can be read from JSON (camelCase keys) or from Kafka-style dotted properties:
//!
//! - `key.serializer` / `value.serializer`
//! - `key.deserializer` / `value.deserializer`
//! - `schema.registry.url`
//! - `schema.registry.basic.auth.user.info` (`user:password`)
//! - `schema.registry.use.latest`
//! - `schema.registry.cache.schemas`
//! - `subject.name.strategy`

use crate::serdes::error::{SerdeError, SerdeResult};
use crate::serdes::schema::{Element, SubjectNameStrategy};
use crate::serdes::serde_registry::is_wire_formatted;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProducerConfig {
    pub key_serializer: String,
    pub value_serializer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsumerConfig {
    pub key_deserializer: String,
    pub value_deserializer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl BasicAuth {
    /// Both username and password are set
    pub fn is_configured(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

/// Schema registry connection settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemaRegistryConfig {
    pub url: String,
    pub basic_auth: BasicAuth,
    /// Fetch the latest registered schema instead of registering the given one
    pub use_latest: bool,
    /// Store fetched and created schemas in the engine's schema cache
    pub cache_schemas: bool,
}

impl SchemaRegistryConfig {
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty()
    }
}

/// Complete serde configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SerdeConfig {
    pub producer: ProducerConfig,
    pub consumer: ConsumerConfig,
    pub schema_registry: SchemaRegistryConfig,
    pub subject_name_strategy: SubjectNameStrategy,
}

impl SerdeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON configuration document
    pub fn from_json_str(json: &str) -> SerdeResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| SerdeError::config(format!("Failed to parse configuration: {}", e)))
    }

    /// Build a configuration from Kafka-style properties
    ///
    /// Unknown keys are ignored.
    pub fn from_properties(props: &HashMap<String, String>) -> SerdeResult<Self> {
        let get = |key: &str| props.get(key).map(|v| v.trim().to_string());
        let mut config = SerdeConfig::new();

        config.producer.key_serializer = get("key.serializer").unwrap_or_default();
        config.producer.value_serializer = get("value.serializer").unwrap_or_default();
        config.consumer.key_deserializer = get("key.deserializer").unwrap_or_default();
        config.consumer.value_deserializer = get("value.deserializer").unwrap_or_default();

        config.schema_registry.url = get("schema.registry.url").unwrap_or_default();
        if let Some(user_info) = get("schema.registry.basic.auth.user.info") {
            let (username, password) = user_info.split_once(':').ok_or_else(|| {
                SerdeError::config(
                    "schema.registry.basic.auth.user.info must have the form 'user:password'",
                )
            })?;
            config.schema_registry.basic_auth = BasicAuth {
                username: username.to_string(),
                password: password.to_string(),
            };
        }
        if let Some(value) = get("schema.registry.use.latest") {
            config.schema_registry.use_latest = parse_bool("schema.registry.use.latest", &value)?;
        }
        if let Some(value) = get("schema.registry.cache.schemas") {
            config.schema_registry.cache_schemas =
                parse_bool("schema.registry.cache.schemas", &value)?;
        }
        if let Some(value) = get("subject.name.strategy") {
            config.subject_name_strategy = value.parse()?;
        }

        log::debug!("Loaded serde configuration from {} properties", props.len());
        Ok(config)
    }

    /// Configured serializer name for `element` (empty when unset)
    pub fn serializer(&self, element: Element) -> &str {
        match element {
            Element::Key => &self.producer.key_serializer,
            Element::Value => &self.producer.value_serializer,
        }
    }

    /// Configured deserializer name for `element` (empty when unset)
    pub fn deserializer(&self, element: Element) -> &str {
        match element {
            Element::Key => &self.consumer.key_deserializer,
            Element::Value => &self.consumer.value_deserializer,
        }
    }

    /// Validate the configuration
    ///
    /// Any wire-formatted codec needs a schema registry URL.
    pub fn validate(&self) -> SerdeResult<()> {
        let codecs = [
            &self.producer.key_serializer,
            &self.producer.value_serializer,
            &self.consumer.key_deserializer,
            &self.consumer.value_deserializer,
        ];
        let needs_registry: Vec<&str> = codecs
            .iter()
            .filter(|name| is_wire_formatted(name))
            .map(|name| name.as_str())
            .collect();

        if !needs_registry.is_empty() && !self.schema_registry.is_configured() {
            return Err(SerdeError::config(format!(
                "Schema registry URL required to use {}",
                needs_registry.join(", ")
            )));
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> SerdeResult<bool> {
    value
        .to_lowercase()
        .parse::<bool>()
        .map_err(|_| SerdeError::config(format!("{} must be true or false, got '{}'", key, value)))
}
