//! Registry schema entity

use super::reference_resolver::ReferenceResolver;
use crate::serdes::error::{SerdeError, SerdeResult};
use crate::serdes::serialization::AvroCodec;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Kind of payload a schema (or a codec) describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaType {
    String,
    #[serde(alias = "BYTEARRAY")]
    Bytes,
    #[default]
    Avro,
    Json,
    Protobuf,
}

impl SchemaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::String => "STRING",
            SchemaType::Bytes => "BYTES",
            SchemaType::Avro => "AVRO",
            SchemaType::Json => "JSON",
            SchemaType::Protobuf => "PROTOBUF",
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaType {
    type Err = SerdeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "string" => Ok(SchemaType::String),
            "bytes" | "bytearray" | "byte_array" => Ok(SchemaType::Bytes),
            "avro" => Ok(SchemaType::Avro),
            "json" | "jsonschema" => Ok(SchemaType::Json),
            "protobuf" | "proto" => Ok(SchemaType::Protobuf),
            _ => Err(SerdeError::UnknownSerdesType {
                name: s.to_string(),
            }),
        }
    }
}

/// Whether a payload is the message key or the message value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Key,
    Value,
}

impl Element {
    pub fn as_str(&self) -> &'static str {
        match self {
            Element::Key => "key",
            Element::Value => "value",
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Element {
    type Err = SerdeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "key" => Ok(Element::Key),
            "value" => Ok(Element::Value),
            other => Err(SerdeError::invalid_data(format!(
                "unknown element '{}', expected 'key' or 'value'",
                other
            ))),
        }
    }
}

/// Named pointer from one schema to another registered schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaReference {
    pub name: String,
    pub subject: String,
    /// Registry version; 0 or negative means latest
    #[serde(default)]
    pub version: i32,
}

impl SchemaReference {
    pub fn new(name: impl Into<String>, subject: impl Into<String>, version: i32) -> Self {
        Self {
            name: name.into(),
            subject: subject.into(),
            version,
        }
    }
}

/// One registry-managed schema
///
/// The compiled codec is computed lazily on first use and memoized; clones made before the
/// first compile compile independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(default)]
    pub id: u32,
    pub schema: String,
    #[serde(default)]
    pub schema_type: SchemaType,
    #[serde(default)]
    pub version: i32,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub references: Vec<SchemaReference>,
    #[serde(default)]
    pub enable_caching: bool,
    #[serde(skip)]
    codec: OnceCell<Arc<AvroCodec>>,
}

impl Schema {
    pub fn new(
        id: u32,
        schema: impl Into<String>,
        schema_type: SchemaType,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            id,
            schema: schema.into(),
            schema_type,
            version: 0,
            subject: subject.into(),
            references: Vec::new(),
            enable_caching: false,
            codec: OnceCell::new(),
        }
    }

    pub fn with_version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    pub fn with_references(mut self, references: Vec<SchemaReference>) -> Self {
        self.references = references;
        self
    }

    pub fn with_caching(mut self, enable_caching: bool) -> Self {
        self.enable_caching = enable_caching;
        self
    }

    /// Compiled Avro codec, compiling on first call
    ///
    /// Concurrent first callers block until one compile finishes; a failed compile is not
    /// memoized.
    pub fn codec(&self, resolver: &ReferenceResolver<'_>) -> SerdeResult<Arc<AvroCodec>> {
        self.codec
            .get_or_try_init(|| resolver.compile(self).map(Arc::new))
            .cloned()
    }

    /// The codec if it has already been compiled
    pub fn compiled_codec(&self) -> Option<&Arc<AvroCodec>> {
        self.codec.get()
    }

    pub fn is_compiled(&self) -> bool {
        self.codec.get().is_some()
    }

    pub fn find_reference(&self, name: &str) -> Option<&SchemaReference> {
        self.references.iter().find(|r| r.name == name)
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.schema == other.schema
            && self.schema_type == other.schema_type
            && self.version == other.version
            && self.subject == other.subject
            && self.references == other.references
            && self.enable_caching == other.enable_caching
    }
}
