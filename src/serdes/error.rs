//! Error types for the transcoding engine
//!
//! Every failure surfaced by a codec, the wire-format layer, the schema cache or the
//! registry collaborator is a [`SerdeError`]. Each variant maps to a stable numeric code
//! (see [`SerdeError::code`]) so callers can branch on the failure kind without string
//! matching.

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for serialization and schema operations
#[derive(Debug, thiserror::Error)]
pub enum SerdeError {
    /// Payload shape does not match what the codec requires
    #[error("Invalid data type: {message}")]
    InvalidDataType { message: String },

    /// Schema text failed to parse
    #[error("Invalid schema: {message}")]
    InvalidSchema {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Wire-format decode on a buffer shorter than the 5-byte prefix
    #[error("Invalid message: message too short to contain schema id ({length} bytes)")]
    MessageTooShort { length: usize },

    #[error("Failed to remove wire format from message: {message}")]
    FailedDecodeFromWireFormat {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Schema compilation failed, including unresolved references
    #[error("Failed to create Avro codec: {message}")]
    FailedCreateAvroCodec {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// The Avro encoder rejected an already converted value
    #[error("Failed to encode data into Avro: {message}")]
    FailedEncodeToAvro {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("Failed to decode data from Avro binary: {message}")]
    FailedDecodeAvroFromBinary {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("Failed to create JSON Schema validator: {message}")]
    FailedCreateJsonSchemaCodec { message: String },

    #[error("Failed to unmarshal JSON data: {message}")]
    FailedUnmarshalJson {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// JSON payload does not satisfy its JSON Schema
    #[error("Failed to validate JSON against schema: {}", errors.join("; "))]
    FailedValidateJson { errors: Vec<String> },

    #[error("Failed to decode base64 string: {source}")]
    FailedDecodeBase64 {
        #[source]
        source: base64::DecodeError,
    },

    #[error("Failed to unmarshal schema: {message}")]
    FailedToUnmarshalSchema { message: String },

    /// Registry collaborator could not find the requested schema
    #[error("Schema not found for subject '{subject}': {message}")]
    SchemaNotFound { subject: String, message: String },

    #[error("Failed to create schema for subject '{subject}': {message}")]
    SchemaCreationFailed { subject: String, message: String },

    /// No cache tier and no registry fallback could supply a named reference
    #[error("Reference '{name}' not found")]
    ReferenceNotFound { name: String },

    /// Reference chain loops back onto a schema that is still compiling
    #[error("Circular schema reference detected: {}", chain.join(" -> "))]
    CircularReference { chain: Vec<String> },

    #[error("Unknown serdes type: {name}")]
    UnknownSerdesType { name: String },

    /// A codec slot exists but has no implementation
    #[error("Unsupported operation: {operation}")]
    UnsupportedOperation { operation: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl SerdeError {
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidDataType {
            message: message.into(),
        }
    }

    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            message: message.into(),
            source: None,
        }
    }

    pub fn invalid_schema_with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::InvalidSchema {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Wrap an error raised while compiling a schema into a codec
    pub fn codec_creation(message: impl Into<String>, source: Option<BoxedSource>) -> Self {
        Self::FailedCreateAvroCodec {
            message: message.into(),
            source,
        }
    }

    pub fn avro_encode(message: impl Into<String>) -> Self {
        Self::FailedEncodeToAvro {
            message: message.into(),
            source: None,
        }
    }

    pub fn avro_encode_with_source(message: impl Into<String>, source: apache_avro::Error) -> Self {
        Self::FailedEncodeToAvro {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn avro_decode(message: impl Into<String>, source: Option<BoxedSource>) -> Self {
        Self::FailedDecodeAvroFromBinary {
            message: message.into(),
            source,
        }
    }

    pub fn wire_format(source: SerdeError) -> Self {
        Self::FailedDecodeFromWireFormat {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    pub fn json_unmarshal(source: serde_json::Error) -> Self {
        Self::FailedUnmarshalJson {
            message: source.to_string(),
            source: Some(source),
        }
    }

    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            operation: operation.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Stable numeric code for this error kind
    ///
    /// 1xxx are configuration errors, 2xxx are codec errors and 6xxx are registry errors.
    pub fn code(&self) -> u32 {
        match self {
            SerdeError::Configuration { .. } => 1001,
            SerdeError::InvalidDataType { .. } => 2000,
            SerdeError::FailedDecodeFromWireFormat { .. } => 2001,
            SerdeError::FailedCreateAvroCodec { .. } => 2002,
            SerdeError::FailedEncodeToAvro { .. } => 2003,
            SerdeError::FailedDecodeAvroFromBinary { .. } => 2005,
            SerdeError::FailedCreateJsonSchemaCodec { .. } => 2006,
            SerdeError::FailedUnmarshalJson { .. } => 2007,
            SerdeError::FailedValidateJson { .. } => 2008,
            SerdeError::FailedDecodeBase64 { .. } => 2012,
            SerdeError::FailedToUnmarshalSchema { .. } => 2013,
            SerdeError::InvalidSchema { .. } => 2014,
            SerdeError::UnknownSerdesType { .. } => 2015,
            SerdeError::UnsupportedOperation { .. } => 2016,
            SerdeError::MessageTooShort { .. } => 6000,
            SerdeError::SchemaNotFound { .. } => 6001,
            SerdeError::SchemaCreationFailed { .. } => 6002,
            SerdeError::ReferenceNotFound { .. } => 6003,
            SerdeError::CircularReference { .. } => 6004,
        }
    }
}

impl From<base64::DecodeError> for SerdeError {
    fn from(source: base64::DecodeError) -> Self {
        SerdeError::FailedDecodeBase64 { source }
    }
}

/// Result type for serialization and schema operations
pub type SerdeResult<T> = Result<T, SerdeError>;
