//! # velostream-serdes
//!
//! Schema-aware message transcoding for Kafka producers and consumers. Turns strings, byte
//! arrays and untyped JSON-like values into broker payloads and back, cooperating with a schema
//! registry through the 5-byte wire format.
//!
//! ## Features
//!
//! - **Wire Format**: magic byte and big-endian schema id framing
//! - **Avro**: union wrapping and unwrapping, float to int narrowing, logical types
//! - **Schema References**: engine-owned cache with subject, full-name and raw-text lookup and
//!   registry fallback
//! - **JSON Schema**: strict validation on encode, best effort on decode
//! - **Codec Registry**: Kafka client codec class names mapped to implementations
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use velostream_serdes::serdes::schema::{Schema, SchemaType};
//! use velostream_serdes::{Container, GenericValue, SerdeEngine};
//!
//! let engine = SerdeEngine::default();
//! let schema = Arc::new(Schema::new(
//!     7,
//!     r#"{"type":"record","name":"Ping","fields":[{"name":"seq","type":"int"}]}"#,
//!     SchemaType::Avro,
//!     "pings-value",
//! ));
//!
//! let value = GenericValue::from(serde_json::json!({"seq": 1.0}));
//! let bytes = engine.serialize(&Container::new(value, SchemaType::Avro).with_schema(schema.clone()))?;
//! assert_eq!(bytes[0], 0);
//!
//! let decoded = engine.deserialize(&Container::new(GenericValue::Bytes(bytes), SchemaType::Avro).with_schema(schema))?;
//! assert_eq!(decoded.get("seq"), Some(&GenericValue::Integer(1)));
//! # Ok::<(), velostream_serdes::SerdeError>(())
//! ```

#![allow(clippy::collapsible_if)]
#![allow(clippy::large_enum_variant)]

pub mod serdes;

// Re-export main API at crate root for easy access
pub use serdes::{Container, SerdeConfig, SerdeEngine, SerdeError, SerdeResult};
pub use serdes::serialization::GenericValue;
