//! Schema registry collaborator contract and subject naming

use super::types::{Element, Schema, SchemaReference, SchemaType};
use crate::serdes::error::{SerdeError, SerdeResult};
use crate::serdes::serialization::avro_schema::extract_full_name;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Data contract of the schema registry
///
/// Implementations map lookup failures to [`SerdeError::SchemaNotFound`] and registration
/// failures to [`SerdeError::SchemaCreationFailed`].
pub trait SchemaRegistry: Send + Sync {
    fn fetch_latest(&self, subject: &str) -> SerdeResult<Schema>;

    fn fetch_by_version(&self, subject: &str, version: i32) -> SerdeResult<Schema>;

    /// Look up a schema by the id carried in a wire-format prefix
    fn fetch_by_id(&self, id: u32) -> SerdeResult<Schema>;

    fn register(&self, subject: &str, schema: &str, schema_type: SchemaType)
        -> SerdeResult<Schema>;

    /// Register a schema that names types defined in other subjects
    fn register_with_references(
        &self,
        subject: &str,
        schema: &str,
        schema_type: SchemaType,
        references: &[SchemaReference],
    ) -> SerdeResult<Schema> {
        self.register(subject, schema, schema_type)
            .map(|registered| registered.with_references(references.to_vec()))
    }

    /// Fetch `version`, where 0 (or any non-positive version) means latest
    fn get_schema(&self, subject: &str, version: i32) -> SerdeResult<Schema> {
        if version <= 0 {
            self.fetch_latest(subject)
        } else {
            self.fetch_by_version(subject, version)
        }
    }
}

/// How a subject is derived from topic, element and schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SubjectNameStrategy {
    /// `{topic}-{key|value}`
    #[default]
    TopicNameStrategy,
    /// Fully-qualified record name
    RecordNameStrategy,
    /// `{topic}-{fully-qualified record name}`
    TopicRecordNameStrategy,
}

impl fmt::Display for SubjectNameStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubjectNameStrategy::TopicNameStrategy => "TopicNameStrategy",
            SubjectNameStrategy::RecordNameStrategy => "RecordNameStrategy",
            SubjectNameStrategy::TopicRecordNameStrategy => "TopicRecordNameStrategy",
        };
        f.write_str(name)
    }
}

impl FromStr for SubjectNameStrategy {
    type Err = SerdeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "TopicNameStrategy" => Ok(SubjectNameStrategy::TopicNameStrategy),
            "RecordNameStrategy" => Ok(SubjectNameStrategy::RecordNameStrategy),
            "TopicRecordNameStrategy" => Ok(SubjectNameStrategy::TopicRecordNameStrategy),
            other => Err(SerdeError::config(format!(
                "Unknown subject name strategy: {}",
                other
            ))),
        }
    }
}

/// Derive the registry subject for a payload
///
/// Record-based strategies read the namespace and name from `schema`.
pub fn get_subject_name(
    schema: &str,
    topic: &str,
    element: Element,
    strategy: SubjectNameStrategy,
) -> SerdeResult<String> {
    match strategy {
        SubjectNameStrategy::TopicNameStrategy => Ok(format!("{}-{}", topic, element)),
        SubjectNameStrategy::RecordNameStrategy => record_name(schema),
        SubjectNameStrategy::TopicRecordNameStrategy => {
            Ok(format!("{}-{}", topic, record_name(schema)?))
        }
    }
}

fn record_name(schema: &str) -> SerdeResult<String> {
    extract_full_name(schema).ok_or_else(|| SerdeError::FailedToUnmarshalSchema {
        message: "schema has no record name".to_string(),
    })
}
