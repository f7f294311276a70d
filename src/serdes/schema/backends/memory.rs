//! In-Memory Schema Registry Implementation
//!
//! Provides an in-memory registry suitable for testing and embedded use.
//! All data is stored in memory and lost when the process terminates.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::serdes::error::{SerdeError, SerdeResult};
use crate::serdes::schema::registry::SchemaRegistry;
use crate::serdes::schema::types::{Schema, SchemaReference, SchemaType};

/// Schema version for in-memory storage
#[derive(Debug, Clone)]
pub struct SchemaVersion {
    pub id: u32,
    pub version: i32,
    pub schema: String,
    pub schema_type: SchemaType,
    pub references: Vec<SchemaReference>,
}

/// In-memory schema registry
///
/// Ids are allocated from 1 across all subjects; versions start at 1 per subject.
/// Registering text identical to an existing version of the subject returns that version.
#[derive(Debug)]
pub struct InMemorySchemaRegistry {
    /// Storage: subject -> versions
    subjects: RwLock<HashMap<String, Vec<SchemaVersion>>>,
    next_id: AtomicU32,
    requests: AtomicUsize,
}

impl Default for InMemorySchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySchemaRegistry {
    pub fn new() -> Self {
        Self {
            subjects: RwLock::new(HashMap::new()),
            next_id: AtomicU32::new(1),
            requests: AtomicUsize::new(0),
        }
    }

    fn store(
        &self,
        subject: &str,
        schema: &str,
        schema_type: SchemaType,
        references: Vec<SchemaReference>,
    ) -> SerdeResult<Schema> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if schema.trim().is_empty() {
            return Err(SerdeError::SchemaCreationFailed {
                subject: subject.to_string(),
                message: "schema text is empty".to_string(),
            });
        }

        let mut subjects = self
            .subjects
            .write()
            .map_err(|_| SerdeError::SchemaCreationFailed {
                subject: subject.to_string(),
                message: "Failed to acquire write lock".to_string(),
            })?;

        let versions = subjects.entry(subject.to_string()).or_default();
        if let Some(existing) = versions
            .iter()
            .find(|v| v.schema == schema && v.schema_type == schema_type)
        {
            return Ok(to_schema(subject, existing));
        }

        let version = SchemaVersion {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            version: versions.iter().map(|v| v.version).max().unwrap_or(0) + 1,
            schema: schema.to_string(),
            schema_type,
            references,
        };
        log::debug!(
            "Registered schema id {} as version {} of subject '{}'",
            version.id,
            version.version,
            subject
        );
        let registered = to_schema(subject, &version);
        versions.push(version);
        Ok(registered)
    }

    /// Number of registry calls served so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    fn read_subjects(
        &self,
        subject: &str,
    ) -> SerdeResult<std::sync::RwLockReadGuard<'_, HashMap<String, Vec<SchemaVersion>>>> {
        self.subjects.read().map_err(|_| SerdeError::SchemaNotFound {
            subject: subject.to_string(),
            message: "Failed to acquire read lock".to_string(),
        })
    }
}

impl SchemaRegistry for InMemorySchemaRegistry {
    fn fetch_latest(&self, subject: &str) -> SerdeResult<Schema> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let subjects = self.read_subjects(subject)?;
        subjects
            .get(subject)
            .and_then(|versions| versions.iter().max_by_key(|v| v.version))
            .map(|latest| to_schema(subject, latest))
            .ok_or_else(|| SerdeError::SchemaNotFound {
                subject: subject.to_string(),
                message: format!("Subject {} not found", subject),
            })
    }

    fn fetch_by_version(&self, subject: &str, version: i32) -> SerdeResult<Schema> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let subjects = self.read_subjects(subject)?;
        subjects
            .get(subject)
            .and_then(|versions| versions.iter().find(|v| v.version == version))
            .map(|found| to_schema(subject, found))
            .ok_or_else(|| SerdeError::SchemaNotFound {
                subject: subject.to_string(),
                message: format!("Version {} not found for subject {}", version, subject),
            })
    }

    fn fetch_by_id(&self, id: u32) -> SerdeResult<Schema> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let subjects = self.read_subjects(&format!("id {}", id))?;
        subjects
            .iter()
            .find_map(|(subject, versions)| {
                versions
                    .iter()
                    .find(|v| v.id == id)
                    .map(|v| to_schema(subject, v))
            })
            .ok_or_else(|| SerdeError::SchemaNotFound {
                subject: String::new(),
                message: format!("Schema with ID {} not found", id),
            })
    }

    fn register(&self, subject: &str, schema: &str, schema_type: SchemaType) -> SerdeResult<Schema> {
        self.store(subject, schema, schema_type, Vec::new())
    }

    fn register_with_references(
        &self,
        subject: &str,
        schema: &str,
        schema_type: SchemaType,
        references: &[SchemaReference],
    ) -> SerdeResult<Schema> {
        self.store(subject, schema, schema_type, references.to_vec())
    }
}

fn to_schema(subject: &str, version: &SchemaVersion) -> Schema {
    Schema::new(version.id, version.schema.clone(), version.schema_type, subject)
        .with_version(version.version)
        .with_references(version.references.clone())
}
