//! Engine-owned schema cache
//!
//! Maps subject to schema. Entries are never evicted. Each method takes the lock for the
//! duration of one lookup or insert only, so a resolver can re-enter the cache while a compile
//! further up the stack is still running.

use super::types::Schema;
use crate::serdes::serialization::avro_schema::extract_full_name;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: RwLock<HashMap<String, Arc<Schema>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `schema` under `subject`
    ///
    /// Schemas with caching disabled are never stored; returns whether the entry was written.
    pub fn insert(&self, subject: impl Into<String>, schema: Arc<Schema>) -> bool {
        if !schema.enable_caching {
            log::debug!(
                "Not caching schema id {} for subject '{}': caching disabled",
                schema.id,
                schema.subject
            );
            return false;
        }
        let subject = subject.into();
        log::debug!("Caching schema id {} under subject '{}'", schema.id, subject);
        match self.entries.write() {
            Ok(mut entries) => {
                entries.insert(subject, schema);
                true
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(subject, schema);
                true
            }
        }
    }

    /// Entry whose subject key equals `subject`
    pub fn get(&self, subject: &str) -> Option<Arc<Schema>> {
        self.read(|entries| entries.get(subject).cloned())
    }

    /// First compiled entry whose root type has full name `full_name`
    pub fn find_compiled_by_full_name(&self, full_name: &str) -> Option<Arc<Schema>> {
        self.read(|entries| {
            entries
                .values()
                .find(|schema| {
                    schema
                        .compiled_codec()
                        .and_then(|codec| codec.full_name())
                        .is_some_and(|name| name == full_name)
                })
                .cloned()
        })
    }

    /// First uncompiled entry whose raw text declares full name `full_name`
    pub fn find_uncompiled_by_extracted_name(&self, full_name: &str) -> Option<Arc<Schema>> {
        self.read(|entries| {
            entries
                .values()
                .find(|schema| {
                    !schema.is_compiled()
                        && extract_full_name(&schema.schema).is_some_and(|name| name == full_name)
                })
                .cloned()
        })
    }

    pub fn contains(&self, subject: &str) -> bool {
        self.read(|entries| entries.contains_key(subject))
    }

    pub fn len(&self) -> usize {
        self.read(HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subjects(&self) -> Vec<String> {
        self.read(|entries| entries.keys().cloned().collect())
    }

    fn read<R>(&self, f: impl FnOnce(&HashMap<String, Arc<Schema>>) -> R) -> R {
        match self.entries.read() {
            Ok(entries) => f(&entries),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }
}
