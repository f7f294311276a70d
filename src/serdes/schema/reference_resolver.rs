//! Schema reference resolution
//!
//! Compiling a schema that names types it does not define requires finding those types
//! elsewhere. Lookup order for a referenced name:
//!
//! 1. a cache entry whose subject equals the name
//! 2. a compiled cache entry whose root type has that full name
//! 3. an uncompiled cache entry whose raw text declares that full name
//! 4. the registry, when the referencing schema lists a reference with that name
//!
//! The cache tiers are skipped entirely for schemas with caching disabled. Referenced schemas
//! are compiled with the same resolver, so multi-level reference graphs resolve recursively.

use super::cache::SchemaCache;
use super::registry::SchemaRegistry;
use super::types::Schema;
use crate::serdes::error::{SerdeError, SerdeResult};
use crate::serdes::serialization::avro_schema::{extract_full_name, inline_references};
use crate::serdes::serialization::AvroCodec;
use std::cell::RefCell;
use std::sync::Arc;

/// Identity of a schema on the compile stack
///
/// Registry fetches with caching disabled hand out a fresh allocation each time, so a schema
/// is also recognised by its registry coordinates and by the full name of its root type.
struct CompileKey {
    identity: *const Schema,
    coordinates: Option<(String, i32)>,
    full_name: Option<String>,
    label: String,
}

impl CompileKey {
    fn of(schema: &Schema) -> Self {
        let coordinates = if schema.subject.is_empty() {
            None
        } else {
            Some((schema.subject.clone(), schema.version))
        };
        let label = if schema.subject.is_empty() {
            format!("id {}", schema.id)
        } else {
            schema.subject.clone()
        };
        Self {
            identity: schema as *const Schema,
            coordinates,
            full_name: extract_full_name(&schema.schema),
            label,
        }
    }

    fn same_schema(&self, other: &CompileKey) -> bool {
        self.identity == other.identity
            || (self.coordinates.is_some() && self.coordinates == other.coordinates)
            || (self.full_name.is_some() && self.full_name == other.full_name)
    }
}

/// Resolves named references while compiling schemas
///
/// One resolver serves a single compile call chain; it tracks the schemas currently being
/// compiled to report reference cycles instead of recursing into them.
pub struct ReferenceResolver<'a> {
    cache: &'a SchemaCache,
    registry: Option<&'a dyn SchemaRegistry>,
    compiling: RefCell<Vec<CompileKey>>,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(cache: &'a SchemaCache) -> Self {
        Self {
            cache,
            registry: None,
            compiling: RefCell::new(Vec::new()),
        }
    }

    pub fn with_registry(mut self, registry: &'a dyn SchemaRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Find the schema a reference name points to, without compiling it
    pub fn lookup(&self, referencing: &Schema, name: &str) -> SerdeResult<Option<Arc<Schema>>> {
        if referencing.enable_caching {
            if let Some(found) = self.cache.get(name) {
                log::debug!("Reference '{}' resolved by subject", name);
                return Ok(Some(found));
            }
            if let Some(found) = self.cache.find_compiled_by_full_name(name) {
                log::debug!("Reference '{}' resolved by compiled full name", name);
                return Ok(Some(found));
            }
            if let Some(found) = self.cache.find_uncompiled_by_extracted_name(name) {
                log::debug!("Reference '{}' resolved by extracted name", name);
                return Ok(Some(found));
            }
        }

        let (Some(registry), Some(reference)) = (self.registry, referencing.find_reference(name))
        else {
            return Ok(None);
        };

        log::debug!(
            "Fetching reference '{}' from registry subject '{}' version {}",
            name,
            reference.subject,
            reference.version
        );
        let fetched = if reference.version > 0 {
            registry.fetch_by_version(&reference.subject, reference.version)?
        } else {
            registry.fetch_latest(&reference.subject)?
        };
        let fetched = Arc::new(fetched.with_caching(referencing.enable_caching));
        self.cache.insert(reference.subject.clone(), Arc::clone(&fetched));
        Ok(Some(fetched))
    }

    /// Compile `schema`, inlining every referenced schema
    ///
    /// Called through [`Schema::codec`], which memoizes the result.
    pub(crate) fn compile(&self, schema: &Schema) -> SerdeResult<AvroCodec> {
        self.compiling.borrow_mut().push(CompileKey::of(schema));
        let result = self.compile_inner(schema);
        self.compiling.borrow_mut().pop();
        result
    }

    fn compile_inner(&self, schema: &Schema) -> SerdeResult<AvroCodec> {
        let json: serde_json::Value = serde_json::from_str(&schema.schema).map_err(|e| {
            SerdeError::codec_creation("schema is not valid JSON", Some(Box::new(e)))
        })?;

        let mut resolve = |written: &str, qualified: &str| -> SerdeResult<Option<serde_json::Value>> {
            let found = match self.lookup(schema, written)? {
                Some(found) => Some(found),
                None if qualified != written => self.lookup(schema, qualified)?,
                None => None,
            };
            let Some(referenced) = found else {
                return Ok(None);
            };
            self.ensure_not_compiling(&referenced)?;
            let codec = referenced.codec(self)?;
            Ok(Some(codec.flattened_json().clone()))
        };

        let flattened = inline_references(&json, &mut resolve).map_err(|e| match e {
            SerdeError::FailedCreateAvroCodec { .. } | SerdeError::CircularReference { .. } => e,
            other => SerdeError::codec_creation(other.to_string(), Some(Box::new(other))),
        })?;
        AvroCodec::from_json(flattened)
    }

    fn ensure_not_compiling(&self, referenced: &Arc<Schema>) -> SerdeResult<()> {
        let key = CompileKey::of(referenced);
        let compiling = self.compiling.borrow();
        if let Some(position) = compiling.iter().position(|entry| entry.same_schema(&key)) {
            let mut chain: Vec<String> = compiling[position..]
                .iter()
                .map(|entry| entry.label.clone())
                .collect();
            chain.push(compiling[position].label.clone());
            log::warn!("Circular schema reference: {}", chain.join(" -> "));
            return Err(SerdeError::CircularReference { chain });
        }
        Ok(())
    }
}
