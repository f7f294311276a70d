//! Schema Management
//!
//! Registry-managed schemas, the engine-owned schema cache and the reference resolver that
//! compiles schemas whose types live in other registered schemas.
//!
//! ## Core Types
//!
//! - `Schema`: one registry schema with its lazily compiled codec
//! - `SchemaCache`: subject -> schema map shared by all callers of one engine
//! - `ReferenceResolver`: three-tier cache lookup with registry fallback
//! - `SchemaRegistry`: the registry collaborator contract

pub mod backends;
pub mod cache;
pub mod reference_resolver;
pub mod registry;
pub mod types;

pub use backends::InMemorySchemaRegistry;
pub use cache::SchemaCache;
pub use reference_resolver::ReferenceResolver;
pub use registry::{get_subject_name, SchemaRegistry, SubjectNameStrategy};
pub use types::{Element, Schema, SchemaReference, SchemaType};
