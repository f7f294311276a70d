//! Schema registry implementations

pub mod memory;

pub use memory::{InMemorySchemaRegistry, SchemaVersion};
