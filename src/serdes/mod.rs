pub mod config;
pub mod engine;
pub mod error;
pub mod schema;
pub mod serde_registry;
pub mod serialization;

pub use config::{BasicAuth, ConsumerConfig, ProducerConfig, SchemaRegistryConfig, SerdeConfig};
pub use engine::{Container, SerdeEngine};
pub use error::{SerdeError, SerdeResult};
