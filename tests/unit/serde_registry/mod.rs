//! Codec name registry tests
//!
//! Selection rules and the registry-aware Avro and JSON Schema codecs.

pub mod registry_codecs_test;
