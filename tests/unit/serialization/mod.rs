//! Serialization tests
//!
//! Wire format framing, the Avro transcoder and the string, byte-array and JSON codecs.

pub mod simple_codecs_test;
