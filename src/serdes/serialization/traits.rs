//! Codec trait shared by every payload format

use super::value::GenericValue;
use crate::serdes::error::SerdeResult;
use crate::serdes::schema::{ReferenceResolver, Schema};

/// A payload codec
///
/// `schema` is `None` for schemaless payloads. The resolver is only consulted by codecs that
/// compile their schema (Avro); others ignore it.
pub trait Serdes: Send + Sync {
    fn serialize(
        &self,
        data: &GenericValue,
        schema: Option<&Schema>,
        resolver: &ReferenceResolver<'_>,
    ) -> SerdeResult<Vec<u8>>;

    fn deserialize(
        &self,
        data: &[u8],
        schema: Option<&Schema>,
        resolver: &ReferenceResolver<'_>,
    ) -> SerdeResult<GenericValue>;

    /// Get the format identifier
    fn format_name(&self) -> &'static str;
}
