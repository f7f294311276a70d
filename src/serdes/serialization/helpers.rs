//! Schema-directed conversions between generic values and Avro values
//!
//! Encoding goes `GenericValue -> apache_avro::types::Value`, choosing union branches and
//! narrowing numbers as the schema demands. Decoding goes the other way in two passes: the
//! Avro value is first converted to a tagged generic form where every non-null union value is
//! wrapped as `{branchName: value}`, then [`unwrap_union_values`] collapses those wrappers.

use super::avro_schema::{AvroKind, FieldKind, NamedKind, SchemaTree};
use super::coercion::{to_byte_array, to_i32, to_i64};
use super::value::GenericValue;
use crate::serdes::error::{SerdeError, SerdeResult};
use apache_avro::types::Value;
use std::collections::{BTreeMap, HashMap};

/// Convert a generic value into the Avro value `kind` requires
pub fn generic_to_avro(
    value: &GenericValue,
    kind: &AvroKind,
    tree: &SchemaTree,
) -> SerdeResult<Value> {
    match kind {
        AvroKind::Null => match value {
            GenericValue::Null => Ok(Value::Null),
            other => Err(mismatch("null", other)),
        },
        AvroKind::Boolean => match value {
            GenericValue::Boolean(b) => Ok(Value::Boolean(*b)),
            other => Err(mismatch("boolean", other)),
        },
        AvroKind::Int => Ok(Value::Int(to_i32(value)?)),
        AvroKind::Long => Ok(Value::Long(to_i64(value)?)),
        AvroKind::Float => value
            .as_f64()
            .map(|f| Value::Float(f as f32))
            .ok_or_else(|| mismatch("float", value)),
        AvroKind::Double => value
            .as_f64()
            .map(Value::Double)
            .ok_or_else(|| mismatch("double", value)),
        AvroKind::String => match value {
            GenericValue::String(s) => Ok(Value::String(s.clone())),
            other => Err(mismatch("string", other)),
        },
        AvroKind::Bytes => Ok(match value {
            GenericValue::Array(items) => Value::Bytes(to_byte_array(items)?),
            GenericValue::Bytes(bytes) => Value::Bytes(bytes.clone()),
            // anything else goes to the encoder as-is
            other => untyped_to_avro(other),
        }),
        AvroKind::Date => Ok(Value::Date(to_i32(value)?)),
        AvroKind::TimeMillis => Ok(Value::TimeMillis(to_i32(value)?)),
        AvroKind::TimeMicros => Ok(Value::TimeMicros(to_i64(value)?)),
        AvroKind::TimestampMillis => Ok(Value::TimestampMillis(to_i64(value)?)),
        AvroKind::TimestampMicros => Ok(Value::TimestampMicros(to_i64(value)?)),
        AvroKind::TimestampNanos => Ok(Value::TimestampNanos(to_i64(value)?)),
        AvroKind::LocalTimestampMillis => Ok(Value::LocalTimestampMillis(to_i64(value)?)),
        AvroKind::LocalTimestampMicros => Ok(Value::LocalTimestampMicros(to_i64(value)?)),
        AvroKind::LocalTimestampNanos => Ok(Value::LocalTimestampNanos(to_i64(value)?)),
        AvroKind::Uuid => match value {
            GenericValue::String(s) => uuid::Uuid::parse_str(s)
                .map(Value::Uuid)
                .map_err(|e| SerdeError::invalid_data(format!("invalid uuid '{}': {}", s, e))),
            other => Err(mismatch("uuid string", other)),
        },
        AvroKind::Decimal { .. } => Ok(match value {
            GenericValue::Array(items) => {
                Value::Decimal(apache_avro::Decimal::from(to_byte_array(items)?))
            }
            GenericValue::Bytes(bytes) => Value::Decimal(apache_avro::Decimal::from(bytes.clone())),
            other => untyped_to_avro(other),
        }),
        AvroKind::Array(items_kind) => match value {
            GenericValue::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    generic_to_avro(item, items_kind, tree)
                        .map_err(|e| in_context(format!("array index {}", index), e))
                })
                .collect::<SerdeResult<Vec<_>>>()
                .map(Value::Array),
            other => Err(mismatch("array", other)),
        },
        AvroKind::Map(values_kind) => match value {
            GenericValue::Object(map) => {
                let mut converted = HashMap::with_capacity(map.len());
                for (key, item) in map {
                    let item = generic_to_avro(item, values_kind, tree)
                        .map_err(|e| in_context(format!("map key {}", key), e))?;
                    converted.insert(key.clone(), item);
                }
                Ok(Value::Map(converted))
            }
            other => Err(mismatch("map", other)),
        },
        AvroKind::Union(branches) => union_to_avro(value, branches, tree),
        AvroKind::Named(name) => match tree.lookup(name) {
            Some(NamedKind::Record { fields, .. }) => record_to_avro(value, name, fields, tree),
            Some(NamedKind::Enum { symbols, .. }) => match value {
                GenericValue::String(symbol) => symbols
                    .iter()
                    .position(|s| s == symbol)
                    .map(|index| Value::Enum(index as u32, symbol.clone()))
                    .ok_or_else(|| {
                        SerdeError::invalid_data(format!(
                            "'{}' is not a symbol of enum {}",
                            symbol, name
                        ))
                    }),
                other => Err(mismatch(name, other)),
            },
            Some(NamedKind::Fixed { size, decimal, .. }) => {
                let bytes = match value {
                    GenericValue::Bytes(bytes) => bytes.clone(),
                    GenericValue::Array(items) => to_byte_array(items)?,
                    other => return Err(mismatch(name, other)),
                };
                if bytes.len() != *size {
                    return Err(SerdeError::invalid_data(format!(
                        "fixed {} requires {} bytes, got {}",
                        name,
                        size,
                        bytes.len()
                    )));
                }
                if *decimal {
                    Ok(Value::Decimal(apache_avro::Decimal::from(bytes)))
                } else {
                    Ok(Value::Fixed(*size, bytes))
                }
            }
            None => Err(SerdeError::ReferenceNotFound { name: name.clone() }),
        },
    }
}

fn record_to_avro(
    value: &GenericValue,
    name: &str,
    fields: &[FieldKind],
    tree: &SchemaTree,
) -> SerdeResult<Value> {
    let GenericValue::Object(map) = value else {
        return Err(mismatch(name, value));
    };

    let mut record = Vec::with_capacity(fields.len());
    for field in fields {
        let converted = match map.get(&field.name) {
            Some(field_value) => generic_to_avro(field_value, &field.kind, tree),
            None => match &field.default {
                Some(default) => {
                    generic_to_avro(&default_to_generic(default, &field.kind), &field.kind, tree)
                }
                None if accepts_null(&field.kind) => {
                    generic_to_avro(&GenericValue::Null, &field.kind, tree)
                }
                None => Err(SerdeError::invalid_data(format!(
                    "missing required field '{}'",
                    field.name
                ))),
            },
        }
        .map_err(|e| in_context(format!("field {}", field.name), e))?;
        record.push((field.name.clone(), converted));
    }

    for key in map.keys() {
        if !fields.iter().any(|f| &f.name == key) {
            log::debug!("Dropping field '{}' not declared in record {}", key, name);
        }
    }
    Ok(Value::Record(record))
}

fn union_to_avro(
    value: &GenericValue,
    branches: &[AvroKind],
    tree: &SchemaTree,
) -> SerdeResult<Value> {
    if value.is_null() {
        return branches
            .iter()
            .position(|b| *b == AvroKind::Null)
            .map(|index| Value::Union(index as u32, Box::new(Value::Null)))
            .ok_or_else(|| SerdeError::invalid_data("null is not allowed by this union"));
    }

    // already wrapped as {branchName: value}
    if let GenericValue::Object(map) = value {
        if map.len() == 1 {
            if let Some((key, inner)) = map.iter().next() {
                if let Some(index) = branches
                    .iter()
                    .position(|b| *b != AvroKind::Null && b.branch_name() == key)
                {
                    let converted = generic_to_avro(inner, &branches[index], tree)?;
                    return Ok(Value::Union(index as u32, Box::new(converted)));
                }
            }
        }
    }

    let mut last_error = None;
    for (index, branch) in branches.iter().enumerate() {
        if *branch == AvroKind::Null || !shape_matches(value, branch, tree) {
            continue;
        }
        match generic_to_avro(value, branch, tree) {
            Ok(converted) => return Ok(Value::Union(index as u32, Box::new(converted))),
            Err(e) => last_error = Some(e),
        }
    }

    Err(last_error.unwrap_or_else(|| {
        SerdeError::invalid_data(format!(
            "{} value does not match any union branch",
            value.type_name()
        ))
    }))
}

/// Coarse compatibility check between a value's shape and a union branch
fn shape_matches(value: &GenericValue, kind: &AvroKind, tree: &SchemaTree) -> bool {
    match (value, kind) {
        (GenericValue::Boolean(_), AvroKind::Boolean) => true,
        (
            GenericValue::Integer(_) | GenericValue::Float(_),
            AvroKind::Int
            | AvroKind::Long
            | AvroKind::Float
            | AvroKind::Double
            | AvroKind::Date
            | AvroKind::TimeMillis
            | AvroKind::TimeMicros
            | AvroKind::TimestampMillis
            | AvroKind::TimestampMicros
            | AvroKind::TimestampNanos
            | AvroKind::LocalTimestampMillis
            | AvroKind::LocalTimestampMicros
            | AvroKind::LocalTimestampNanos,
        ) => true,
        (GenericValue::String(_), AvroKind::String | AvroKind::Uuid) => true,
        (GenericValue::Bytes(_), AvroKind::Bytes | AvroKind::Decimal { .. }) => true,
        (GenericValue::Array(items), AvroKind::Bytes | AvroKind::Decimal { .. }) => {
            items.iter().all(GenericValue::is_number)
        }
        (GenericValue::Array(_), AvroKind::Array(_)) => true,
        (GenericValue::Object(_), AvroKind::Map(_)) => true,
        (value, AvroKind::Named(name)) => match (value, tree.lookup(name)) {
            (GenericValue::Object(_), Some(NamedKind::Record { .. })) => true,
            (GenericValue::String(symbol), Some(NamedKind::Enum { symbols, .. })) => {
                symbols.contains(symbol)
            }
            (GenericValue::Bytes(_) | GenericValue::Array(_), Some(NamedKind::Fixed { .. })) => {
                true
            }
            _ => false,
        },
        _ => false,
    }
}

fn accepts_null(kind: &AvroKind) -> bool {
    match kind {
        AvroKind::Null => true,
        AvroKind::Union(branches) => branches.contains(&AvroKind::Null),
        _ => false,
    }
}

/// Interpret a JSON field default for `kind`
///
/// Byte defaults are written as strings of code points 0-255; union defaults belong to the
/// first branch.
fn default_to_generic(default: &serde_json::Value, kind: &AvroKind) -> GenericValue {
    match (default, kind) {
        (serde_json::Value::String(s), AvroKind::Bytes | AvroKind::Decimal { .. }) => {
            GenericValue::Bytes(s.chars().map(|c| c as u32 as u8).collect())
        }
        (other, AvroKind::Union(branches)) => match branches.first() {
            Some(first) if !other.is_null() => {
                let inner = default_to_generic(other, first);
                if inner.is_null() {
                    inner
                } else {
                    let mut wrapped = BTreeMap::new();
                    wrapped.insert(first.branch_name().to_string(), inner);
                    GenericValue::Object(wrapped)
                }
            }
            _ => GenericValue::Null,
        },
        (other, _) => GenericValue::from(other.clone()),
    }
}

/// Best-effort conversion used when the schema does not constrain the value
fn untyped_to_avro(value: &GenericValue) -> Value {
    match value {
        GenericValue::Null => Value::Null,
        GenericValue::Boolean(b) => Value::Boolean(*b),
        GenericValue::Integer(i) => Value::Long(*i),
        GenericValue::Float(f) => Value::Double(*f),
        GenericValue::String(s) => Value::String(s.clone()),
        GenericValue::Bytes(bytes) => Value::Bytes(bytes.clone()),
        GenericValue::Array(items) => Value::Array(items.iter().map(untyped_to_avro).collect()),
        GenericValue::Object(map) => Value::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), untyped_to_avro(v)))
                .collect(),
        ),
    }
}

/// Convert a decoded Avro value to the tagged generic form
///
/// Non-null union values come back wrapped as `{branchName: value}`.
pub fn avro_to_tagged(value: &Value, kind: &AvroKind, tree: &SchemaTree) -> SerdeResult<GenericValue> {
    let converted = match (value, kind) {
        (Value::Union(index, inner), AvroKind::Union(branches)) => {
            let branch = branches.get(*index as usize).ok_or_else(|| {
                SerdeError::avro_decode(format!("union branch {} out of range", index), None)
            })?;
            match inner.as_ref() {
                Value::Null => GenericValue::Null,
                inner => {
                    let mut wrapped = BTreeMap::new();
                    wrapped.insert(
                        branch.branch_name().to_string(),
                        avro_to_tagged(inner, branch, tree)?,
                    );
                    GenericValue::Object(wrapped)
                }
            }
        }
        (Value::Record(fields), AvroKind::Named(name)) => {
            let declared = match tree.lookup(name) {
                Some(NamedKind::Record { fields, .. }) => fields.as_slice(),
                _ => &[],
            };
            let mut map = BTreeMap::new();
            for (field_name, field_value) in fields {
                let field_kind = declared
                    .iter()
                    .find(|f| &f.name == field_name)
                    .map(|f| &f.kind);
                let converted = match field_kind {
                    Some(field_kind) => avro_to_tagged(field_value, field_kind, tree)?,
                    None => avro_to_untyped(field_value)?,
                };
                map.insert(field_name.clone(), converted);
            }
            GenericValue::Object(map)
        }
        (Value::Array(items), AvroKind::Array(items_kind)) => GenericValue::Array(
            items
                .iter()
                .map(|item| avro_to_tagged(item, items_kind, tree))
                .collect::<SerdeResult<_>>()?,
        ),
        (Value::Map(map), AvroKind::Map(values_kind)) => GenericValue::Object(
            map.iter()
                .map(|(k, v)| Ok((k.clone(), avro_to_tagged(v, values_kind, tree)?)))
                .collect::<SerdeResult<_>>()?,
        ),
        (other, _) => avro_to_untyped(other)?,
    };
    Ok(converted)
}

fn avro_to_untyped(value: &Value) -> SerdeResult<GenericValue> {
    Ok(match value {
        Value::Null => GenericValue::Null,
        Value::Boolean(b) => GenericValue::Boolean(*b),
        Value::Int(i) => GenericValue::Integer(*i as i64),
        Value::Long(i) => GenericValue::Integer(*i),
        Value::Float(f) => GenericValue::Float(*f as f64),
        Value::Double(f) => GenericValue::Float(*f),
        Value::Bytes(bytes) => GenericValue::Bytes(bytes.clone()),
        Value::String(s) => GenericValue::String(s.clone()),
        Value::Fixed(_, bytes) => GenericValue::Bytes(bytes.clone()),
        Value::Enum(_, symbol) => GenericValue::String(symbol.clone()),
        Value::Union(_, inner) => avro_to_untyped(inner)?,
        Value::Array(items) => GenericValue::Array(
            items
                .iter()
                .map(avro_to_untyped)
                .collect::<SerdeResult<_>>()?,
        ),
        Value::Map(map) => GenericValue::Object(
            map.iter()
                .map(|(k, v)| Ok((k.clone(), avro_to_untyped(v)?)))
                .collect::<SerdeResult<_>>()?,
        ),
        Value::Record(fields) => GenericValue::Object(
            fields
                .iter()
                .map(|(k, v)| Ok((k.clone(), avro_to_untyped(v)?)))
                .collect::<SerdeResult<_>>()?,
        ),
        Value::Date(d) => GenericValue::Integer(*d as i64),
        Value::TimeMillis(t) => GenericValue::Integer(*t as i64),
        Value::TimeMicros(t)
        | Value::TimestampMillis(t)
        | Value::TimestampMicros(t)
        | Value::TimestampNanos(t)
        | Value::LocalTimestampMillis(t)
        | Value::LocalTimestampMicros(t)
        | Value::LocalTimestampNanos(t) => GenericValue::Integer(*t),
        Value::Uuid(u) => GenericValue::String(u.to_string()),
        Value::Decimal(decimal) => {
            let bytes: Vec<u8> = decimal.clone().try_into().map_err(|e: apache_avro::Error| {
                SerdeError::avro_decode("failed to extract bytes from decimal", Some(Box::new(e)))
            })?;
            GenericValue::Bytes(bytes)
        }
        other => {
            return Err(SerdeError::avro_decode(
                format!("unsupported Avro value: {:?}", other),
                None,
            ))
        }
    })
}

/// Collapse `{branchName: value}` union wrappers produced by [`avro_to_tagged`]
///
/// A wrapper whose key names no branch of the union is returned unchanged.
pub fn unwrap_union_values(value: GenericValue, kind: &AvroKind, tree: &SchemaTree) -> GenericValue {
    match (value, kind) {
        (GenericValue::Null, _) => GenericValue::Null,
        (value, AvroKind::Union(branches)) => unwrap_union_value(value, branches, tree),
        (GenericValue::Object(map), AvroKind::Named(name)) => match tree.lookup(name) {
            Some(NamedKind::Record { fields, .. }) => GenericValue::Object(
                map.into_iter()
                    .map(|(key, field_value)| {
                        let unwrapped = match fields.iter().find(|f| f.name == key) {
                            Some(field) => unwrap_union_values(field_value, &field.kind, tree),
                            None => field_value,
                        };
                        (key, unwrapped)
                    })
                    .collect(),
            ),
            _ => GenericValue::Object(map),
        },
        (GenericValue::Array(items), AvroKind::Array(items_kind)) => GenericValue::Array(
            items
                .into_iter()
                .map(|item| unwrap_union_values(item, items_kind, tree))
                .collect(),
        ),
        (GenericValue::Object(map), AvroKind::Map(values_kind)) => GenericValue::Object(
            map.into_iter()
                .map(|(k, v)| (k, unwrap_union_values(v, values_kind, tree)))
                .collect(),
        ),
        (value, _) => value,
    }
}

fn unwrap_union_value(value: GenericValue, branches: &[AvroKind], tree: &SchemaTree) -> GenericValue {
    let branch = match &value {
        GenericValue::Object(map) if map.len() == 1 => map.keys().next().and_then(|key| {
            branches
                .iter()
                .find(|b| **b != AvroKind::Null && b.branch_name() == key)
        }),
        _ => None,
    };

    match (branch, value) {
        (Some(branch), GenericValue::Object(map)) => {
            let inner = map.into_values().next().unwrap_or_default();
            unwrap_union_values(inner, branch, tree)
        }
        (_, value @ GenericValue::Object(_)) => {
            // not a wrapper: unwrap nested structure against a record branch if there is one
            let record = branches.iter().find(|b| match b {
                AvroKind::Named(name) => {
                    matches!(tree.lookup(name), Some(NamedKind::Record { .. }))
                }
                _ => false,
            });
            match record {
                Some(record) => unwrap_union_values(value, record, tree),
                None => {
                    log::debug!("Union value matches no branch, returning it unchanged");
                    value
                }
            }
        }
        (_, value) => value,
    }
}

fn mismatch(expected: &str, got: &GenericValue) -> SerdeError {
    SerdeError::invalid_data(format!("expected {}, got {}", expected, got.type_name()))
}

fn in_context(context: String, error: SerdeError) -> SerdeError {
    match error {
        SerdeError::InvalidDataType { message } => {
            SerdeError::invalid_data(format!("{}: {}", context, message))
        }
        other => other,
    }
}
