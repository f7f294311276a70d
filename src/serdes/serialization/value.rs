//! Caller-facing dynamic value
//!
//! `GenericValue` is the untyped tree callers hand to the engine and receive back from it.
//! It mirrors what a JSON-speaking host produces: numbers may arrive as floats even when the
//! target field is an integer, and unions carry no branch tag.

use std::collections::BTreeMap;
use std::fmt;

/// Untyped payload value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GenericValue {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<GenericValue>),
    Object(BTreeMap<String, GenericValue>),
}

impl GenericValue {
    /// Build an object from key/value pairs
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, GenericValue)>,
    {
        GenericValue::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, GenericValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            GenericValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, GenericValue>> {
        match self {
            GenericValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            GenericValue::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Numeric view, integers widened to f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            GenericValue::Integer(i) => Some(*i as f64),
            GenericValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, GenericValue::Integer(_) | GenericValue::Float(_))
    }

    /// Look up a key on an object value
    pub fn get(&self, key: &str) -> Option<&GenericValue> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Short name of the value's shape, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            GenericValue::Null => "null",
            GenericValue::Boolean(_) => "boolean",
            GenericValue::Integer(_) => "integer",
            GenericValue::Float(_) => "float",
            GenericValue::String(_) => "string",
            GenericValue::Bytes(_) => "bytes",
            GenericValue::Array(_) => "array",
            GenericValue::Object(_) => "object",
        }
    }

    /// Convert to a JSON tree. Bytes become an array of numbers, non-finite floats become null.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            GenericValue::Null => serde_json::Value::Null,
            GenericValue::Boolean(b) => serde_json::Value::Bool(*b),
            GenericValue::Integer(i) => serde_json::Value::Number((*i).into()),
            GenericValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            GenericValue::String(s) => serde_json::Value::String(s.clone()),
            GenericValue::Bytes(bytes) => serde_json::Value::Array(
                bytes
                    .iter()
                    .map(|b| serde_json::Value::Number((*b).into()))
                    .collect(),
            ),
            GenericValue::Array(items) => {
                serde_json::Value::Array(items.iter().map(GenericValue::to_json).collect())
            }
            GenericValue::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for GenericValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => GenericValue::Null,
            serde_json::Value::Bool(b) => GenericValue::Boolean(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    GenericValue::Integer(i)
                } else {
                    // u64 beyond i64::MAX falls back to float like any other JSON number
                    GenericValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => GenericValue::String(s),
            serde_json::Value::Array(items) => {
                GenericValue::Array(items.into_iter().map(GenericValue::from).collect())
            }
            serde_json::Value::Object(map) => GenericValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, GenericValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&GenericValue> for serde_json::Value {
    fn from(value: &GenericValue) -> Self {
        value.to_json()
    }
}

impl From<&str> for GenericValue {
    fn from(s: &str) -> Self {
        GenericValue::String(s.to_string())
    }
}

impl From<String> for GenericValue {
    fn from(s: String) -> Self {
        GenericValue::String(s)
    }
}

impl From<i64> for GenericValue {
    fn from(i: i64) -> Self {
        GenericValue::Integer(i)
    }
}

impl From<i32> for GenericValue {
    fn from(i: i32) -> Self {
        GenericValue::Integer(i as i64)
    }
}

impl From<f64> for GenericValue {
    fn from(f: f64) -> Self {
        GenericValue::Float(f)
    }
}

impl From<bool> for GenericValue {
    fn from(b: bool) -> Self {
        GenericValue::Boolean(b)
    }
}

impl From<Vec<u8>> for GenericValue {
    fn from(bytes: Vec<u8>) -> Self {
        GenericValue::Bytes(bytes)
    }
}

impl fmt::Display for GenericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}
