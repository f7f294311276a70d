//! Structural description of an Avro schema
//!
//! Conversions between generic values and Avro values dispatch on [`AvroKind`], computed once
//! when a schema is compiled. Named types (records, enums, fixed) live in a side table keyed by
//! full name so recursive and repeated references share one definition.
//!
//! This module also performs reference inlining: schema text that mentions a named type it does
//! not define is rewritten so that the referenced schema is embedded at its first use.

use crate::serdes::error::{SerdeError, SerdeResult};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

const PRIMITIVES: &[&str] = &[
    "null", "boolean", "int", "long", "float", "double", "bytes", "string",
];

/// Kind of an Avro schema node
#[derive(Debug, Clone, PartialEq)]
pub enum AvroKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Date,
    TimeMillis,
    TimeMicros,
    TimestampMillis,
    TimestampMicros,
    TimestampNanos,
    LocalTimestampMillis,
    LocalTimestampMicros,
    LocalTimestampNanos,
    Uuid,
    Decimal { precision: usize, scale: usize },
    Array(Box<AvroKind>),
    Map(Box<AvroKind>),
    Union(Vec<AvroKind>),
    /// Record, enum or fixed, looked up in [`SchemaTree::named`]
    Named(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldKind {
    pub name: String,
    pub kind: AvroKind,
    pub default: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NamedKind {
    Record {
        name: String,
        fields: Vec<FieldKind>,
    },
    Enum {
        name: String,
        symbols: Vec<String>,
    },
    Fixed {
        name: String,
        size: usize,
        decimal: bool,
    },
}

impl AvroKind {
    /// Name used to tag a union branch: the full name for named types, the type name otherwise
    pub fn branch_name(&self) -> &str {
        match self {
            AvroKind::Null => "null",
            AvroKind::Boolean => "boolean",
            AvroKind::Int | AvroKind::Date | AvroKind::TimeMillis => "int",
            AvroKind::Long
            | AvroKind::TimeMicros
            | AvroKind::TimestampMillis
            | AvroKind::TimestampMicros
            | AvroKind::TimestampNanos
            | AvroKind::LocalTimestampMillis
            | AvroKind::LocalTimestampMicros
            | AvroKind::LocalTimestampNanos => "long",
            AvroKind::Float => "float",
            AvroKind::Double => "double",
            AvroKind::Bytes | AvroKind::Decimal { .. } => "bytes",
            AvroKind::String | AvroKind::Uuid => "string",
            AvroKind::Array(_) => "array",
            AvroKind::Map(_) => "map",
            AvroKind::Union(_) => "union",
            AvroKind::Named(name) => name,
        }
    }
}

/// Parsed schema: the root kind plus every named type it defines
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaTree {
    pub root: AvroKind,
    pub named: HashMap<String, NamedKind>,
}

impl SchemaTree {
    pub fn parse(json: &Value) -> SerdeResult<Self> {
        let mut parser = TreeParser::default();
        let root = parser.parse(json, None)?;
        if let Some(missing) = parser
            .referenced
            .iter()
            .find(|name| !parser.named.contains_key(*name))
        {
            return Err(SerdeError::ReferenceNotFound {
                name: missing.clone(),
            });
        }
        Ok(SchemaTree {
            root,
            named: parser.named,
        })
    }

    pub fn parse_str(text: &str) -> SerdeResult<Self> {
        let json: Value = serde_json::from_str(text)
            .map_err(|e| SerdeError::invalid_schema_with_source("schema is not valid JSON", e))?;
        Self::parse(&json)
    }

    /// Follow a `Named` kind to its definition
    pub fn lookup(&self, name: &str) -> Option<&NamedKind> {
        self.named.get(name)
    }

    /// Full name of the root type when it is a named type
    pub fn full_name(&self) -> Option<&str> {
        match &self.root {
            AvroKind::Named(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Default)]
struct TreeParser {
    named: HashMap<String, NamedKind>,
    referenced: HashSet<String>,
}

impl TreeParser {
    fn parse(&mut self, json: &Value, namespace: Option<&str>) -> SerdeResult<AvroKind> {
        match json {
            Value::String(name) => Ok(self.parse_type_name(name, namespace)),
            Value::Array(branches) => {
                let kinds = branches
                    .iter()
                    .map(|branch| self.parse(branch, namespace))
                    .collect::<SerdeResult<Vec<_>>>()?;
                Ok(AvroKind::Union(kinds))
            }
            Value::Object(obj) => self.parse_object(obj, namespace),
            other => Err(SerdeError::invalid_schema(format!(
                "unexpected schema node: {}",
                other
            ))),
        }
    }

    fn parse_type_name(&mut self, name: &str, namespace: Option<&str>) -> AvroKind {
        match name {
            "null" => AvroKind::Null,
            "boolean" => AvroKind::Boolean,
            "int" => AvroKind::Int,
            "long" => AvroKind::Long,
            "float" => AvroKind::Float,
            "double" => AvroKind::Double,
            "bytes" => AvroKind::Bytes,
            "string" => AvroKind::String,
            _ => {
                let qualified = qualify(name, namespace);
                let full = if self.named.contains_key(&qualified) || !self.named.contains_key(name)
                {
                    qualified
                } else {
                    name.to_string()
                };
                self.referenced.insert(full.clone());
                AvroKind::Named(full)
            }
        }
    }

    fn parse_object(
        &mut self,
        obj: &Map<String, Value>,
        namespace: Option<&str>,
    ) -> SerdeResult<AvroKind> {
        let type_value = obj
            .get("type")
            .ok_or_else(|| SerdeError::invalid_schema("schema object has no \"type\""))?;

        let type_name = match type_value {
            Value::String(t) => t.as_str(),
            nested => return self.parse(nested, namespace),
        };

        match type_name {
            "record" | "error" => self.parse_record(obj, namespace),
            "enum" => self.parse_enum(obj, namespace),
            "fixed" => self.parse_fixed(obj, namespace),
            "array" => {
                let items = obj
                    .get("items")
                    .ok_or_else(|| SerdeError::invalid_schema("array schema has no \"items\""))?;
                Ok(AvroKind::Array(Box::new(self.parse(items, namespace)?)))
            }
            "map" => {
                let values = obj
                    .get("values")
                    .ok_or_else(|| SerdeError::invalid_schema("map schema has no \"values\""))?;
                Ok(AvroKind::Map(Box::new(self.parse(values, namespace)?)))
            }
            primitive => {
                let base = self.parse_type_name(primitive, namespace);
                Ok(apply_logical_type(base, obj))
            }
        }
    }

    fn parse_record(
        &mut self,
        obj: &Map<String, Value>,
        namespace: Option<&str>,
    ) -> SerdeResult<AvroKind> {
        let full = named_full_name(obj, namespace)?;
        let record_namespace = namespace_of(&full);

        // registered before the fields so self-references resolve
        self.named.insert(
            full.clone(),
            NamedKind::Record {
                name: full.clone(),
                fields: Vec::new(),
            },
        );

        let raw_fields = obj
            .get("fields")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                SerdeError::invalid_schema(format!("record '{}' has no \"fields\" array", full))
            })?;

        let mut fields = Vec::with_capacity(raw_fields.len());
        for raw in raw_fields {
            let name = raw
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    SerdeError::invalid_schema(format!("field in record '{}' has no name", full))
                })?;
            let type_value = raw.get("type").ok_or_else(|| {
                SerdeError::invalid_schema(format!("field '{}.{}' has no type", full, name))
            })?;
            let kind = self.parse(type_value, record_namespace.as_deref())?;
            fields.push(FieldKind {
                name: name.to_string(),
                kind,
                default: raw.get("default").cloned(),
            });
        }

        self.named.insert(
            full.clone(),
            NamedKind::Record {
                name: full.clone(),
                fields,
            },
        );
        Ok(AvroKind::Named(full))
    }

    fn parse_enum(
        &mut self,
        obj: &Map<String, Value>,
        namespace: Option<&str>,
    ) -> SerdeResult<AvroKind> {
        let full = named_full_name(obj, namespace)?;
        let symbols = obj
            .get("symbols")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                SerdeError::invalid_schema(format!("enum '{}' has no \"symbols\" array", full))
            })?
            .iter()
            .filter_map(|s| s.as_str().map(str::to_string))
            .collect();
        self.named.insert(
            full.clone(),
            NamedKind::Enum {
                name: full.clone(),
                symbols,
            },
        );
        Ok(AvroKind::Named(full))
    }

    fn parse_fixed(
        &mut self,
        obj: &Map<String, Value>,
        namespace: Option<&str>,
    ) -> SerdeResult<AvroKind> {
        let full = named_full_name(obj, namespace)?;
        let size = obj
            .get("size")
            .and_then(Value::as_u64)
            .ok_or_else(|| SerdeError::invalid_schema(format!("fixed '{}' has no size", full)))?
            as usize;
        let decimal = obj.get("logicalType").and_then(Value::as_str) == Some("decimal");
        self.named.insert(
            full.clone(),
            NamedKind::Fixed {
                name: full.clone(),
                size,
                decimal,
            },
        );
        Ok(AvroKind::Named(full))
    }
}

fn apply_logical_type(base: AvroKind, obj: &Map<String, Value>) -> AvroKind {
    let Some(logical) = obj.get("logicalType").and_then(Value::as_str) else {
        return base;
    };
    match (&base, logical) {
        (AvroKind::Int, "date") => AvroKind::Date,
        (AvroKind::Int, "time-millis") => AvroKind::TimeMillis,
        (AvroKind::Long, "time-micros") => AvroKind::TimeMicros,
        (AvroKind::Long, "timestamp-millis") => AvroKind::TimestampMillis,
        (AvroKind::Long, "timestamp-micros") => AvroKind::TimestampMicros,
        (AvroKind::Long, "timestamp-nanos") => AvroKind::TimestampNanos,
        (AvroKind::Long, "local-timestamp-millis") => AvroKind::LocalTimestampMillis,
        (AvroKind::Long, "local-timestamp-micros") => AvroKind::LocalTimestampMicros,
        (AvroKind::Long, "local-timestamp-nanos") => AvroKind::LocalTimestampNanos,
        (AvroKind::String, "uuid") => AvroKind::Uuid,
        (AvroKind::Bytes, "decimal") => match obj.get("precision").and_then(Value::as_u64) {
            Some(precision) => AvroKind::Decimal {
                precision: precision as usize,
                scale: obj.get("scale").and_then(Value::as_u64).unwrap_or(0) as usize,
            },
            None => base,
        },
        // unknown logical types fall back to the underlying type
        _ => base,
    }
}

fn qualify(name: &str, namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() && !name.contains('.') => format!("{}.{}", ns, name),
        _ => name.to_string(),
    }
}

fn namespace_of(full_name: &str) -> Option<String> {
    full_name
        .rsplit_once('.')
        .map(|(namespace, _)| namespace.to_string())
}

fn named_full_name(obj: &Map<String, Value>, enclosing: Option<&str>) -> SerdeResult<String> {
    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| SerdeError::invalid_schema("named type has no \"name\""))?;
    if name.contains('.') {
        return Ok(name.to_string());
    }
    let namespace = match obj.get("namespace").and_then(Value::as_str) {
        Some(ns) => Some(ns),
        None => enclosing,
    };
    Ok(qualify(name, namespace))
}

/// Read the full name (namespace + name) from raw schema text without compiling it
pub fn extract_full_name(schema_text: &str) -> Option<String> {
    let json: Value = serde_json::from_str(schema_text).ok()?;
    let obj = json.as_object()?;
    named_full_name(obj, None).ok()
}

/// Rewrites schema JSON so that every named type it uses but does not define is embedded
///
/// `resolve` receives the name as written and its namespace-qualified form, and returns the
/// (already self-contained) JSON of the referenced schema, or `None` when it cannot be found.
/// A type is embedded once, at its first use; later uses stay as name references. Named types
/// already defined in the document are not embedded twice.
pub fn inline_references<F>(schema: &Value, resolve: &mut F) -> SerdeResult<Value>
where
    F: FnMut(&str, &str) -> SerdeResult<Option<Value>>,
{
    let mut inliner = Inliner {
        defined: HashSet::new(),
        aliases: HashMap::new(),
        resolve,
    };
    inliner.walk(schema, None)
}

struct Inliner<'a, F> {
    defined: HashSet<String>,
    aliases: HashMap<String, String>,
    resolve: &'a mut F,
}

impl<F> Inliner<'_, F>
where
    F: FnMut(&str, &str) -> SerdeResult<Option<Value>>,
{
    fn walk(&mut self, node: &Value, namespace: Option<&str>) -> SerdeResult<Value> {
        match node {
            Value::String(name) => self.walk_name(name, namespace),
            Value::Array(branches) => Ok(Value::Array(
                branches
                    .iter()
                    .map(|branch| self.walk(branch, namespace))
                    .collect::<SerdeResult<_>>()?,
            )),
            Value::Object(obj) => self.walk_object(obj, namespace),
            other => Ok(other.clone()),
        }
    }

    fn walk_name(&mut self, name: &str, namespace: Option<&str>) -> SerdeResult<Value> {
        if PRIMITIVES.contains(&name) {
            return Ok(Value::String(name.to_string()));
        }
        let qualified = qualify(name, namespace);
        if self.defined.contains(&qualified) {
            return Ok(Value::String(qualified));
        }
        if self.defined.contains(name) {
            return Ok(Value::String(name.to_string()));
        }
        if let Some(actual) = self
            .aliases
            .get(name)
            .or_else(|| self.aliases.get(&qualified))
        {
            return Ok(Value::String(actual.clone()));
        }

        let referenced = (self.resolve)(name, &qualified)?.ok_or_else(|| {
            SerdeError::ReferenceNotFound {
                name: name.to_string(),
            }
        })?;
        log::debug!("Inlining referenced schema '{}'", name);

        let mut inlined = self.walk(&referenced, None)?;
        if let Value::Object(obj) = &mut inlined {
            if let Ok(actual) = named_full_name(obj, None) {
                if actual != name {
                    self.aliases.insert(name.to_string(), actual.clone());
                }
                // keep the embedded type in its own namespace, not the enclosing one
                if namespace.is_some() && !obj.contains_key("namespace") && !actual.contains('.')
                {
                    obj.insert("namespace".to_string(), Value::String(String::new()));
                }
            }
        }
        Ok(inlined)
    }

    fn walk_object(
        &mut self,
        obj: &Map<String, Value>,
        namespace: Option<&str>,
    ) -> SerdeResult<Value> {
        let type_name = match obj.get("type") {
            Some(Value::String(t)) => t.as_str(),
            Some(nested) => {
                let mut out = obj.clone();
                out.insert("type".to_string(), self.walk(nested, namespace)?);
                return Ok(Value::Object(out));
            }
            None => return Ok(Value::Object(obj.clone())),
        };

        let mut out = obj.clone();
        match type_name {
            "record" | "error" | "enum" | "fixed" => {
                let full = named_full_name(obj, namespace)?;
                if self.defined.contains(&full) {
                    return Ok(Value::String(full));
                }
                self.defined.insert(full.clone());
                if matches!(type_name, "record" | "error") {
                    let record_namespace = namespace_of(&full);
                    if let Some(Value::Array(fields)) = obj.get("fields") {
                        let mut walked = Vec::with_capacity(fields.len());
                        for field in fields {
                            let mut field = field.clone();
                            if let Some(field_type) = field.get("type").cloned() {
                                let resolved =
                                    self.walk(&field_type, record_namespace.as_deref())?;
                                if let Value::Object(f) = &mut field {
                                    f.insert("type".to_string(), resolved);
                                }
                            }
                            walked.push(field);
                        }
                        out.insert("fields".to_string(), Value::Array(walked));
                    }
                }
            }
            "array" => {
                if let Some(items) = obj.get("items") {
                    out.insert("items".to_string(), self.walk(items, namespace)?);
                }
            }
            "map" => {
                if let Some(values) = obj.get("values") {
                    out.insert("values".to_string(), self.walk(values, namespace)?);
                }
            }
            primitive if PRIMITIVES.contains(&primitive) => {}
            reference => {
                out.insert("type".to_string(), self.walk_name(reference, namespace)?);
            }
        }
        Ok(Value::Object(out))
    }
}
