//! Declarative argument schemas and structural validation.
//!
//! A [`SchemaSpec`] is the single source of truth for a tool's argument
//! shape: the same instance renders the JSON schema advertised to the
//! model and validates the raw arguments the model sends back, so the
//! two can never drift apart.

use crate::tools::Violation;
use serde_json::{Map, Value, json};

/// The expected kind of a parameter value.
#[derive(Debug, Clone)]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
    /// A nested object with its own named fields.
    Object(Vec<ParamSpec>),
    /// A homogeneous array of the given element kind.
    Array(Box<ParamKind>),
}

impl ParamKind {
    fn type_name(&self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::Integer => "INTEGER",
            Self::Number => "NUMBER",
            Self::Boolean => "BOOLEAN",
            Self::Object(_) => "OBJECT",
            Self::Array(_) => "ARRAY",
        }
    }

    fn expected(&self) -> &'static str {
        match self {
            Self::String => "expected string",
            Self::Integer => "expected integer",
            Self::Number => "expected number",
            Self::Boolean => "expected boolean",
            Self::Object(_) => "expected object",
            Self::Array(_) => "expected array",
        }
    }
}

/// Specification of a single parameter.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub description: String,
    pub kind: ParamKind,
    /// Whether the field must be present. Defaults to required.
    pub required: bool,
    /// Whether compatible scalar values may be converted (e.g. a
    /// numeric string for an integer parameter). Off by default; no
    /// conversion ever happens between incompatible kinds.
    pub coerce: bool,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            required: true,
            coerce: false,
        }
    }

    /// Mark this parameter as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Allow lenient scalar conversion for this parameter.
    pub fn coercible(mut self) -> Self {
        self.coerce = true;
        self
    }
}

/// Declarative description of a tool's argument object.
#[derive(Debug, Clone, Default)]
pub struct SchemaSpec {
    params: Vec<ParamSpec>,
}

impl SchemaSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter (builder pattern).
    pub fn with(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Render the JSON schema advertised to the model.
    pub fn to_json_schema(&self) -> Value {
        object_schema(&self.params)
    }

    /// Validate raw arguments against this schema.
    ///
    /// All violations are collected and reported together rather than
    /// failing on the first. On success the returned value contains
    /// the declared fields, with coercions applied where a parameter
    /// allows them; undeclared fields are dropped.
    pub fn validate(&self, raw: &Value) -> Result<Value, Vec<Violation>> {
        let mut violations = Vec::new();
        let normalized = validate_object(&self.params, raw, "", &mut violations);
        if violations.is_empty() {
            Ok(normalized)
        } else {
            Err(violations)
        }
    }
}

fn object_schema(params: &[ParamSpec]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for param in params {
        properties.insert(param.name.clone(), param_schema(param));
        if param.required {
            required.push(json!(param.name));
        }
    }

    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": required,
    })
}

fn param_schema(param: &ParamSpec) -> Value {
    let mut schema = kind_schema(&param.kind);
    if let Value::Object(map) = &mut schema {
        map.insert("description".into(), json!(param.description));
    }
    schema
}

fn kind_schema(kind: &ParamKind) -> Value {
    match kind {
        ParamKind::Object(fields) => object_schema(fields),
        ParamKind::Array(items) => json!({
            "type": "ARRAY",
            "items": kind_schema(items),
        }),
        scalar => json!({ "type": scalar.type_name() }),
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn validate_object(
    params: &[ParamSpec],
    raw: &Value,
    prefix: &str,
    violations: &mut Vec<Violation>,
) -> Value {
    // Absent arguments are treated as an empty object so that each
    // required field reports its own violation.
    let empty = Map::new();
    let fields = match raw {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => {
            let path = if prefix.is_empty() { "$" } else { prefix };
            violations.push(Violation::new(path, "expected object"));
            return Value::Object(Map::new());
        }
    };

    let mut normalized = Map::new();
    for param in params {
        let path = join_path(prefix, &param.name);
        match fields.get(&param.name) {
            Some(value) => {
                if let Some(checked) = validate_value(param, value, &path, violations) {
                    normalized.insert(param.name.clone(), checked);
                }
            }
            None if param.required => {
                violations.push(Violation::new(path, "missing required field"));
            }
            None => {}
        }
    }
    Value::Object(normalized)
}

fn validate_value(
    param: &ParamSpec,
    value: &Value,
    path: &str,
    violations: &mut Vec<Violation>,
) -> Option<Value> {
    validate_kind(&param.kind, param.coerce, value, path, violations)
}

fn validate_kind(
    kind: &ParamKind,
    coerce: bool,
    value: &Value,
    path: &str,
    violations: &mut Vec<Violation>,
) -> Option<Value> {
    match kind {
        ParamKind::String => match value {
            Value::String(_) => Some(value.clone()),
            _ => {
                violations.push(Violation::new(path, kind.expected()));
                None
            }
        },
        ParamKind::Integer => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(value.clone()),
            Value::String(s) if coerce => match s.trim().parse::<i64>() {
                Ok(n) => Some(json!(n)),
                Err(_) => {
                    violations.push(Violation::new(path, "expected integer"));
                    None
                }
            },
            _ => {
                violations.push(Violation::new(path, kind.expected()));
                None
            }
        },
        ParamKind::Number => match value {
            Value::Number(_) => Some(value.clone()),
            Value::String(s) if coerce => match s.trim().parse::<f64>() {
                Ok(n) => Some(json!(n)),
                Err(_) => {
                    violations.push(Violation::new(path, "expected number"));
                    None
                }
            },
            _ => {
                violations.push(Violation::new(path, kind.expected()));
                None
            }
        },
        ParamKind::Boolean => match value {
            Value::Bool(_) => Some(value.clone()),
            Value::String(s) if coerce => match s.trim() {
                "true" => Some(json!(true)),
                "false" => Some(json!(false)),
                _ => {
                    violations.push(Violation::new(path, "expected boolean"));
                    None
                }
            },
            _ => {
                violations.push(Violation::new(path, kind.expected()));
                None
            }
        },
        ParamKind::Object(fields) => match value {
            Value::Object(_) => Some(validate_object(fields, value, path, violations)),
            _ => {
                violations.push(Violation::new(path, kind.expected()));
                None
            }
        },
        ParamKind::Array(items) => match value {
            Value::Array(elements) => {
                let mut checked = Vec::with_capacity(elements.len());
                for (i, element) in elements.iter().enumerate() {
                    let element_path = format!("{path}[{i}]");
                    if let Some(v) =
                        validate_kind(items, coerce, element, &element_path, violations)
                    {
                        checked.push(v);
                    }
                }
                Some(Value::Array(checked))
            }
            _ => {
                violations.push(Violation::new(path, kind.expected()));
                None
            }
        },
    }
}
