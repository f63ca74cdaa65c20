//! Typed argument shapes and their validator.
//!
//! A shape is the strict, lossy projection of a wire schema onto the five
//! kinds the loop understands. Wire types outside that set degrade to
//! `string` and are recorded, never rejected.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::arguments::ToolArguments;
use crate::error::AideError;
use crate::mcp::ToolSchema;

/// Argument kinds a tool may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ParamKind {
    String,
    Number,
    Integer,
    Boolean,
    StringArray,
}

impl ParamKind {
    /// Map a wire `type` (and `items.type` for arrays) onto a kind.
    /// `None` means the wire type is outside the supported set.
    pub fn from_wire(wire_type: Option<&str>, item_type: Option<&str>) -> Option<Self> {
        match wire_type? {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            "array" => match item_type {
                None | Some("string") => Some(Self::StringArray),
                Some(_) => None,
            },
            _ => None,
        }
    }

    fn json_schema(&self) -> serde_json::Value {
        match self {
            Self::StringArray => serde_json::json!({"type": "array", "items": {"type": "string"}}),
            Self::String => serde_json::json!({"type": "string"}),
            Self::Number => serde_json::json!({"type": "number"}),
            Self::Integer => serde_json::json!({"type": "integer"}),
            Self::Boolean => serde_json::json!({"type": "boolean"}),
        }
    }
}

/// One declared argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgSpec {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    pub description: Option<String>,
    /// Set when the wire type was unsupported and this argument fell back to
    /// `string`.
    #[serde(default)]
    pub degraded: bool,
}

/// A wire type that was mapped to `string`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDegradation {
    pub tool: String,
    pub parameter: String,
    pub wire_type: String,
}

/// Ordered argument declarations for one tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgumentShape {
    args: Vec<ArgSpec>,
    degradations: Vec<SchemaDegradation>,
}

impl ArgumentShape {
    /// A shape with no arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a string argument.
    pub fn string(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.push(name, ParamKind::String, description, required)
    }

    /// Add a number argument.
    pub fn number(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.push(name, ParamKind::Number, description, required)
    }

    /// Add an integer argument.
    pub fn integer(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.push(name, ParamKind::Integer, description, required)
    }

    /// Add a boolean argument.
    pub fn boolean(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.push(name, ParamKind::Boolean, description, required)
    }

    /// Add a list-of-strings argument.
    pub fn string_array(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.push(name, ParamKind::StringArray, description, required)
    }

    fn push(
        mut self,
        name: impl Into<String>,
        kind: ParamKind,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        let description = description.into();
        self.args.push(ArgSpec {
            name: name.into(),
            kind,
            required,
            description: (!description.is_empty()).then_some(description),
            degraded: false,
        });
        self
    }

    /// Project a wire schema onto a shape, degrading unsupported types.
    pub fn from_schema(schema: &ToolSchema) -> Self {
        let mut shape = Self::new();
        for param in &schema.parameters {
            let kind = ParamKind::from_wire(param.wire_type.as_deref(), param.item_type.as_deref());
            let degraded = kind.is_none();
            if degraded {
                let wire_type = match (&param.wire_type, &param.item_type) {
                    (Some(t), Some(items)) => format!("{t}<{items}>"),
                    (Some(t), None) => t.clone(),
                    (None, _) => "unspecified".to_string(),
                };
                tracing::warn!(
                    tool = %schema.name,
                    parameter = %param.name,
                    wire_type = %wire_type,
                    "unsupported wire type, treating as string"
                );
                shape.degradations.push(SchemaDegradation {
                    tool: schema.name.clone(),
                    parameter: param.name.clone(),
                    wire_type,
                });
            }
            shape.args.push(ArgSpec {
                name: param.name.clone(),
                kind: kind.unwrap_or(ParamKind::String),
                required: param.required,
                description: param.description.clone(),
                degraded,
            });
        }
        shape
    }

    pub fn args(&self) -> &[ArgSpec] {
        &self.args
    }

    pub fn arg(&self, name: &str) -> Option<&ArgSpec> {
        self.args.iter().find(|a| a.name == name)
    }

    pub fn degradations(&self) -> &[SchemaDegradation] {
        &self.degradations
    }

    /// Check raw model-provided arguments and produce the validated set.
    ///
    /// Undeclared keys are dropped. Degraded arguments accept any value and
    /// forward non-strings as their JSON text.
    pub fn validate(&self, raw: &serde_json::Value) -> Result<ToolArguments, AideError> {
        let object = match raw {
            serde_json::Value::Null => serde_json::Map::new(),
            serde_json::Value::Object(map) => map.clone(),
            serde_json::Value::String(text) if text.trim().is_empty() => serde_json::Map::new(),
            serde_json::Value::String(text) => match serde_json::from_str(text.trim()) {
                Ok(serde_json::Value::Object(map)) => map,
                _ => {
                    return Err(AideError::InvalidArgument(
                        "arguments must be a JSON object".into(),
                    ))
                }
            },
            other => {
                return Err(AideError::InvalidArgument(format!(
                    "expected object arguments, got {}",
                    json_type_name(other)
                )))
            }
        };

        let mut validated = serde_json::Map::new();
        for spec in &self.args {
            match object.get(&spec.name) {
                None | Some(serde_json::Value::Null) => {
                    if spec.required {
                        return Err(AideError::InvalidArgument(format!(
                            "missing required field '{}'",
                            spec.name
                        )));
                    }
                }
                Some(value) => {
                    let coerced = coerce(spec, value)?;
                    validated.insert(spec.name.clone(), coerced);
                }
            }
        }

        for key in object.keys().filter(|k| self.arg(k).is_none()) {
            tracing::debug!(field = %key, "dropping undeclared argument");
        }

        Ok(ToolArguments::new(serde_json::Value::Object(validated)))
    }

    /// JSON Schema for the model's function-calling interface.
    pub fn to_json_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        for spec in &self.args {
            let mut prop = spec.kind.json_schema();
            if let Some(description) = &spec.description {
                prop["description"] = serde_json::Value::String(description.clone());
            }
            properties.insert(spec.name.clone(), prop);
        }
        let required: Vec<&str> = self
            .args
            .iter()
            .filter(|a| a.required)
            .map(|a| a.name.as_str())
            .collect();
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

fn coerce(spec: &ArgSpec, value: &serde_json::Value) -> Result<serde_json::Value, AideError> {
    use serde_json::Value;

    let mismatch = || {
        AideError::InvalidArgument(format!(
            "field '{}' expected type '{}', got {}",
            spec.name,
            spec.kind,
            json_type_name(value)
        ))
    };

    match (spec.kind, value) {
        (ParamKind::String, Value::String(_)) => Ok(value.clone()),
        (ParamKind::String, other) if spec.degraded => Ok(Value::String(other.to_string())),
        (ParamKind::Number, Value::Number(_)) => Ok(value.clone()),
        (ParamKind::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(value.clone()),
        // Some models emit whole numbers as floats.
        (ParamKind::Integer, Value::Number(n)) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Value::from(f as i64)),
            _ => Err(mismatch()),
        },
        (ParamKind::Boolean, Value::Bool(_)) => Ok(value.clone()),
        (ParamKind::StringArray, Value::Array(items)) => {
            if items.iter().all(Value::is_string) {
                Ok(value.clone())
            } else {
                Err(AideError::InvalidArgument(format!(
                    "field '{}' expected a list of strings",
                    spec.name
                )))
            }
        }
        _ => Err(mismatch()),
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
