//! Tool schemas as discovered from a tool server.

use serde::{Deserialize, Serialize};

/// Schema for a tool exposed by a tool server.
///
/// Parameters keep the server's declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParamSpec>,
}

/// One declared parameter, as the wire described it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    /// The JSON-schema `type` keyword, if any.
    pub wire_type: Option<String>,
    /// For arrays, the `items.type` keyword.
    pub item_type: Option<String>,
    pub required: bool,
    pub description: Option<String>,
}

impl ToolSchema {
    /// Build a schema from a JSON-schema-like `input_schema` object.
    ///
    /// When the object has no `required` array every declared property is
    /// treated as required.
    pub fn from_wire(
        name: impl Into<String>,
        description: Option<String>,
        input_schema: &serde_json::Value,
    ) -> Self {
        let required: Option<Vec<&str>> = input_schema
            .get("required")
            .and_then(|v| v.as_array())
            .map(|names| names.iter().filter_map(|n| n.as_str()).collect());

        let parameters = input_schema
            .get("properties")
            .and_then(|p| p.as_object())
            .map(|props| {
                props
                    .iter()
                    .map(|(param, spec)| ParamSpec {
                        name: param.clone(),
                        wire_type: wire_type_of(spec),
                        item_type: spec.get("items").and_then(wire_type_of),
                        required: required
                            .as_ref()
                            .map_or(true, |names| names.contains(&param.as_str())),
                        description: spec
                            .get("description")
                            .and_then(|d| d.as_str())
                            .map(str::to_string),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: name.into(),
            description: description.unwrap_or_default(),
            parameters,
        }
    }

    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

// `type` may be a string or a list such as ["string", "null"]; the first
// non-null entry wins.
fn wire_type_of(spec: &serde_json::Value) -> Option<String> {
    match spec.get("type")? {
        serde_json::Value::String(t) => Some(t.clone()),
        serde_json::Value::Array(types) => types
            .iter()
            .filter_map(|t| t.as_str())
            .find(|t| *t != "null")
            .map(str::to_string),
        _ => None,
    }
}
