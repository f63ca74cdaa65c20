//! Normalized tool results.

use serde::{Deserialize, Serialize};

/// One result value: decoded JSON, or the raw text when decoding failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolValue {
    Json(serde_json::Value),
    Text(String),
}

impl ToolValue {
    /// Decode `raw` as JSON, keeping the text itself if it is not JSON.
    pub fn decode(raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(raw.to_string()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Json(value) => value.clone(),
            Self::Text(text) => serde_json::Value::String(text.clone()),
        }
    }
}

/// What a tool call produced. A call is atomic: there are no partial results.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ToolResult {
    #[default]
    Empty,
    Single(ToolValue),
    Many(Vec<ToolValue>),
}

impl ToolResult {
    /// Normalize transport content items.
    ///
    /// Zero items is `Empty`, exactly one is returned as a scalar, more keep
    /// their order.
    pub fn from_content_items<S: AsRef<str>>(items: &[S]) -> Self {
        let mut values: Vec<ToolValue> = items.iter().map(|i| ToolValue::decode(i.as_ref())).collect();
        match values.len() {
            0 => Self::Empty,
            1 => Self::Single(values.remove(0)),
            _ => Self::Many(values),
        }
    }

    /// Wrap a value produced in-process.
    pub fn from_value(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Empty,
            other => Self::Single(ToolValue::Json(other)),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Single(ToolValue::Text(text.into()))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The payload placed in a Tool message. `Empty` becomes `[]`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Empty => serde_json::Value::Array(Vec::new()),
            Self::Single(value) => value.to_json(),
            Self::Many(values) => values.iter().map(ToolValue::to_json).collect(),
        }
    }
}
