//! Typed access to validated tool arguments.

use crate::error::AideError;

/// Validated tool call arguments, always a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &serde_json::Value {
        &self.value
    }

    /// The arguments as a JSON object map, as sent over the wire.
    pub fn into_map(self) -> serde_json::Map<String, serde_json::Value> {
        match self.value {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        }
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, AideError> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| AideError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    /// Get an optional string argument.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(|v| v.as_str())
    }

    pub fn get_i64(&self, key: &str) -> Result<i64, AideError> {
        self.value
            .get(key)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| AideError::InvalidArgument(format!("Missing integer argument: {key}")))
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, AideError> {
        self.value
            .get(key)
            .and_then(|v| v.as_bool())
            .ok_or_else(|| AideError::InvalidArgument(format!("Missing boolean argument: {key}")))
    }

    /// Get a list-of-strings argument.
    pub fn get_string_array(&self, key: &str) -> Result<Vec<String>, AideError> {
        self.value
            .get(key)
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|i| i.as_str().map(str::to_string))
                    .collect()
            })
            .ok_or_else(|| AideError::InvalidArgument(format!("Missing array argument: {key}")))
    }

    /// Deserialize the entire arguments into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, AideError> {
        serde_json::from_value(self.value.clone()).map_err(|e| {
            AideError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}
