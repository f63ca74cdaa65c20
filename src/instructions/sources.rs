//! On-disk instruction tiers.
//!
//! Layout under the instruction root:
//!
//! ```text
//! system.yaml          system: [..]
//! domain/domain.yaml   domain: [..]
//! users/<user>.json    {"user": [..]}
//! ```
//!
//! A missing or unreadable tier is empty, never an error.

use std::path::{Path, PathBuf};

use crate::error::AideError;

#[derive(Debug, Clone)]
pub struct InstructionSources {
    root: PathBuf,
    user_id: String,
}

impl InstructionSources {
    pub fn new(root: impl Into<PathBuf>, user_id: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            user_id: user_id.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn system_path(&self) -> PathBuf {
        self.root.join("system.yaml")
    }

    pub fn domain_path(&self) -> PathBuf {
        self.root.join("domain").join("domain.yaml")
    }

    pub fn user_path(&self) -> PathBuf {
        self.root.join("users").join(format!("{}.json", self.user_id))
    }

    pub async fn system_tier(&self) -> Vec<String> {
        load_yaml_list(&self.system_path(), "system").await
    }

    pub async fn domain_tier(&self) -> Vec<String> {
        load_yaml_list(&self.domain_path(), "domain").await
    }

    pub async fn user_tier(&self) -> Vec<String> {
        let path = self.user_path();
        let Some(raw) = read_optional(&path).await else {
            return Vec::new();
        };
        match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(doc) => doc
                .get("user")
                .and_then(|v| v.as_array())
                .map(|items| items.iter().filter_map(json_line).collect())
                .unwrap_or_default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "malformed user tier, using empty tier");
                Vec::new()
            }
        }
    }

    /// Overwrite the user tier document with `preferences`.
    pub async fn write_user_tier(&self, preferences: &[String]) -> Result<(), AideError> {
        let path = self.user_path();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let doc = serde_json::json!({ "user": preferences });
        let body = serde_json::to_string_pretty(&doc)?;
        tokio::fs::write(&path, body).await?;
        tracing::debug!(path = %path.display(), count = preferences.len(), "user tier updated");
        Ok(())
    }
}

async fn read_optional(path: &Path) -> Option<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => Some(raw),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "instruction tier missing");
            None
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "instruction tier unreadable");
            None
        }
    }
}

async fn load_yaml_list(path: &Path, key: &str) -> Vec<String> {
    let Some(raw) = read_optional(path).await else {
        return Vec::new();
    };
    match serde_yaml::from_str::<serde_yaml::Value>(&raw) {
        Ok(doc) => doc
            .get(key)
            .and_then(|v| v.as_sequence())
            .map(|items| items.iter().filter_map(yaml_line).collect())
            .unwrap_or_default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "malformed instruction tier, using empty tier");
            Vec::new()
        }
    }
}

fn yaml_line(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn json_line(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
