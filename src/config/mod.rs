//! Configuration (layered: defaults < TOML file < environment and `.env`).

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::agent_loop::LoopLimits;
use crate::error::AideError;
use crate::instructions::compiler::DEFAULT_PREFERENCE_QUERY;
use crate::memory::{Embedder, HashEmbedder, HttpEmbedder};
use crate::types::GenerationSettings;

/// Which embedding function backs the fact store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum EmbeddingProvider {
    #[default]
    Hash,
    OpenaiCompatible,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub dimensions: usize,
    pub base_url: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Hash,
            dimensions: HashEmbedder::DEFAULT_DIMENSIONS,
            base_url: None,
            api_key: None,
            model: None,
        }
    }
}

impl std::fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("provider", &self.provider)
            .field("dimensions", &self.dimensions)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| ".."))
            .field("model", &self.model)
            .finish()
    }
}

/// Everything needed to start a session.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AideConfig {
    pub model: String,
    #[serde(skip_serializing)]
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: Option<String>,
    /// Tool server: a `.py` or `.js` script, or an `http(s)://` URL.
    pub server: Option<String>,
    pub instruction_dir: PathBuf,
    pub user_id: String,
    pub fact_store_path: PathBuf,
    pub embedding: EmbeddingConfig,
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
    pub model_timeout_secs: u64,
    pub tool_timeout_secs: u64,
    pub max_iterations: usize,
    pub preference_query: String,
    pub preference_limit: usize,
}

impl Default for AideConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            gemini_api_key: None,
            gemini_base_url: None,
            server: None,
            instruction_dir: PathBuf::from("instruction"),
            user_id: "user1".to_string(),
            fact_store_path: default_fact_store_path(),
            embedding: EmbeddingConfig::default(),
            temperature: None,
            max_output_tokens: None,
            model_timeout_secs: 120,
            tool_timeout_secs: 60,
            max_iterations: 20,
            preference_query: DEFAULT_PREFERENCE_QUERY.to_string(),
            preference_limit: 3,
        }
    }
}

impl std::fmt::Debug for AideConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AideConfig")
            .field("model", &self.model)
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| ".."))
            .field("gemini_base_url", &self.gemini_base_url)
            .field("server", &self.server)
            .field("instruction_dir", &self.instruction_dir)
            .field("user_id", &self.user_id)
            .field("fact_store_path", &self.fact_store_path)
            .field("embedding", &self.embedding)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("max_iterations", &self.max_iterations)
            .finish()
    }
}

fn default_fact_store_path() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".aide"))
        .unwrap_or_else(|| PathBuf::from(".aide"))
        .join("facts.jsonl")
}

impl AideConfig {
    /// Defaults, then `path` if given, then `.env` and the process
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self, AideError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_from(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, AideError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AideError::Configuration(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
            .map_err(|e| AideError::Configuration(format!("{}: {e}", path.display())))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, AideError> {
        toml::from_str(raw).map_err(|e| AideError::Configuration(e.to_string()))
    }

    /// Overlay values from an environment lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), AideError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("AIDE_MODEL") {
            self.model = v;
        }
        if let Some(v) = get("GEMINI_API_KEY").or_else(|| get("GOOGLE_API_KEY")) {
            self.gemini_api_key = Some(v);
        }
        if let Some(v) = get("GEMINI_BASE_URL") {
            self.gemini_base_url = Some(v);
        }
        if let Some(v) = get("SERVER_PATH") {
            self.server = Some(v);
        }
        if let Some(v) = get("INSTRUCTION_PATH") {
            self.instruction_dir = PathBuf::from(v);
        }
        if let Some(v) = get("AIDE_USER_ID") {
            self.user_id = v;
        }
        if let Some(v) = get("AIDE_FACT_STORE") {
            self.fact_store_path = PathBuf::from(v);
        }
        if let Some(v) = get("AIDE_EMBEDDING_PROVIDER") {
            self.embedding.provider = parse_env("AIDE_EMBEDDING_PROVIDER", &v)?;
        }
        if let Some(v) = get("AIDE_EMBEDDING_DIMENSIONS") {
            self.embedding.dimensions = parse_env("AIDE_EMBEDDING_DIMENSIONS", &v)?;
        }
        if let Some(v) = get("AIDE_EMBEDDING_BASE_URL") {
            self.embedding.base_url = Some(v);
        }
        if let Some(v) = get("AIDE_EMBEDDING_API_KEY") {
            self.embedding.api_key = Some(v);
        }
        if let Some(v) = get("AIDE_EMBEDDING_MODEL") {
            self.embedding.model = Some(v);
        }
        if let Some(v) = get("AIDE_TEMPERATURE") {
            self.temperature = Some(parse_env("AIDE_TEMPERATURE", &v)?);
        }
        if let Some(v) = get("AIDE_MAX_OUTPUT_TOKENS") {
            self.max_output_tokens = Some(parse_env("AIDE_MAX_OUTPUT_TOKENS", &v)?);
        }
        if let Some(v) = get("AIDE_MODEL_TIMEOUT_SECS") {
            self.model_timeout_secs = parse_env("AIDE_MODEL_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("AIDE_TOOL_TIMEOUT_SECS") {
            self.tool_timeout_secs = parse_env("AIDE_TOOL_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("AIDE_MAX_ITERATIONS") {
            self.max_iterations = parse_env("AIDE_MAX_ITERATIONS", &v)?;
        }
        if let Some(v) = get("AIDE_PREFERENCE_QUERY") {
            self.preference_query = v;
        }
        Ok(())
    }

    pub fn limits(&self) -> LoopLimits {
        LoopLimits {
            max_iterations: self.max_iterations,
            model_timeout: Duration::from_secs(self.model_timeout_secs),
            tool_timeout: Duration::from_secs(self.tool_timeout_secs),
        }
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings::builder()
            .maybe_temperature(self.temperature)
            .maybe_max_tokens(self.max_output_tokens)
            .build()
    }

    /// Build the configured embedding function.
    pub fn embedder(&self) -> Result<Arc<dyn Embedder>, AideError> {
        let cfg = &self.embedding;
        if cfg.dimensions == 0 {
            return Err(AideError::Configuration(
                "embedding dimensions must be positive".into(),
            ));
        }
        match cfg.provider {
            EmbeddingProvider::Hash => Ok(Arc::new(HashEmbedder::new(cfg.dimensions))),
            EmbeddingProvider::OpenaiCompatible => {
                let base_url = cfg.base_url.clone().ok_or_else(|| {
                    AideError::Configuration("AIDE_EMBEDDING_BASE_URL is required".into())
                })?;
                let model = cfg.model.clone().ok_or_else(|| {
                    AideError::Configuration("AIDE_EMBEDDING_MODEL is required".into())
                })?;
                Ok(Arc::new(HttpEmbedder::new(
                    base_url,
                    cfg.api_key.clone(),
                    model,
                    cfg.dimensions,
                )))
            }
        }
    }

    /// Build the Gemini chat model.
    #[cfg(feature = "gemini")]
    pub fn gemini_model(&self) -> Result<crate::model::GeminiModel, AideError> {
        let api_key = self.gemini_api_key.clone().ok_or_else(|| {
            AideError::Configuration("GEMINI_API_KEY (or GOOGLE_API_KEY) is not set".into())
        })?;
        let mut model = crate::model::GeminiModel::new(self.model.clone(), api_key)
            .with_settings(self.generation_settings());
        if let Some(base_url) = &self.gemini_base_url {
            model = model.with_base_url(base_url.clone());
        }
        Ok(model)
    }
}

fn parse_env<T: FromStr>(key: &str, raw: &str) -> Result<T, AideError> {
    raw.trim()
        .parse()
        .map_err(|_| AideError::Configuration(format!("{key} has invalid value '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = AideConfig::default();
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.user_id, "user1");
        assert_eq!(config.instruction_dir, PathBuf::from("instruction"));
        assert_eq!(config.max_iterations, 20);
        assert_eq!(config.preference_query, "sở thích");
        assert!(config.fact_store_path.ends_with(".aide/facts.jsonl"));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = AideConfig::from_toml_str(
            r#"
            model = "gemini-1.5-pro"
            server = "servers/mail.py"

            [embedding]
            dimensions = 128
            "#,
        )
        .unwrap();
        assert_eq!(config.embedding.dimensions, 128);

        config
            .apply_env_from(env(&[
                ("AIDE_MODEL", "gemini-2.0-flash-lite"),
                ("GOOGLE_API_KEY", "g-key"),
                ("AIDE_MAX_ITERATIONS", "5"),
                ("AIDE_EMBEDDING_PROVIDER", "openai-compatible"),
            ]))
            .unwrap();

        assert_eq!(config.model, "gemini-2.0-flash-lite");
        assert_eq!(config.server.as_deref(), Some("servers/mail.py"));
        assert_eq!(config.gemini_api_key.as_deref(), Some("g-key"));
        assert_eq!(config.max_iterations, 5);
        assert_eq!(config.embedding.provider, EmbeddingProvider::OpenaiCompatible);
    }

    #[test]
    fn invalid_numeric_env_is_configuration_error() {
        let mut config = AideConfig::default();
        let err = config
            .apply_env_from(env(&[("AIDE_TOOL_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, AideError::Configuration(m) if m.contains("AIDE_TOOL_TIMEOUT_SECS")));
    }

    #[test]
    fn sampling_settings_reach_the_gemini_request() {
        let mut config = AideConfig::from_toml_str("temperature = 0.4").unwrap();
        config
            .apply_env_from(env(&[
                ("AIDE_MAX_OUTPUT_TOKENS", "256"),
                ("GEMINI_API_KEY", "g-key"),
            ]))
            .unwrap();
        assert_eq!(config.generation_settings().temperature, Some(0.4));
        assert_eq!(config.generation_settings().max_tokens, Some(256));

        #[cfg(feature = "gemini")]
        {
            let body = config
                .gemini_model()
                .unwrap()
                .build_request_body(&[crate::types::Message::human("hi")], &[]);
            assert_eq!(
                body["generationConfig"],
                serde_json::json!({"maxOutputTokens": 256, "temperature": 0.4})
            );
        }
    }

    #[test]
    fn unset_sampling_settings_send_no_generation_config() {
        let config = AideConfig::default();
        assert_eq!(config.generation_settings(), GenerationSettings::default());
        let err = AideConfig::default()
            .apply_env_from(env(&[("AIDE_TEMPERATURE", "warm")]))
            .unwrap_err();
        assert!(matches!(err, AideError::Configuration(m) if m.contains("AIDE_TEMPERATURE")));
    }

    #[test]
    fn http_embedder_requires_endpoint_details() {
        let mut config = AideConfig::default();
        config.embedding.provider = EmbeddingProvider::OpenaiCompatible;
        assert!(matches!(config.embedder(), Err(AideError::Configuration(_))));

        config.embedding.base_url = Some("http://localhost:8080/v1".into());
        config.embedding.model = Some("all-minilm".into());
        assert_eq!(config.embedder().unwrap().dimensions(), 384);
    }

    #[test]
    fn unknown_toml_field_types_are_rejected() {
        let err = AideConfig::from_toml_str("max_iterations = \"many\"").unwrap_err();
        assert!(matches!(err, AideError::Configuration(_)));
    }
}
