use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::index::DistanceMetric;
use super::search::OutputFormat;

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_PINECONE_URL: &str = "https://api.pinecone.io";
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
pub const DEFAULT_INDEX_NAME: &str = "ai-helpers";
pub const DEFAULT_DIMENSION: u32 = 1536;

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const PINECONE_API_KEY_ENV: &str = "PINECONE_API_KEY";
pub const MONGO_URI_ENV: &str = "MONGO_URI";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub vector_index: VectorIndexConfig,

    #[serde(default)]
    pub mongo: MongoConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ai-helpers").join("config.toml"))
    }

    /// Load the user config (or defaults) and apply credential overrides
    /// from the environment.
    pub fn load() -> Result<Self, crate::error::ConfigError> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, crate::error::ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no command can work with.
    pub fn validate(&self) -> Result<(), crate::error::ConfigError> {
        use crate::error::ConfigError::ValidationError;

        if self.vector_index.index_name.trim().is_empty() {
            return Err(ValidationError("vector_index.index_name is empty".to_string()));
        }
        if self.vector_index.dimension == 0 {
            return Err(ValidationError("vector_index.dimension must be positive".to_string()));
        }
        if self.search.default_top_k == 0 {
            return Err(ValidationError("search.default_top_k must be positive".to_string()));
        }
        Ok(())
    }

    pub fn save(&self) -> Result<PathBuf, crate::error::ConfigError> {
        let path = Self::config_path().ok_or_else(|| {
            crate::error::ConfigError::PathError("could not determine config directory".to_string())
        })?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), crate::error::ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Environment values win over the file for credentials only.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(OPENAI_API_KEY_ENV) {
            self.openai.api_key = Some(key);
        }
        if let Some(key) = non_empty(PINECONE_API_KEY_ENV) {
            self.vector_index.api_key = Some(key);
        }
        if let Some(uri) = non_empty(MONGO_URI_ENV) {
            self.mongo.uri = Some(uri);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default = "default_openai_url")]
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,

    #[serde(default = "default_speech_model")]
    pub speech_model: String,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "default_openai_timeout")]
    pub timeout_secs: u64,
}

fn default_openai_url() -> String {
    DEFAULT_OPENAI_URL.to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_speech_model() -> String {
    "tts-1".to_string()
}

fn default_openai_timeout() -> u64 {
    120
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_url(),
            api_key: None,
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            transcription_model: default_transcription_model(),
            speech_model: default_speech_model(),
            temperature: 0.0,
            timeout_secs: default_openai_timeout(),
        }
    }
}

/// Vector index backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorDriver {
    #[default]
    Pinecone,
    Qdrant,
}

impl VectorDriver {
    pub fn default_url(&self) -> &'static str {
        match self {
            VectorDriver::Pinecone => DEFAULT_PINECONE_URL,
            VectorDriver::Qdrant => DEFAULT_QDRANT_URL,
        }
    }
}

impl std::fmt::Display for VectorDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorDriver::Pinecone => write!(f, "pinecone"),
            VectorDriver::Qdrant => write!(f, "qdrant"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndexConfig {
    #[serde(default)]
    pub driver: VectorDriver,

    /// Control-plane URL (Pinecone) or server URL (Qdrant). Unset means
    /// the driver's default, see [`VectorIndexConfig::endpoint`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_index_name")]
    pub index_name: String,

    #[serde(default = "default_dimension")]
    pub dimension: u32,

    #[serde(default)]
    pub metric: DistanceMetric,

    #[serde(default = "default_cloud")]
    pub cloud: String,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default = "default_index_timeout")]
    pub timeout_secs: u64,
}

fn default_index_name() -> String {
    DEFAULT_INDEX_NAME.to_string()
}

fn default_dimension() -> u32 {
    DEFAULT_DIMENSION
}

fn default_cloud() -> String {
    "aws".to_string()
}

fn default_region() -> String {
    "us-west-2".to_string()
}

fn default_index_timeout() -> u64 {
    60
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            driver: VectorDriver::default(),
            url: None,
            api_key: None,
            index_name: default_index_name(),
            dimension: default_dimension(),
            metric: DistanceMetric::default(),
            cloud: default_cloud(),
            region: default_region(),
            namespace: None,
            timeout_secs: default_index_timeout(),
        }
    }
}

impl VectorIndexConfig {
    /// Configured URL, or the default for the selected driver.
    pub fn endpoint(&self) -> &str {
        self.url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| self.driver.default_url())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default = "default_mongo_collection")]
    pub collection: String,
}

fn default_database() -> String {
    "ai_helpers".to_string()
}

fn default_mongo_collection() -> String {
    "chunks".to_string()
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: None,
            database: default_database(),
            collection: default_mongo_collection(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_top_k")]
    pub default_top_k: u32,

    #[serde(default)]
    pub default_format: OutputFormat,
}

fn default_top_k() -> u32 {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
            default_format: OutputFormat::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.openai.base_url, DEFAULT_OPENAI_URL);
        assert!(config.vector_index.url.is_none());
        assert_eq!(config.vector_index.endpoint(), DEFAULT_PINECONE_URL);
        assert_eq!(config.vector_index.index_name, DEFAULT_INDEX_NAME);
        assert_eq!(config.vector_index.dimension, 1536);
        assert_eq!(config.vector_index.driver, VectorDriver::Pinecone);
        assert_eq!(config.search.default_top_k, 5);
    }

    #[test]
    fn test_config_path() {
        let path = Config::config_path();
        assert!(path.is_some());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [vector_index]
            driver = "qdrant"
            url = "http://localhost:6334"
            metric = "dotproduct"
            "#,
        )
        .unwrap();

        assert_eq!(config.vector_index.driver, VectorDriver::Qdrant);
        assert_eq!(config.vector_index.endpoint(), "http://localhost:6334");
        assert_eq!(config.vector_index.metric, DistanceMetric::DotProduct);
        assert_eq!(config.vector_index.region, "us-west-2");
        assert_eq!(config.openai.embedding_model, "text-embedding-3-small");
    }

    #[test]
    fn test_endpoint_defaults_per_driver() {
        let config: Config = toml::from_str(
            r#"
            [vector_index]
            driver = "qdrant"
            "#,
        )
        .unwrap();
        assert_eq!(config.vector_index.url, None);
        assert_eq!(config.vector_index.endpoint(), DEFAULT_QDRANT_URL);

        let mut pinecone = config.vector_index.clone();
        pinecone.driver = VectorDriver::Pinecone;
        assert_eq!(pinecone.endpoint(), DEFAULT_PINECONE_URL);

        pinecone.url = Some("http://127.0.0.1:5080".to_string());
        assert_eq!(pinecone.endpoint(), "http://127.0.0.1:5080");

        pinecone.url = Some("  ".to_string());
        assert_eq!(pinecone.endpoint(), DEFAULT_PINECONE_URL);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.vector_index.index_name = "kb".to_string();
        config.mongo.database = "library".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.vector_index.index_name, "kb");
        assert_eq!(loaded.mongo.database, "library");
        assert!(loaded.openai.api_key.is_none());
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "[vector_index]\ndimension = 0\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, crate::error::ConfigError::ValidationError(_)));

        std::fs::write(&path, "[search]\ndefault_top_k = 0\n").unwrap();
        assert!(Config::load_from(&path).is_err());

        std::fs::write(&path, "[vector_index]\nindex_name = \"\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());

        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_env_overrides_credentials() {
        let mut config = Config::default();
        config.openai.api_key = Some("from-file".to_string());

        config.apply_overrides(|key| match key {
            OPENAI_API_KEY_ENV => Some("sk-env".to_string()),
            PINECONE_API_KEY_ENV => Some("   ".to_string()),
            MONGO_URI_ENV => Some("mongodb://localhost".to_string()),
            _ => None,
        });

        assert_eq!(config.openai.api_key.as_deref(), Some("sk-env"));
        assert!(config.vector_index.api_key.is_none());
        assert_eq!(config.mongo.uri.as_deref(), Some("mongodb://localhost"));
    }
}
