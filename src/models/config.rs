use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::search::{OutputFormat, VectorField};
use crate::error::ConfigError;

pub const DEFAULT_EMBEDDING_URL: &str = "http://localhost:11411";
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-MiniLM-L6-v2";
pub const DEFAULT_EMBEDDING_DIMENSION: u32 = 384;
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_TAVILY_URL: &str = "https://api.tavily.com";
pub const DEFAULT_TOP_K: u32 = 5;

const APP_DIR: &str = "paperqa";
const PROJECT_DIR: &str = ".paperqa";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    #[serde(default)]
    pub indexing: IndexingConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub web_search: WebSearchConfig,

    #[serde(default = "default_topics")]
    pub topics: Vec<String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            embedding: EmbeddingConfig::default(),
            vector_store: VectorStoreConfig::default(),
            indexing: IndexingConfig::default(),
            search: SearchConfig::default(),
            generation: GenerationConfig::default(),
            web_search: WebSearchConfig::default(),
            topics: default_topics(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration together with the files it was read from.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub config: Config,
    pub project_path: Option<PathBuf>,
    pub global_path: Option<PathBuf>,
}

impl Config {
    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_DIR).join(CONFIG_FILE))
    }

    pub fn project_config_dir() -> Option<PathBuf> {
        std::env::current_dir().ok().map(|p| p.join(PROJECT_DIR))
    }

    /// Walk up from the current directory looking for `.paperqa/config.toml`.
    pub fn find_project_config() -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        cwd.ancestors()
            .map(|dir| dir.join(PROJECT_DIR).join(CONFIG_FILE))
            .find(|p| p.exists())
    }

    /// Load configuration: project file, else global file, else defaults.
    /// Environment variables (and `.env`) are applied last.
    pub fn load() -> Result<ResolvedConfig, ConfigError> {
        let _ = dotenvy::dotenv();

        let project_path = Self::find_project_config();
        let global_path = Self::global_path().filter(|p| p.exists());

        let mut config = match project_path.as_ref().or(global_path.as_ref()) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(ResolvedConfig {
            config,
            project_path,
            global_path,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply environment overrides through the given lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("QDRANT_URL") {
            self.vector_store.url = url;
        }
        if let Some(key) = lookup("QDRANT_API_KEY") {
            self.vector_store.api_key = Some(key);
        }
        if let Some(key) = lookup("TAVILY_API_KEY") {
            self.web_search.api_key = Some(key);
        }
        if let Some(url) = lookup("OLLAMA_URL") {
            self.generation.url = url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.indexing.overlap >= self.indexing.max_tokens {
            return Err(ConfigError::ValidationError(format!(
                "indexing.overlap ({}) must be smaller than indexing.max_tokens ({})",
                self.indexing.overlap, self.indexing.max_tokens
            )));
        }
        if self.search.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "search.top_k must be at least 1".to_string(),
            ));
        }
        if self.embedding.dimension == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.dimension must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn init_global() -> Result<PathBuf, ConfigError> {
        let path = Self::global_path().ok_or_else(|| {
            ConfigError::PathError("could not determine config directory".to_string())
        })?;
        Self::default().save_to(&path)?;
        Ok(path)
    }

    pub fn init_project() -> Result<PathBuf, ConfigError> {
        let dir = Self::project_config_dir().ok_or_else(|| {
            ConfigError::PathError("could not determine current directory".to_string())
        })?;
        let path = dir.join(CONFIG_FILE);
        Self::default().save_to(&path)?;
        Ok(path)
    }

    pub fn models_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join(APP_DIR).join("models"))
    }

    /// Directory holding `model.onnx` and `tokenizer.json` for the configured model.
    pub fn embedding_model_dir(&self) -> Option<PathBuf> {
        self.embedding
            .model_path
            .clone()
            .or_else(|| Self::models_dir().map(|d| d.join(model_dir_name(&self.embedding.model_id))))
    }
}

fn model_dir_name(model_id: &str) -> String {
    model_id.replace('/', "--")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Local ONNX model loaded in-process
    #[default]
    Onnx,
    /// Remote embedding server
    Http,
}

impl std::fmt::Display for EmbeddingBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingBackend::Onnx => write!(f, "onnx"),
            EmbeddingBackend::Http => write!(f, "http"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub backend: EmbeddingBackend,

    #[serde(default = "default_embedding_model")]
    pub model_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,

    #[serde(default = "default_dimension")]
    pub dimension: u32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_embedding_url")]
    pub url: String,

    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: u32,
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_dimension() -> u32 {
    DEFAULT_EMBEDDING_DIMENSION
}

fn default_max_tokens() -> u32 {
    256
}

fn default_embedding_url() -> String {
    DEFAULT_EMBEDDING_URL.to_string()
}

fn default_embedding_timeout() -> u64 {
    120
}

fn default_embedding_batch_size() -> u32 {
    32
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            model_id: default_embedding_model(),
            model_path: None,
            dimension: default_dimension(),
            max_tokens: default_max_tokens(),
            url: default_embedding_url(),
            timeout_secs: default_embedding_timeout(),
            batch_size: default_embedding_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorDriver {
    #[default]
    Qdrant,
    /// Process-local store; contents are lost on exit
    Memory,
}

impl std::fmt::Display for VectorDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorDriver::Qdrant => write!(f, "qdrant"),
            VectorDriver::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default)]
    pub driver: VectorDriver,

    #[serde(default = "default_qdrant_url")]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

fn default_qdrant_url() -> String {
    DEFAULT_QDRANT_URL.to_string()
}

fn default_store_timeout() -> u64 {
    30
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            driver: VectorDriver::default(),
            url: default_qdrant_url(),
            api_key: None,
            timeout_secs: default_store_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    #[serde(default = "default_chunk_max_tokens")]
    pub max_tokens: usize,

    #[serde(default = "default_merge_margin")]
    pub merge_margin: usize,

    #[serde(default = "default_overlap")]
    pub overlap: usize,

    #[serde(default = "default_upload_batch_size")]
    pub upload_batch_size: usize,

    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_chunk_max_tokens() -> usize {
    1024
}

fn default_merge_margin() -> usize {
    50
}

fn default_overlap() -> usize {
    256
}

fn default_upload_batch_size() -> usize {
    100
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_chunk_max_tokens(),
            merge_margin: default_merge_margin(),
            overlap: default_overlap(),
            upload_batch_size: default_upload_batch_size(),
            max_file_size: default_max_file_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    #[serde(default)]
    pub search_type: VectorField,

    #[serde(default)]
    pub default_format: OutputFormat,
}

fn default_top_k() -> u32 {
    DEFAULT_TOP_K
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            search_type: VectorField::Default,
            default_format: OutputFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_ollama_url")]
    pub url: String,

    /// Model used for topic classification
    #[serde(default = "default_fast_model")]
    pub fast_model: String,

    /// Model used for subquery decomposition and answers
    #[serde(default = "default_deep_model")]
    pub deep_model: String,

    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts_dir: Option<PathBuf>,
}

fn default_ollama_url() -> String {
    DEFAULT_OLLAMA_URL.to_string()
}

fn default_fast_model() -> String {
    "qwen2.5:7b".to_string()
}

fn default_deep_model() -> String {
    "qwen3:8b".to_string()
}

fn default_generation_timeout() -> u64 {
    300
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            url: default_ollama_url(),
            fast_model: default_fast_model(),
            deep_model: default_deep_model(),
            timeout_secs: default_generation_timeout(),
            prompts_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchConfig {
    #[serde(default = "default_tavily_url")]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_max_results")]
    pub max_results: u32,

    #[serde(default = "default_include_domains")]
    pub include_domains: Vec<String>,

    #[serde(default = "default_web_timeout")]
    pub timeout_secs: u64,
}

fn default_tavily_url() -> String {
    DEFAULT_TAVILY_URL.to_string()
}

fn default_max_results() -> u32 {
    3
}

fn default_include_domains() -> Vec<String> {
    vec!["arxiv.org".to_string()]
}

fn default_web_timeout() -> u64 {
    30
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            url: default_tavily_url(),
            api_key: None,
            max_results: default_max_results(),
            include_domains: default_include_domains(),
            timeout_secs: default_web_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_topics() -> Vec<String> {
    super::topic::DEFAULT_TOPICS
        .iter()
        .map(|t| (*t).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.embedding.model_id, DEFAULT_EMBEDDING_MODEL);
        assert_eq!(config.embedding.dimension, 384);
        assert_eq!(config.vector_store.url, DEFAULT_QDRANT_URL);
        assert_eq!(config.search.top_k, 5);
        assert_eq!(config.topics.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_indexing_config_default() {
        let config = IndexingConfig::default();
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.merge_margin, 50);
        assert_eq!(config.overlap, 256);
        assert_eq!(config.upload_batch_size, 100);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            topics = ["Quantum Error Correction"]

            [search]
            top_k = 8
            search_type = "summary"

            [generation]
            deep_model = "llama3:70b"
            "#,
        )
        .unwrap();

        assert_eq!(config.search.top_k, 8);
        assert_eq!(config.search.search_type, VectorField::Summary);
        assert_eq!(config.generation.deep_model, "llama3:70b");
        assert_eq!(config.generation.fast_model, "qwen2.5:7b");
        assert_eq!(config.topics, vec!["Quantum Error Correction".to_string()]);
        assert_eq!(config.indexing.max_tokens, 1024);
    }

    #[test]
    fn test_unknown_search_type_in_file_falls_back() {
        let config: Config = toml::from_str("[search]\nsearch_type = \"hybrid\"\n").unwrap();
        assert_eq!(config.search.search_type, VectorField::Default);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.web_search.max_results = 7;
        config.save_to(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.web_search.max_results, 7);
        assert_eq!(loaded.embedding.backend, EmbeddingBackend::Onnx);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("QDRANT_URL", "http://qdrant:6334"),
            ("QDRANT_API_KEY", "secret"),
            ("TAVILY_API_KEY", "tvly-key"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.vector_store.url, "http://qdrant:6334");
        assert_eq!(config.vector_store.api_key.as_deref(), Some("secret"));
        assert_eq!(config.web_search.api_key.as_deref(), Some("tvly-key"));
        assert_eq!(config.generation.url, DEFAULT_OLLAMA_URL);
    }

    #[test]
    fn test_validate_rejects_stalled_window() {
        let mut config = Config::default();
        config.indexing.overlap = config.indexing.max_tokens;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_model_dir_name() {
        assert_eq!(
            model_dir_name("sentence-transformers/all-MiniLM-L6-v2"),
            "sentence-transformers--all-MiniLM-L6-v2"
        );
    }
}
