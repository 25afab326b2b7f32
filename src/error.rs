//! Error types for the paper QA pipeline.

use thiserror::Error;

/// Errors related to chunking parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkError {
    #[error("invalid chunking configuration: overlap {overlap} must be smaller than max_tokens {max_tokens}")]
    InvalidConfiguration { max_tokens: usize, overlap: usize },
}

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding server: {0}")]
    ConnectionError(String),

    #[error("embedding server error: {0}")]
    ServerError(String),

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding timeout")]
    Timeout,

    #[error("embedding model error: {0}")]
    ModelError(String),

    #[error("tokenizer error: {0}")]
    TokenizerError(String),
}

/// Errors related to vector store operations.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("failed to connect to vector store: {0}")]
    ConnectionError(String),

    #[error("collection error: {0}")]
    CollectionError(String),

    #[error("count error: {0}")]
    CountError(String),

    #[error("upsert error: {0}")]
    UpsertError(String),

    #[error("search error: {0}")]
    SearchError(String),
}

/// Errors surfaced by the vector index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    #[error("point {id} has a {field} vector of dimension {actual}, expected {expected}")]
    DimensionMismatch {
        id: u64,
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),
}

/// Errors related to corpus ingestion.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata parse error: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("chunking error: {0}")]
    Chunk(#[from] ChunkError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),
}

impl From<EmbeddingError> for IngestError {
    fn from(e: EmbeddingError) -> Self {
        IngestError::Index(IndexError::Embedding(e))
    }
}

/// Errors from the text generation backend.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("generation server error: {0}")]
    ServerError(String),

    #[error("invalid generation response: {0}")]
    InvalidResponse(String),

    #[error("generation response is missing field '{0}'")]
    MissingField(String),

    #[error("prompt error: {0}")]
    Prompt(#[from] PromptError),
}

/// Errors from the web search backend.
#[derive(Debug, Error)]
pub enum WebSearchError {
    #[error("web search API key is not configured")]
    MissingApiKey,

    #[error("web search request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("web search server error: {0}")]
    ServerError(String),

    #[error("invalid web search response: {0}")]
    InvalidResponse(String),
}

/// Errors related to prompt templates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("prompt template '{0}' not found")]
    NotFound(String),

    #[error("prompt template '{template}' is missing variable '{variable}'")]
    MissingVariable { template: String, variable: String },

    #[error("failed to load prompt templates: {0}")]
    LoadError(String),
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Top-level error for building the application context.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("web search error: {0}")]
    WebSearch(#[from] WebSearchError),

    #[error("prompt error: {0}")]
    Prompt(#[from] PromptError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_configuration_message() {
        let err = ChunkError::InvalidConfiguration {
            max_tokens: 10,
            overlap: 10,
        };
        assert_eq!(
            err.to_string(),
            "invalid chunking configuration: overlap 10 must be smaller than max_tokens 10"
        );
    }

    #[test]
    fn test_collection_not_found_is_distinct() {
        let err = IndexError::CollectionNotFound("Transformer_Models".to_string());
        assert!(matches!(err, IndexError::CollectionNotFound(ref name) if name == "Transformer_Models"));
        assert_eq!(err.to_string(), "collection not found: Transformer_Models");
    }
}
