mod config;
mod paper;
mod point;
mod search;
mod topic;

pub use config::{
    Config, DEFAULT_EMBEDDING_DIMENSION, DEFAULT_EMBEDDING_MODEL, DEFAULT_QDRANT_URL,
    DEFAULT_TOP_K, EmbeddingBackend, EmbeddingConfig, GenerationConfig, IndexingConfig,
    LoggingConfig, ResolvedConfig, SearchConfig, VectorDriver, VectorStoreConfig,
    WebSearchConfig,
};
pub use paper::{Document, PaperMetadata, derive_doc_name, find_metadata};
pub use point::{ChunkMetadata, Point, PointPayload, PointVectors};
pub use search::{OutputFormat, QueryResults, RetrievedDocument, VectorField};
pub use topic::{DEFAULT_TOPICS, Topic, TopicCatalog, topic_slug};
