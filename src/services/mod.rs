mod chunker;
mod embedding;
mod index;
mod ingestion;
mod vector_store;

pub use chunker::{
    DEFAULT_MAX_TOKENS, DEFAULT_MERGE_MARGIN, DEFAULT_OVERLAP, TextChunker, chunk_with_overlap,
    count_tokens, header_aware_chunk, split_sections,
};
pub use embedding::{
    Embedder, EmbeddingClient, HealthResponse, OnnxEmbedder, SharedEmbedder, create_embedder,
    normalize,
};
pub use index::{CollectionInfo, UploadSummary, VectorIndex};
pub use ingestion::{
    IngestStats, IngestionPipeline, METADATA_FILE, TopicIngestStats, collection_name,
    load_metadata,
};
pub use vector_store::{
    InMemoryStore, QdrantBackend, SharedVectorStore, VectorStore, cosine_similarity,
    create_backend,
};

#[cfg(test)]
pub(crate) use index::test_support;
