//! Vector store abstraction layer.
//!
//! Collections are addressed by name on every call, so one backend instance
//! serves every topic. Each collection stores two named cosine vectors per
//! point (see [`VectorField`]).

mod memory;
mod qdrant;

pub use memory::{InMemoryStore, cosine_similarity};
pub use qdrant::QdrantBackend;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::VectorStoreError;
use crate::models::{Point, RetrievedDocument, VectorDriver, VectorField, VectorStoreConfig};

/// Abstract trait for vector store operations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Check if the vector store is reachable.
    async fn health_check(&self) -> Result<bool, VectorStoreError>;

    async fn collection_exists(&self, collection: &str) -> Result<bool, VectorStoreError>;

    /// Create a collection with both named vectors of the given dimension.
    async fn create_collection(
        &self,
        collection: &str,
        dimension: u64,
    ) -> Result<(), VectorStoreError>;

    /// Exact number of points in the collection.
    async fn count(&self, collection: &str) -> Result<u64, VectorStoreError>;

    /// Insert or replace points by ID.
    async fn upsert(&self, collection: &str, points: Vec<Point>) -> Result<(), VectorStoreError>;

    /// Nearest neighbours of `vector` on the given named vector, best first.
    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        field: VectorField,
        limit: u64,
    ) -> Result<Vec<RetrievedDocument>, VectorStoreError>;

    async fn list_collections(&self) -> Result<Vec<String>, VectorStoreError>;

    /// Backend name for status output.
    fn driver(&self) -> VectorDriver;
}

pub type SharedVectorStore = Arc<dyn VectorStore>;

/// Create a vector store backend based on configuration.
pub fn create_backend(config: &VectorStoreConfig) -> Result<SharedVectorStore, VectorStoreError> {
    match config.driver {
        VectorDriver::Qdrant => Ok(Arc::new(QdrantBackend::new(config)?)),
        VectorDriver::Memory => Ok(Arc::new(InMemoryStore::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_memory_backend() {
        let config = VectorStoreConfig {
            driver: VectorDriver::Memory,
            ..Default::default()
        };
        let store = create_backend(&config).unwrap();
        assert_eq!(store.driver(), VectorDriver::Memory);
        assert!(store.health_check().await.unwrap());
        assert!(!store.collection_exists("anything").await.unwrap());
    }
}
