//! Collection-level indexing and retrieval over an embedder and a vector store.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info};

use super::embedding::Embedder;
use super::vector_store::VectorStore;
use crate::error::IndexError;
use crate::models::{Point, RetrievedDocument, VectorDriver, VectorField};

/// Outcome of one `upload_points` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UploadSummary {
    /// Point count observed before the upload; new IDs start at `offset + 1`
    pub offset: u64,
    pub uploaded: u64,
}

/// Basic information about a stored collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionInfo {
    pub name: String,
    pub points_count: u64,
}

pub struct VectorIndex {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl VectorIndex {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    pub fn model_id(&self) -> &str {
        self.embedder.model_id()
    }

    pub fn driver(&self) -> VectorDriver {
        self.store.driver()
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    pub async fn encode(&self, text: &str) -> Result<Vec<f32>, IndexError> {
        Ok(self.embedder.embed(text).await?)
    }

    pub async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IndexError> {
        Ok(self.embedder.embed_batch(texts).await?)
    }

    /// Create the collection if it does not exist yet. Returns true when created.
    pub async fn ensure_collection(&self, collection: &str) -> Result<bool, IndexError> {
        if self.store.collection_exists(collection).await? {
            return Ok(false);
        }

        self.store
            .create_collection(collection, self.dimension() as u64)
            .await?;
        info!(collection, dimension = self.dimension(), "created collection");
        Ok(true)
    }

    /// Upload points after renumbering them to continue from the current
    /// collection size. IDs supplied by the caller are ignored.
    ///
    /// Assumes a single writer per collection; concurrent uploads may
    /// assign overlapping IDs.
    pub async fn upload_points(
        &self,
        collection: &str,
        mut points: Vec<Point>,
        batch_size: usize,
    ) -> Result<UploadSummary, IndexError> {
        self.ensure_collection(collection).await?;

        if points.is_empty() {
            return Ok(UploadSummary::default());
        }

        let expected = self.dimension();
        for point in &points {
            check_dimension(point.id, "default", expected, point.vectors.default.len())?;
            check_dimension(point.id, "summary", expected, point.vectors.summary.len())?;
        }

        let offset = match self.store.count(collection).await {
            Ok(count) => count,
            Err(e) => {
                error!(collection, error = %e, "failed to count points, numbering from 1");
                0
            }
        };

        for (i, point) in points.iter_mut().enumerate() {
            point.id = offset + i as u64 + 1;
        }

        let total = points.len() as u64;
        let batch_size = batch_size.max(1);
        let mut remaining = points.into_iter();
        loop {
            let batch: Vec<Point> = remaining.by_ref().take(batch_size).collect();
            if batch.is_empty() {
                break;
            }
            debug!(collection, size = batch.len(), "upserting batch");
            self.store.upsert(collection, batch).await?;
        }

        info!(collection, offset, uploaded = total, "uploaded points");
        Ok(UploadSummary {
            offset,
            uploaded: total,
        })
    }

    /// Embed `text` and return the `top_k` nearest chunks on `field`.
    pub async fn query(
        &self,
        collection: &str,
        text: &str,
        top_k: u64,
        field: VectorField,
    ) -> Result<Vec<RetrievedDocument>, IndexError> {
        if !self.store.collection_exists(collection).await? {
            return Err(IndexError::CollectionNotFound(collection.to_string()));
        }

        let vector = self.encode(text).await?;
        let results = self.store.search(collection, vector, field, top_k).await?;
        debug!(collection, %field, hits = results.len(), "query complete");
        Ok(results)
    }

    /// Point count of a collection, or `None` when it does not exist.
    pub async fn collection_info(
        &self,
        collection: &str,
    ) -> Result<Option<CollectionInfo>, IndexError> {
        if !self.store.collection_exists(collection).await? {
            return Ok(None);
        }
        let points_count = self.store.count(collection).await?;
        Ok(Some(CollectionInfo {
            name: collection.to_string(),
            points_count,
        }))
    }
}

fn check_dimension(
    id: u64,
    field: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), IndexError> {
    if expected == actual {
        Ok(())
    } else {
        Err(IndexError::DimensionMismatch {
            id,
            field,
            expected,
            actual,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::error::{EmbeddingError, VectorStoreError};
    use crate::models::{Point, RetrievedDocument, VectorDriver, VectorField};
    use crate::services::embedding::Embedder;
    use crate::services::vector_store::{InMemoryStore, VectorStore};

    /// Deterministic bag-of-words embedder: each token hashes into a bucket.
    pub struct HashEmbedder {
        pub dimension: usize,
    }

    impl HashEmbedder {
        pub fn new(dimension: usize) -> Self {
            Self { dimension }
        }
    }

    #[async_trait]
    impl Embedder for HashEmbedder {
        fn model_id(&self) -> &str {
            "hash"
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts
                .iter()
                .map(|text| {
                    let mut v = vec![0f32; self.dimension];
                    for token in text.split_whitespace() {
                        let bucket = token
                            .to_lowercase()
                            .bytes()
                            .fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
                        v[bucket % self.dimension] += 1.0;
                    }
                    crate::services::embedding::normalize(&v)
                })
                .collect())
        }
    }

    /// Memory store wrapper that counts calls and can fail `count`.
    #[derive(Default)]
    pub struct CountingStore {
        pub inner: InMemoryStore,
        pub fail_count: bool,
        pub upserts: AtomicUsize,
        pub searches: AtomicUsize,
        pub calls: AtomicUsize,
    }

    impl CountingStore {
        pub fn failing_count() -> Self {
            Self {
                fail_count: true,
                ..Default::default()
            }
        }

        pub fn total_calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl VectorStore for CountingStore {
        async fn health_check(&self) -> Result<bool, VectorStoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.health_check().await
        }

        async fn collection_exists(&self, collection: &str) -> Result<bool, VectorStoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.collection_exists(collection).await
        }

        async fn create_collection(
            &self,
            collection: &str,
            dimension: u64,
        ) -> Result<(), VectorStoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.create_collection(collection, dimension).await
        }

        async fn count(&self, collection: &str) -> Result<u64, VectorStoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_count {
                return Err(VectorStoreError::CountError("unavailable".to_string()));
            }
            self.inner.count(collection).await
        }

        async fn upsert(
            &self,
            collection: &str,
            points: Vec<Point>,
        ) -> Result<(), VectorStoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.upserts.fetch_add(1, Ordering::SeqCst);
            self.inner.upsert(collection, points).await
        }

        async fn search(
            &self,
            collection: &str,
            vector: Vec<f32>,
            field: VectorField,
            limit: u64,
        ) -> Result<Vec<RetrievedDocument>, VectorStoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.searches.fetch_add(1, Ordering::SeqCst);
            self.inner.search(collection, vector, field, limit).await
        }

        async fn list_collections(&self) -> Result<Vec<String>, VectorStoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.list_collections().await
        }

        fn driver(&self) -> VectorDriver {
            VectorDriver::Memory
        }
    }
}
