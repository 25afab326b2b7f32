//! Process-local vector store backend.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;

use super::VectorStore;
use crate::error::VectorStoreError;
use crate::models::{Point, RetrievedDocument, VectorDriver, VectorField};

#[derive(Debug, Default)]
struct MemoryCollection {
    dimension: u64,
    points: BTreeMap<u64, Point>,
}

/// Keeps every collection in a mutex-guarded map. Search is a linear scan.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: Mutex<HashMap<String, MemoryCollection>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored `(id, page_content)` pairs in id order.
    pub fn stored_contents(&self, collection: &str) -> Result<Vec<(u64, String)>, VectorStoreError> {
        let collections = self.lock()?;
        let target = collections.get(collection).ok_or_else(|| {
            VectorStoreError::CollectionError(format!("no collection '{}'", collection))
        })?;
        Ok(target
            .points
            .iter()
            .map(|(id, point)| (*id, point.payload.page_content.clone()))
            .collect())
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, MemoryCollection>>, VectorStoreError>
    {
        self.collections
            .lock()
            .map_err(|_| VectorStoreError::ConnectionError("store lock poisoned".to_string()))
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        Ok(true)
    }

    async fn collection_exists(&self, collection: &str) -> Result<bool, VectorStoreError> {
        Ok(self.lock()?.contains_key(collection))
    }

    async fn create_collection(
        &self,
        collection: &str,
        dimension: u64,
    ) -> Result<(), VectorStoreError> {
        let mut collections = self.lock()?;
        if collections.contains_key(collection) {
            return Err(VectorStoreError::CollectionError(format!(
                "collection '{}' already exists",
                collection
            )));
        }
        collections.insert(
            collection.to_string(),
            MemoryCollection {
                dimension,
                points: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn count(&self, collection: &str) -> Result<u64, VectorStoreError> {
        self.lock()?
            .get(collection)
            .map(|c| c.points.len() as u64)
            .ok_or_else(|| VectorStoreError::CountError(format!("no collection '{}'", collection)))
    }

    async fn upsert(&self, collection: &str, points: Vec<Point>) -> Result<(), VectorStoreError> {
        let mut collections = self.lock()?;
        let target = collections.get_mut(collection).ok_or_else(|| {
            VectorStoreError::UpsertError(format!("no collection '{}'", collection))
        })?;

        for point in points {
            let dim = target.dimension as usize;
            if point.vectors.default.len() != dim || point.vectors.summary.len() != dim {
                return Err(VectorStoreError::UpsertError(format!(
                    "point {} does not match collection dimension {}",
                    point.id, dim
                )));
            }
            target.points.insert(point.id, point);
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        field: VectorField,
        limit: u64,
    ) -> Result<Vec<RetrievedDocument>, VectorStoreError> {
        let collections = self.lock()?;
        let target = collections.get(collection).ok_or_else(|| {
            VectorStoreError::SearchError(format!("no collection '{}'", collection))
        })?;

        let mut scored: Vec<RetrievedDocument> = target
            .points
            .values()
            .map(|point| {
                let stored = match field {
                    VectorField::Default => &point.vectors.default,
                    VectorField::Summary => &point.vectors.summary,
                };
                RetrievedDocument {
                    content: point.payload.page_content.clone(),
                    metadata: point.payload.metadata.clone(),
                    score: cosine_similarity(&vector, stored),
                }
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit as usize);
        Ok(scored)
    }

    async fn list_collections(&self) -> Result<Vec<String>, VectorStoreError> {
        let mut names: Vec<String> = self.lock()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn driver(&self) -> VectorDriver {
        VectorDriver::Memory
    }
}

/// Cosine similarity; mismatched, empty or zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
