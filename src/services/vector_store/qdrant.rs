//! Qdrant vector store backend implementation.

use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, NamedVectors, PointStruct, Query,
    QueryPointsBuilder, UpsertPointsBuilder, Value, VectorParamsBuilder, VectorsConfigBuilder,
};
use qdrant_client::{Payload, Qdrant};

use super::VectorStore;
use crate::error::VectorStoreError;
use crate::models::{
    ChunkMetadata, Point, RetrievedDocument, VectorDriver, VectorField, VectorStoreConfig,
};

/// Qdrant vector store backend.
pub struct QdrantBackend {
    client: Qdrant,
}

impl QdrantBackend {
    pub fn new(config: &VectorStoreConfig) -> Result<Self, VectorStoreError> {
        let mut builder =
            Qdrant::from_url(&config.url).timeout(Duration::from_secs(config.timeout_secs));

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;

        Ok(Self { client })
    }

    fn to_point_struct(point: Point) -> Result<PointStruct, VectorStoreError> {
        let json = serde_json::to_value(&point.payload)
            .map_err(|e| VectorStoreError::UpsertError(e.to_string()))?;
        let payload = Payload::try_from(json)
            .map_err(|e| VectorStoreError::UpsertError(e.to_string()))?;

        let vectors = NamedVectors::default()
            .add_vector(VectorField::Default.name(), point.vectors.default)
            .add_vector(VectorField::Summary.name(), point.vectors.summary);

        Ok(PointStruct::new(point.id, vectors, payload))
    }
}

#[async_trait]
impl VectorStore for QdrantBackend {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        self.client
            .health_check()
            .await
            .map(|_| true)
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))
    }

    async fn collection_exists(&self, collection: &str) -> Result<bool, VectorStoreError> {
        self.client
            .collection_exists(collection)
            .await
            .map_err(|e| VectorStoreError::CollectionError(e.to_string()))
    }

    async fn create_collection(
        &self,
        collection: &str,
        dimension: u64,
    ) -> Result<(), VectorStoreError> {
        let mut vectors = VectorsConfigBuilder::default();
        for field in VectorField::ALL {
            vectors.add_named_vector_params(
                field.name(),
                VectorParamsBuilder::new(dimension, Distance::Cosine),
            );
        }

        self.client
            .create_collection(CreateCollectionBuilder::new(collection).vectors_config(vectors))
            .await
            .map_err(|e| VectorStoreError::CollectionError(e.to_string()))?;

        Ok(())
    }

    async fn count(&self, collection: &str) -> Result<u64, VectorStoreError> {
        let response = self
            .client
            .count(CountPointsBuilder::new(collection).exact(true))
            .await
            .map_err(|e| VectorStoreError::CountError(e.to_string()))?;

        Ok(response.result.map_or(0, |r| r.count))
    }

    async fn upsert(&self, collection: &str, points: Vec<Point>) -> Result<(), VectorStoreError> {
        if points.is_empty() {
            return Ok(());
        }

        let points = points
            .into_iter()
            .map(Self::to_point_struct)
            .collect::<Result<Vec<_>, _>>()?;

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(|e| VectorStoreError::UpsertError(e.to_string()))?;

        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        field: VectorField,
        limit: u64,
    ) -> Result<Vec<RetrievedDocument>, VectorStoreError> {
        let request = QueryPointsBuilder::new(collection)
            .query(Query::new_nearest(vector))
            .using(field.name())
            .limit(limit)
            .with_payload(true);

        let response = self
            .client
            .query(request)
            .await
            .map_err(|e| VectorStoreError::SearchError(e.to_string()))?;

        let results = response
            .result
            .into_iter()
            .map(|point| {
                let mut payload = point.payload;

                let content = match payload.remove("page_content").and_then(|v| v.kind) {
                    Some(Kind::StringValue(s)) => s,
                    _ => String::new(),
                };

                // Tolerate partial or foreign payloads
                let metadata = payload
                    .remove("metadata")
                    .map(value_to_json)
                    .and_then(|json| serde_json::from_value::<ChunkMetadata>(json).ok())
                    .unwrap_or_default();

                RetrievedDocument {
                    content,
                    metadata,
                    score: point.score,
                }
            })
            .collect();

        Ok(results)
    }

    async fn list_collections(&self) -> Result<Vec<String>, VectorStoreError> {
        let response = self
            .client
            .list_collections()
            .await
            .map_err(|e| VectorStoreError::CollectionError(e.to_string()))?;

        let mut names: Vec<String> = response.collections.into_iter().map(|c| c.name).collect();
        names.sort();
        Ok(names)
    }

    fn driver(&self) -> VectorDriver {
        VectorDriver::Qdrant
    }
}

fn value_to_json(value: Value) -> serde_json::Value {
    match value.kind {
        Some(Kind::NullValue(_)) | None => serde_json::Value::Null,
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(b),
        Some(Kind::IntegerValue(n)) => serde_json::Value::from(n),
        Some(Kind::DoubleValue(n)) => serde_json::Value::from(n),
        Some(Kind::StringValue(s)) => serde_json::Value::String(s),
        Some(Kind::ListValue(list)) => {
            serde_json::Value::Array(list.values.into_iter().map(value_to_json).collect())
        }
        Some(Kind::StructValue(st)) => serde_json::Value::Object(
            st.fields
                .into_iter()
                .map(|(k, v)| (k, value_to_json(v)))
                .collect::<serde_json::Map<_, _>>(),
        ),
    }
}
