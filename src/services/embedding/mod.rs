//! Text embedding backends.
//!
//! The embedder is created once per process and shared behind an `Arc`;
//! every encode call goes through the [`Embedder`] trait.

mod http;
mod onnx;

pub use http::{EmbeddingClient, HealthResponse};
pub use onnx::OnnxEmbedder;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::EmbeddingError;
use crate::models::{Config, EmbeddingBackend};

/// Produces fixed-length vectors for text.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier, for status output.
    fn model_id(&self) -> &str;

    /// Length of every vector this embedder returns.
    fn dimension(&self) -> usize;

    /// Embed a batch of texts, preserving input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding response".to_string()))
    }
}

pub type SharedEmbedder = Arc<dyn Embedder>;

/// Build the configured embedding backend.
pub fn create_embedder(config: &Config) -> Result<SharedEmbedder, EmbeddingError> {
    match config.embedding.backend {
        EmbeddingBackend::Onnx => {
            let model_dir = config.embedding_model_dir().ok_or_else(|| {
                EmbeddingError::ModelError("could not determine models directory".to_string())
            })?;
            Ok(Arc::new(OnnxEmbedder::load(&config.embedding, &model_dir)?))
        }
        EmbeddingBackend::Http => Ok(Arc::new(EmbeddingClient::new(&config.embedding)?)),
    }
}

/// Scale `v` to unit length; zero vectors are returned unchanged.
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_unit_length() {
        let v = normalize(&[3.0, 4.0]);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_vector() {
        assert_eq!(normalize(&[0.0, 0.0]), vec![0.0, 0.0]);
    }
}
