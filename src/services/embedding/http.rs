//! Remote embedding server speaking the TEI `/embed` protocol.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::error::EmbeddingError;
use crate::models::EmbeddingConfig;

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [String],
    truncate: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub model_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    client: Client,
    base_url: String,
    model_id: String,
    dimension: usize,
    batch_size: usize,
}

impl EmbeddingClient {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            model_id: config.model_id.clone(),
            dimension: config.dimension as usize,
            batch_size: (config.batch_size as usize).max(1),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Probe `/health`. Servers that answer 2xx without a JSON body count as healthy.
    pub async fn health_check(&self) -> Result<HealthResponse, EmbeddingError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbeddingError::ServerError(format!(
                "health check returned {}",
                status
            )));
        }

        let body = response.text().await.unwrap_or_default();
        Ok(serde_json::from_str(&body).unwrap_or_default())
    }

    async fn send_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let response = self
            .client
            .post(format!("{}/embed", self.base_url))
            .json(&EmbedRequest {
                inputs: texts,
                truncate: true,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else {
                    EmbeddingError::RequestError(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ServerError(format!("{}: {}", status, body)));
        }

        let vectors: Vec<Vec<f32>> = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;
        self.check_response(texts.len(), &vectors)?;
        Ok(vectors)
    }

    /// One vector per input, each of the configured dimension.
    fn check_response(&self, inputs: usize, vectors: &[Vec<f32>]) -> Result<(), EmbeddingError> {
        if vectors.len() != inputs {
            return Err(EmbeddingError::InvalidResponse(format!(
                "sent {} texts, received {} vectors",
                inputs,
                vectors.len()
            )));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(EmbeddingError::InvalidResponse(format!(
                "vector has dimension {}, configured {}",
                bad.len(),
                self.dimension
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            vectors.extend(self.send_batch(batch).await?);
        }
        Ok(vectors)
    }
}
