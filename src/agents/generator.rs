//! Text generation backends.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GenerationError;
use crate::models::GenerationConfig;

/// Prompt in, string out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system: &str, user: &str) -> Result<String, GenerationError>;

    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

/// Ollama chat client in JSON output mode.
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaGenerator {
    pub fn new(config: &GenerationConfig, model: &str) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    /// Generator for topic classification.
    pub fn fast(config: &GenerationConfig) -> Result<Self, GenerationError> {
        Self::new(config, &config.fast_model)
    }

    /// Generator for decomposition and answers.
    pub fn deep(config: &GenerationConfig) -> Result<Self, GenerationError> {
        Self::new(config, &config.deep_model)
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        let url = format!("{}/api/chat", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            stream: false,
            format: "json",
        };

        debug!(model = %self.model, "sending chat request");
        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::ServerError(format!(
                "status {}: {}",
                status, body
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        Ok(chat.message.content)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Parse a JSON-mode reply and take one top-level field.
pub fn extract_field(raw: &str, field: &str) -> Result<serde_json::Value, GenerationError> {
    let mut value: serde_json::Value = serde_json::from_str(raw.trim())
        .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

    value
        .get_mut(field)
        .map(serde_json::Value::take)
        .ok_or_else(|| GenerationError::MissingField(field.to_string()))
}
