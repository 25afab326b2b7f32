//! Web search fallback for questions outside the indexed topics.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::WebSearchError;
use crate::models::WebSearchConfig;

/// Query in, aggregated text snippets out.
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, max_results: u32) -> Result<String, WebSearchError>;
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'a str,
    include_domains: &'a [String],
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub url: String,
    #[serde(default)]
    pub content: String,
}

/// Tavily search API client.
#[derive(Debug, Clone)]
pub struct TavilySearch {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    include_domains: Vec<String>,
}

impl TavilySearch {
    pub fn new(config: &WebSearchConfig) -> Result<Self, WebSearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            include_domains: config.include_domains.clone(),
        })
    }
}

#[async_trait]
impl WebSearch for TavilySearch {
    async fn search(&self, query: &str, max_results: u32) -> Result<String, WebSearchError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(WebSearchError::MissingApiKey)?;

        let request = SearchRequest {
            api_key,
            query,
            search_depth: "advanced",
            include_domains: &self.include_domains,
            max_results,
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(WebSearchError::ServerError(format!(
                "status {}: {}",
                status, body
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| WebSearchError::InvalidResponse(e.to_string()))?;

        Ok(aggregate_results(&parsed.results))
    }
}

/// `Source: <url>\nContent: <content>` per hit, joined by newlines.
pub fn aggregate_results(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| format!("Source: {}\nContent: {}", hit.url, hit.content))
        .collect::<Vec<_>>()
        .join("\n")
}
