use anyhow::Result;

use crate::cli::output::{StatusInfo, TopicStatus, get_formatter};
use crate::models::{Config, EmbeddingBackend, OutputFormat, TopicCatalog, VectorDriver};
use crate::services::{EmbeddingClient, SharedVectorStore, create_backend};

pub async fn handle_status(format: OutputFormat, _verbose: bool) -> Result<()> {
    let config = Config::load()?.config;
    let formatter = get_formatter(format);
    let catalog = TopicCatalog::new(&config.topics);

    // Only the store is needed; the embedding model is not loaded
    let (connected, topics) = match create_backend(&config.vector_store) {
        Ok(store) => {
            let connected = store.health_check().await.unwrap_or(false);
            let topics = if connected {
                topic_status(&store, &catalog).await
            } else {
                Vec::new()
            };
            (connected, topics)
        }
        Err(_) => (false, Vec::new()),
    };

    let embedding_reachable = match config.embedding.backend {
        EmbeddingBackend::Http => Some(match EmbeddingClient::new(&config.embedding) {
            Ok(client) => client.health_check().await.is_ok(),
            Err(_) => false,
        }),
        EmbeddingBackend::Onnx => None,
    };

    let status = StatusInfo {
        embedding_backend: config.embedding.backend.to_string(),
        embedding_model: config.embedding.model_id.clone(),
        embedding_reachable,
        vector_store_driver: config.vector_store.driver.to_string(),
        vector_store_url: config.vector_store.url.clone(),
        vector_store_connected: connected,
        topics,
    };

    print!("{}", formatter.format_status(&status));

    if !connected && config.vector_store.driver == VectorDriver::Qdrant {
        eprintln!();
        eprintln!("Warning: Qdrant not reachable. Start with: docker-compose up -d qdrant");
    }
    if embedding_reachable == Some(false) {
        eprintln!("Warning: embedding server not reachable at {}", config.embedding.url);
    }

    Ok(())
}

async fn topic_status(store: &SharedVectorStore, catalog: &TopicCatalog) -> Vec<TopicStatus> {
    let mut topics = Vec::with_capacity(catalog.len());
    for topic in catalog.topics() {
        let exists = store
            .collection_exists(&topic.collection)
            .await
            .unwrap_or(false);
        let points = if exists {
            store.count(&topic.collection).await.ok()
        } else {
            None
        };
        topics.push(TopicStatus {
            name: topic.name.clone(),
            collection: topic.collection.clone(),
            points,
        });
    }
    topics
}
