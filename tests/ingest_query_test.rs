use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use paperqa::agents::{Route, TextGenerator, WebSearch};
use paperqa::error::{EmbeddingError, GenerationError, WebSearchError};
use paperqa::models::{Config, IndexingConfig, PaperMetadata, VectorField};
use paperqa::services::{
    Embedder, InMemoryStore, IngestionPipeline, METADATA_FILE, VectorIndex, VectorStore, normalize,
};
use paperqa::AppContext;

const DIM: usize = 48;

struct WordHashEmbedder;

#[async_trait]
impl Embedder for WordHashEmbedder {
    fn model_id(&self) -> &str {
        "word-hash"
    }

    fn dimension(&self) -> usize {
        DIM
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0f32; DIM];
                for word in text.split_whitespace() {
                    let h = word
                        .to_lowercase()
                        .bytes()
                        .fold(17usize, |h, b| h.wrapping_mul(33) ^ b as usize);
                    v[h % DIM] += 1.0;
                }
                normalize(&v)
            })
            .collect())
    }
}

/// Answers by system prompt: topic, subqueries, then an answer that reports
/// whether retrieved paper content reached it.
struct ScriptedGenerator {
    topic: String,
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        let reply = if system.contains("topic_name") {
            serde_json::json!({ "topic_name": self.topic })
        } else if system.contains("subqueries") {
            serde_json::json!({ "subqueries": ["beta findings", "alpha method"] })
        } else if user.contains("Title: AnyI2V") {
            serde_json::json!({ "answer": "answered from AnyI2V" })
        } else if user.contains("Source: https://arxiv.org/abs/web") {
            serde_json::json!({ "answer": "answered from the web" })
        } else {
            serde_json::json!({ "answer": "no material" })
        };
        Ok(reply.to_string())
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

struct FixedWebSearch;

#[async_trait]
impl WebSearch for FixedWebSearch {
    async fn search(&self, query: &str, _max_results: u32) -> Result<String, WebSearchError> {
        Ok(format!(
            "Source: https://arxiv.org/abs/web\nContent: result for {}",
            query
        ))
    }
}

fn write_corpus(root: &Path) {
    let topic = root.join("arxiv_pdfs_Video_Diffusion");
    let markdowns = topic.join("run1").join("markdowns");
    fs::create_dir_all(&markdowns).unwrap();

    let section = |word: &str| format!("# {word}\n{}\n", format!("{word} ").repeat(900));
    fs::write(
        markdowns.join("2507.02857v1.md"),
        format!("{}{}", section("alpha"), section("beta")),
    )
    .unwrap();
    fs::write(markdowns.join("2507.09999v2.md"), "# Intro\nshort gamma body\n").unwrap();

    let records = vec![
        PaperMetadata {
            title: "AnyI2V".to_string(),
            pdf_url: "http://arxiv.org/pdf/2507.02857v1".to_string(),
            summary: "animating conditional images with motion control".to_string(),
            ..Default::default()
        },
        PaperMetadata {
            title: "Short".to_string(),
            pdf_url: "http://arxiv.org/pdf/2507.09999v2".to_string(),
            summary: "a short gamma summary".to_string(),
            ..Default::default()
        },
    ];
    fs::write(
        topic.join(METADATA_FILE),
        serde_json::to_string(&records).unwrap(),
    )
    .unwrap();

    fs::create_dir_all(root.join("arxiv_pdfs_Empty")).unwrap();
}

fn index() -> (Arc<VectorIndex>, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let index = Arc::new(VectorIndex::new(Arc::new(WordHashEmbedder), store.clone()));
    (index, store)
}

#[tokio::test]
async fn test_ingest_then_query() {
    let dir = TempDir::new().unwrap();
    write_corpus(dir.path());
    let (index, store) = index();

    let stats = IngestionPipeline::new(index.clone(), &IndexingConfig::default())
        .ingest_corpus(dir.path())
        .await
        .unwrap();

    assert_eq!(stats.topics.len(), 1);
    assert_eq!(stats.topics_skipped, vec!["Empty".to_string()]);
    assert_eq!(stats.documents(), 2);
    assert_eq!(stats.chunks(), 3);
    assert_eq!(store.count("Video_Diffusion").await.unwrap(), 3);

    let hits = index
        .query("Video_Diffusion", "beta beta", 2, VectorField::Default)
        .await
        .unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits[0].content.contains("beta"));
    assert_eq!(hits[0].metadata.article_title, "AnyI2V");
    assert_eq!(hits[0].metadata.url, "http://arxiv.org/pdf/2507.02857v1");
    assert!(hits[0].score >= hits[1].score);

    let by_summary = index
        .query("Video_Diffusion", "short gamma summary", 1, VectorField::Summary)
        .await
        .unwrap();
    assert_eq!(by_summary[0].metadata.article_title, "Short");
}

#[tokio::test]
async fn test_second_ingest_appends_ids() {
    let dir = TempDir::new().unwrap();
    write_corpus(dir.path());
    let (index, store) = index();
    let pipeline = IngestionPipeline::new(index, &IndexingConfig::default());

    let topic_dir = dir.path().join("arxiv_pdfs_Video_Diffusion");
    let first = pipeline.ingest_topic(&topic_dir).await.unwrap();
    let second = pipeline.ingest_topic(&topic_dir).await.unwrap();

    assert_eq!(first.upload.unwrap().offset, 0);
    assert_eq!(second.upload.unwrap().offset, 3);
    assert_eq!(store.count("Video_Diffusion").await.unwrap(), 6);

    let stored = store.stored_contents("Video_Diffusion").unwrap();
    let ids: Vec<u64> = stored.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    for i in 0..3 {
        assert_eq!(stored[i].1, stored[i + 3].1);
    }
}

#[tokio::test]
async fn test_dry_run_uploads_nothing() {
    let dir = TempDir::new().unwrap();
    write_corpus(dir.path());
    let (index, store) = index();

    let stats = IngestionPipeline::new(index, &IndexingConfig::default())
        .dry_run(true)
        .ingest_corpus(dir.path())
        .await
        .unwrap();

    assert!(stats.dry_run);
    assert_eq!(stats.chunks(), 3);
    assert!(stats.topics[0].upload.is_none());
    assert!(!store.collection_exists("Video_Diffusion").await.unwrap());
}

async fn ingested_context(topic_answer: &str) -> (TempDir, AppContext) {
    let dir = TempDir::new().unwrap();
    write_corpus(dir.path());
    let (index, _) = index();

    let mut config = Config::default();
    config.topics = vec!["Video Diffusion".to_string()];
    let generator = Arc::new(ScriptedGenerator {
        topic: topic_answer.to_string(),
    });
    let ctx = AppContext::from_parts(
        config,
        index,
        generator.clone(),
        generator,
        Arc::new(FixedWebSearch),
    );
    ctx.ingestion_pipeline()
        .ingest_corpus(dir.path())
        .await
        .unwrap();
    (dir, ctx)
}

#[tokio::test]
async fn test_ask_known_topic_uses_collection() {
    let (_dir, ctx) = ingested_context("Video Diffusion").await;

    let state = ctx.research_flow().run("What does AnyI2V do?").await;

    assert_eq!(state.topic.as_deref(), Some("Video Diffusion"));
    assert_eq!(
        state.route,
        Some(Route::Collection("Video_Diffusion".to_string()))
    );
    assert_eq!(state.subqueries.len(), 2);
    assert_eq!(state.contexts.len(), 2);
    assert_eq!(state.answer_text(), "answered from AnyI2V");
}

#[tokio::test]
async fn test_ask_unknown_topic_goes_to_web() {
    let (_dir, ctx) = ingested_context("Cooking").await;

    let state = ctx.research_flow().run("Best pasta shapes?").await;

    assert_eq!(state.route, Some(Route::WebSearch));
    assert_eq!(state.answer_text(), "answered from the web");
}
