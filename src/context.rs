//! Process-wide shared instances, built once from configuration.

use std::sync::Arc;

use tracing::info;

use crate::agents::{
    OllamaGenerator, PromptTemplates, ResearchFlow, TavilySearch, TextGenerator, WebSearch,
};
use crate::error::AppError;
use crate::models::{Config, TopicCatalog};
use crate::services::{IngestionPipeline, VectorIndex, create_backend, create_embedder};

pub struct AppContext {
    pub config: Config,
    pub index: Arc<VectorIndex>,
    pub fast: Arc<dyn TextGenerator>,
    pub deep: Arc<dyn TextGenerator>,
    pub web: Arc<dyn WebSearch>,
    pub prompts: PromptTemplates,
    pub catalog: TopicCatalog,
}

impl AppContext {
    /// Load the embedding model and connect every client described by `config`.
    pub fn new(config: Config) -> Result<Self, AppError> {
        let embedder = create_embedder(&config)?;
        let store = create_backend(&config.vector_store)?;
        let index = Arc::new(VectorIndex::new(embedder, store));

        let fast = Arc::new(OllamaGenerator::fast(&config.generation)?);
        let deep = Arc::new(OllamaGenerator::deep(&config.generation)?);
        let web = Arc::new(TavilySearch::new(&config.web_search)?);
        let prompts = PromptTemplates::load(config.generation.prompts_dir.as_deref())?;

        info!(
            model = index.model_id(),
            driver = %index.driver(),
            "application context ready"
        );

        Ok(Self::from_parts(config, index, fast, deep, web).with_prompts(prompts))
    }

    /// Assemble a context from ready-made parts. Built-in prompts; topics from `config`.
    pub fn from_parts(
        config: Config,
        index: Arc<VectorIndex>,
        fast: Arc<dyn TextGenerator>,
        deep: Arc<dyn TextGenerator>,
        web: Arc<dyn WebSearch>,
    ) -> Self {
        let catalog = TopicCatalog::new(&config.topics);
        Self {
            config,
            index,
            fast,
            deep,
            web,
            prompts: PromptTemplates::builtin(),
            catalog,
        }
    }

    pub fn with_prompts(mut self, prompts: PromptTemplates) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn research_flow(&self) -> ResearchFlow<'_> {
        ResearchFlow {
            fast: self.fast.as_ref(),
            deep: self.deep.as_ref(),
            web: self.web.as_ref(),
            index: &self.index,
            prompts: &self.prompts,
            catalog: &self.catalog,
            top_k: u64::from(self.config.search.top_k),
            search_type: self.config.search.search_type,
            max_web_results: self.config.web_search.max_results,
        }
    }

    pub fn ingestion_pipeline(&self) -> IngestionPipeline {
        IngestionPipeline::new(self.index.clone(), &self.config.indexing)
    }
}
