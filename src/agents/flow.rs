//! Question answering flow: topic → route → subqueries → retrieval → answer.

use serde::Serialize;
use tracing::{info, warn};

use super::generator::TextGenerator;
use super::prompts::PromptTemplates;
use super::tools::{self, RetrievedContext};
use super::web_search::WebSearch;
use crate::models::{TopicCatalog, VectorField};
use crate::services::VectorIndex;

/// Where retrieval for a question goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "collection", rename_all = "snake_case")]
pub enum Route {
    /// Vector search in the named collection
    Collection(String),
    WebSearch,
}

/// State threaded through the flow stages.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResearchState {
    pub question: String,
    pub topic: Option<String>,
    pub route: Option<Route>,
    pub subqueries: Vec<String>,
    pub contexts: Vec<RetrievedContext>,
    pub answer: Option<String>,
}

impl ResearchState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }

    /// Answer text, empty when generation failed.
    pub fn answer_text(&self) -> &str {
        self.answer.as_deref().unwrap_or_default()
    }
}

/// Collaborators and limits for one run of the flow.
pub struct ResearchFlow<'a> {
    pub fast: &'a dyn TextGenerator,
    pub deep: &'a dyn TextGenerator,
    pub web: &'a dyn WebSearch,
    pub index: &'a VectorIndex,
    pub prompts: &'a PromptTemplates,
    pub catalog: &'a TopicCatalog,
    pub top_k: u64,
    pub search_type: VectorField,
    pub max_web_results: u32,
}

impl ResearchFlow<'_> {
    pub async fn run(&self, question: &str) -> ResearchState {
        let state = ResearchState::new(question);
        let state = self.extract_topic(state).await;
        let state = self.route(state);
        let state = self.generate_subqueries(state).await;
        let state = self.retrieve(state).await;
        self.answer(state).await
    }

    pub async fn extract_topic(&self, mut state: ResearchState) -> ResearchState {
        let topic = tools::extract_topic(self.fast, self.prompts, self.catalog, &state.question).await;
        state.topic = Some(topic);
        state
    }

    /// Known topics go to their collection; anything else goes to web search.
    pub fn route(&self, mut state: ResearchState) -> ResearchState {
        let topic = state.topic.as_deref().unwrap_or_default();
        let route = match self.catalog.lookup(topic) {
            Some(collection) => Route::Collection(collection.to_string()),
            None => {
                warn!(topic, "topic not in catalog, falling back to web search");
                Route::WebSearch
            }
        };
        info!(?route, "routed question");
        state.route = Some(route);
        state
    }

    /// Empty decomposition falls back to the original question.
    pub async fn generate_subqueries(&self, mut state: ResearchState) -> ResearchState {
        let mut subqueries =
            tools::generate_subqueries(self.deep, self.prompts, &state.question).await;
        if subqueries.is_empty() {
            subqueries.push(state.question.clone());
        }
        state.subqueries = subqueries;
        state
    }

    /// One retrieval per subquery, in order.
    pub async fn retrieve(&self, mut state: ResearchState) -> ResearchState {
        let route = state.route.clone().unwrap_or(Route::WebSearch);
        let mut contexts = Vec::with_capacity(state.subqueries.len());

        for query in &state.subqueries {
            let context = match &route {
                Route::Collection(collection) => RetrievedContext::Documents {
                    query: query.clone(),
                    documents: tools::retrieve_documents(
                        self.index,
                        collection,
                        query,
                        self.top_k,
                        self.search_type,
                    )
                    .await,
                },
                Route::WebSearch => RetrievedContext::Web {
                    query: query.clone(),
                    text: tools::search_web(self.web, query, self.max_web_results).await,
                },
            };
            contexts.push(context);
        }

        state.contexts = contexts;
        state
    }

    pub async fn answer(&self, mut state: ResearchState) -> ResearchState {
        let answer =
            tools::generate_answer(self.deep, self.prompts, &state.question, &state.contexts)
                .await;
        state.answer = Some(answer);
        state
    }
}
