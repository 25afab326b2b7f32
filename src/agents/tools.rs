//! Tool boundary between the research flow and its collaborators.
//!
//! Every function here logs failures and degrades to an empty result so one
//! failed stage never aborts the flow.

use serde::Serialize;
use tracing::{error, info};

use super::generator::{TextGenerator, extract_field};
use super::prompts::{ANSWER_GENERATOR, PromptTemplates, SUBQUERY_GENERATOR, TOPIC_EXTRACTOR};
use super::web_search::WebSearch;
use crate::error::GenerationError;
use crate::models::{RetrievedDocument, TopicCatalog, VectorField};
use crate::services::VectorIndex;

const TOPIC_SYSTEM: &str = "You are an AI assistant that analyzes the user query and understands \
the topic of the research. Your output must be in JSON format with a single key 'topic_name' \
containing a string of the topic name.";

const SUBQUERY_SYSTEM: &str = "You are an AI assistant that analyzes the user query and generates \
subqueries from it if possible. Your output must be in JSON format with a single key \
'subqueries' containing a list of strings.";

const ANSWER_SYSTEM: &str = "You are an AI assistant that answers user queries related to \
scientific research topics. Your output must be in JSON format with a single key 'answer'.";

/// Material gathered for one subquery.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetrievedContext {
    Documents {
        query: String,
        documents: Vec<RetrievedDocument>,
    },
    Web {
        query: String,
        text: String,
    },
}

impl RetrievedContext {
    pub fn query(&self) -> &str {
        match self {
            RetrievedContext::Documents { query, .. } | RetrievedContext::Web { query, .. } => {
                query
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RetrievedContext::Documents { documents, .. } => documents.is_empty(),
            RetrievedContext::Web { text, .. } => text.trim().is_empty(),
        }
    }

    fn render(&self, out: &mut String) {
        match self {
            RetrievedContext::Documents { documents, .. } => {
                for doc in documents {
                    if !doc.metadata.article_title.is_empty() {
                        out.push_str(&format!("Title: {}\n", doc.metadata.article_title));
                    }
                    if !doc.metadata.url.is_empty() {
                        out.push_str(&format!("Source: {}\n", doc.metadata.url));
                    }
                    out.push_str(&format!("Content: {}\n\n", doc.content));
                }
            }
            RetrievedContext::Web { text, .. } => {
                out.push_str(text);
                out.push_str("\n\n");
            }
        }
    }
}

/// Flatten contexts into the text handed to the answer prompt.
pub fn render_contexts(contexts: &[RetrievedContext]) -> String {
    let mut out = String::new();
    for context in contexts.iter().filter(|c| !c.is_empty()) {
        context.render(&mut out);
    }
    out.trim_end().to_string()
}

async fn ask_json(
    generator: &dyn TextGenerator,
    system: &str,
    prompt: &str,
    field: &str,
) -> Result<serde_json::Value, GenerationError> {
    let raw = generator.generate(system, prompt).await?;
    extract_field(&raw, field)
}

/// Classify the question into a topic name. Empty on failure.
pub async fn extract_topic(
    generator: &dyn TextGenerator,
    prompts: &PromptTemplates,
    catalog: &TopicCatalog,
    question: &str,
) -> String {
    let topics = catalog.names().collect::<Vec<_>>().join("\n");
    let result = async {
        let prompt = prompts.render(
            TOPIC_EXTRACTOR,
            &[("user_query", question), ("predefined_topics", topics.as_str())],
        )?;
        match ask_json(generator, TOPIC_SYSTEM, &prompt, "topic_name").await? {
            serde_json::Value::String(topic) => Ok(topic.trim().to_string()),
            other => Err(GenerationError::InvalidResponse(format!(
                "topic_name is not a string: {}",
                other
            ))),
        }
    }
    .await;

    match result {
        Ok(topic) => {
            info!(model = generator.model(), topic = %topic, "extracted topic");
            topic
        }
        Err(e) => {
            error!(model = generator.model(), error = %e, "topic extraction failed");
            String::new()
        }
    }
}

/// Decompose the question into subqueries. Empty on failure.
pub async fn generate_subqueries(
    generator: &dyn TextGenerator,
    prompts: &PromptTemplates,
    question: &str,
) -> Vec<String> {
    let result = async {
        let prompt = prompts.render(SUBQUERY_GENERATOR, &[("user_query", question)])?;
        let value = ask_json(generator, SUBQUERY_SYSTEM, &prompt, "subqueries").await?;
        Ok::<_, GenerationError>(parse_subqueries(value))
    }
    .await;

    match result {
        Ok(subqueries) => {
            info!(model = generator.model(), count = subqueries.len(), "generated subqueries");
            subqueries
        }
        Err(e) => {
            error!(model = generator.model(), error = %e, "subquery generation failed");
            Vec::new()
        }
    }
}

fn parse_subqueries(value: serde_json::Value) -> Vec<String> {
    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::String(s) => vec![serde_json::Value::String(s)],
        _ => Vec::new(),
    };
    items
        .into_iter()
        .filter_map(|item| match item {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        })
        .collect()
}

/// Similarity search in a topic collection. Empty on failure.
pub async fn retrieve_documents(
    index: &VectorIndex,
    collection: &str,
    query: &str,
    top_k: u64,
    field: VectorField,
) -> Vec<RetrievedDocument> {
    match index.query(collection, query, top_k, field).await {
        Ok(documents) => {
            info!(collection, hits = documents.len(), "retrieved documents");
            documents
        }
        Err(e) => {
            error!(collection, query, error = %e, "document retrieval failed");
            Vec::new()
        }
    }
}

/// Web search fallback. Empty on failure.
pub async fn search_web(search: &dyn WebSearch, query: &str, max_results: u32) -> String {
    match search.search(query, max_results).await {
        Ok(text) => {
            info!(query, "web search complete");
            text
        }
        Err(e) => {
            error!(query, error = %e, "web search failed");
            String::new()
        }
    }
}

/// Synthesize the final answer from gathered material. Empty on failure.
pub async fn generate_answer(
    generator: &dyn TextGenerator,
    prompts: &PromptTemplates,
    question: &str,
    contexts: &[RetrievedContext],
) -> String {
    let results = render_contexts(contexts);
    let result = async {
        let prompt = prompts.render(
            ANSWER_GENERATOR,
            &[("query", question), ("results", results.as_str())],
        )?;
        match ask_json(generator, ANSWER_SYSTEM, &prompt, "answer").await? {
            serde_json::Value::String(answer) => Ok(answer),
            serde_json::Value::Null => Err(GenerationError::MissingField("answer".to_string())),
            // Models occasionally return structured answers
            other => Ok(other.to_string()),
        }
    }
    .await;

    match result {
        Ok(answer) => {
            info!(model = generator.model(), "generated answer");
            answer
        }
        Err(e) => {
            error!(model = generator.model(), error = %e, "answer generation failed");
            String::new()
        }
    }
}
