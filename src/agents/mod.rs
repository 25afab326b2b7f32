//! Question answering on top of the index: prompts, LLM and web search
//! adapters, the failure-absorbing tool layer, and the research flow.

mod flow;
mod generator;
mod prompts;
pub mod tools;
mod web_search;

pub use flow::{ResearchFlow, ResearchState, Route};
pub use generator::{OllamaGenerator, TextGenerator, extract_field};
pub use prompts::{
    ANSWER_GENERATOR, PromptTemplates, SUBQUERY_GENERATOR, TOPIC_EXTRACTOR,
};
pub use tools::RetrievedContext;
pub use web_search::{SearchHit, TavilySearch, WebSearch, aggregate_results};
