use std::fmt::Write as FmtWrite;

use console::style;
use serde::Serialize;

use crate::agents::{ResearchState, RetrievedContext, Route};
use crate::models::{OutputFormat, QueryResults, Topic};
use crate::services::IngestStats;
use crate::utils::text::preview;

const PREVIEW_CHARS: usize = 200;

pub trait Formatter {
    fn format_query_results(&self, results: &QueryResults) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_ingest_stats(&self, stats: &IngestStats) -> String;
    fn format_answer(&self, state: &ResearchState) -> String;
    fn format_topics(&self, topics: &[Topic]) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub embedding_backend: String,
    pub embedding_model: String,
    /// Only probed for the HTTP backend
    pub embedding_reachable: Option<bool>,
    pub vector_store_driver: String,
    pub vector_store_url: String,
    pub vector_store_connected: bool,
    pub topics: Vec<TopicStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicStatus {
    pub name: String,
    pub collection: String,
    /// `None` when the collection does not exist yet
    pub points: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRef {
    pub title: String,
    pub url: String,
}

/// Distinct papers cited by the retrieved documents, in retrieval order.
pub fn answer_sources(state: &ResearchState) -> Vec<SourceRef> {
    let mut sources: Vec<SourceRef> = Vec::new();
    for context in &state.contexts {
        if let RetrievedContext::Documents { documents, .. } = context {
            for doc in documents {
                let url = &doc.metadata.url;
                if url.is_empty() || sources.iter().any(|s| &s.url == url) {
                    continue;
                }
                sources.push(SourceRef {
                    title: doc.metadata.article_title.clone(),
                    url: url.clone(),
                });
            }
        }
    }
    sources
}

fn route_label(route: Option<&Route>) -> String {
    match route {
        Some(Route::Collection(name)) => format!("collection {}", name),
        Some(Route::WebSearch) => "web search".to_string(),
        None => "none".to_string(),
    }
}

fn build(f: impl FnOnce(&mut String) -> std::fmt::Result) -> String {
    let mut output = String::new();
    // Writing into a String cannot fail
    let _ = f(&mut output);
    output
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_query_results(&self, results: &QueryResults) -> String {
        if results.is_empty() {
            return format!(
                "No results found in {} for: {}\n",
                results.collection, results.query
            );
        }

        build(|output| {
            writeln!(output, "Results for: \"{}\"", results.query)?;
            writeln!(
                output,
                "{} hits from {} ({} vector) in {}ms\n",
                results.results.len(),
                results.collection,
                results.search_type,
                results.duration_ms
            )?;

            for (i, doc) in results.results.iter().enumerate() {
                writeln!(output, "{}. [Score: {:.3}]", i + 1, doc.score)?;
                if !doc.metadata.article_title.is_empty() {
                    writeln!(output, "   Title: {}", doc.metadata.article_title)?;
                }
                if !doc.metadata.url.is_empty() {
                    writeln!(output, "   Source: {}", doc.metadata.url)?;
                }
                writeln!(output, "   ---")?;
                writeln!(output, "   {}\n", preview(&doc.content, PREVIEW_CHARS))?;
            }
            Ok(())
        })
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        build(|output| {
            writeln!(output, "Status")?;
            writeln!(output, "------")?;
            write!(
                output,
                "Embedding:     {} ({})",
                status.embedding_model, status.embedding_backend
            )?;
            match status.embedding_reachable {
                Some(true) => writeln!(output, " {}", style("[CONNECTED]").green())?,
                Some(false) => writeln!(output, " {}", style("[DISCONNECTED]").red())?,
                None => writeln!(output)?,
            }

            let store_status = if status.vector_store_connected {
                style("[CONNECTED]").green()
            } else {
                style("[DISCONNECTED]").red()
            };
            writeln!(
                output,
                "Vector Store:  {} {}",
                status.vector_store_driver, store_status
            )?;
            writeln!(output, "  URL:         {}", status.vector_store_url)?;

            if status.vector_store_connected {
                writeln!(output, "\nCollections")?;
                for topic in &status.topics {
                    match topic.points {
                        Some(points) => {
                            writeln!(output, "  {} ({} points)", topic.collection, points)?
                        }
                        None => writeln!(output, "  {} (not ingested)", topic.collection)?,
                    }
                }
            }
            Ok(())
        })
    }

    fn format_ingest_stats(&self, stats: &IngestStats) -> String {
        build(|output| {
            if stats.dry_run {
                writeln!(output, "Dry Run Complete (nothing uploaded)")?;
            } else {
                writeln!(output, "Ingestion Complete")?;
            }
            writeln!(output, "------------------")?;
            for topic in &stats.topics {
                write!(
                    output,
                    "{}: {} documents, {} chunks",
                    topic.collection, topic.documents, topic.chunks
                )?;
                if topic.documents_skipped > 0 {
                    write!(output, ", {} skipped", topic.documents_skipped)?;
                }
                if let Some(upload) = topic.upload {
                    write!(output, ", ids {}..", upload.offset + 1)?;
                }
                writeln!(output)?;
            }
            if !stats.topics_skipped.is_empty() {
                writeln!(output, "Skipped: {}", stats.topics_skipped.join(", "))?;
            }
            writeln!(output, "Documents: {}", stats.documents())?;
            writeln!(output, "Chunks: {}", stats.chunks())?;
            writeln!(output, "Duration: {}ms", stats.duration_ms)
        })
    }

    fn format_answer(&self, state: &ResearchState) -> String {
        build(|output| {
            let answer = state.answer_text();
            if answer.is_empty() {
                writeln!(output, "{}", style("No answer could be generated.").yellow())?;
            } else {
                writeln!(output, "{}", answer)?;
            }
            writeln!(output)?;
            writeln!(output, "Route: {}", route_label(state.route.as_ref()))?;

            let sources = answer_sources(state);
            if !sources.is_empty() {
                writeln!(output, "Sources:")?;
                for source in &sources {
                    if source.title.is_empty() {
                        writeln!(output, "  - {}", source.url)?;
                    } else {
                        writeln!(output, "  - {} ({})", source.title, source.url)?;
                    }
                }
            }
            Ok(())
        })
    }

    fn format_topics(&self, topics: &[Topic]) -> String {
        if topics.is_empty() {
            return "No topics configured.\n".to_string();
        }

        build(|output| {
            writeln!(output, "Topics")?;
            writeln!(output, "------")?;
            for topic in topics {
                writeln!(output, "  {} -> {}", topic.name, topic.collection)?;
            }
            Ok(())
        })
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("{} {}\n", style("Error:").red().bold(), error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render<T: Serialize + ?Sized>(&self, value: &T) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
    }
}

impl Formatter for JsonFormatter {
    fn format_query_results(&self, results: &QueryResults) -> String {
        self.render(results)
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        self.render(status)
    }

    fn format_ingest_stats(&self, stats: &IngestStats) -> String {
        let json = serde_json::json!({
            "topics": stats.topics,
            "topics_skipped": stats.topics_skipped,
            "dry_run": stats.dry_run,
            "documents": stats.documents(),
            "chunks": stats.chunks(),
            "duration_ms": stats.duration_ms,
        });
        self.render(&json)
    }

    fn format_answer(&self, state: &ResearchState) -> String {
        let json = serde_json::json!({
            "question": state.question,
            "topic": state.topic,
            "route": state.route,
            "subqueries": state.subqueries,
            "answer": state.answer_text(),
            "sources": answer_sources(state),
        });
        self.render(&json)
    }

    fn format_topics(&self, topics: &[Topic]) -> String {
        self.render(&serde_json::json!({ "topics": topics }))
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({"error": error}).to_string()
    }
}

pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format_query_results(&self, results: &QueryResults) -> String {
        if results.is_empty() {
            return format!(
                "## No results found\n\nCollection: `{}`\n\nQuery: `{}`\n",
                results.collection, results.query
            );
        }

        build(|output| {
            writeln!(output, "## Results\n")?;
            writeln!(output, "**Query:** `{}`\n", results.query)?;
            writeln!(
                output,
                "**Collection:** `{}` ({} vector), {}ms\n",
                results.collection, results.search_type, results.duration_ms
            )?;

            for (i, doc) in results.results.iter().enumerate() {
                writeln!(output, "### {}. Score: {:.3}\n", i + 1, doc.score)?;
                if !doc.metadata.url.is_empty() {
                    writeln!(
                        output,
                        "**Source:** [{}]({})\n",
                        doc.metadata.article_title, doc.metadata.url
                    )?;
                }
                writeln!(output, "```")?;
                writeln!(output, "{}", doc.content)?;
                writeln!(output, "```\n")?;
            }
            Ok(())
        })
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        build(|output| {
            writeln!(output, "## Status\n")?;
            writeln!(
                output,
                "- **Embedding:** {} ({})",
                status.embedding_model, status.embedding_backend
            )?;
            let connected = if status.vector_store_connected {
                "✅"
            } else {
                "❌"
            };
            writeln!(
                output,
                "- **Vector Store:** {} `{}` {}\n",
                status.vector_store_driver, status.vector_store_url, connected
            )?;

            if status.vector_store_connected {
                writeln!(output, "| Collection | Points |")?;
                writeln!(output, "|------------|--------|")?;
                for topic in &status.topics {
                    let points = topic
                        .points
                        .map_or_else(|| "-".to_string(), |p| p.to_string());
                    writeln!(output, "| `{}` | {} |", topic.collection, points)?;
                }
            }
            Ok(())
        })
    }

    fn format_ingest_stats(&self, stats: &IngestStats) -> String {
        build(|output| {
            if stats.dry_run {
                writeln!(output, "## Dry Run Complete\n")?;
            } else {
                writeln!(output, "## Ingestion Complete\n")?;
            }
            writeln!(output, "| Collection | Documents | Skipped | Chunks |")?;
            writeln!(output, "|------------|-----------|---------|--------|")?;
            for topic in &stats.topics {
                writeln!(
                    output,
                    "| `{}` | {} | {} | {} |",
                    topic.collection, topic.documents, topic.documents_skipped, topic.chunks
                )?;
            }
            writeln!(output, "\nDuration: {}ms", stats.duration_ms)
        })
    }

    fn format_answer(&self, state: &ResearchState) -> String {
        build(|output| {
            writeln!(output, "## Answer\n")?;
            let answer = state.answer_text();
            if answer.is_empty() {
                writeln!(output, "*No answer could be generated.*\n")?;
            } else {
                writeln!(output, "{}\n", answer)?;
            }
            writeln!(output, "**Route:** {}\n", route_label(state.route.as_ref()))?;

            let sources = answer_sources(state);
            if !sources.is_empty() {
                writeln!(output, "### Sources\n")?;
                for source in &sources {
                    writeln!(output, "- [{}]({})", source.title, source.url)?;
                }
            }
            Ok(())
        })
    }

    fn format_topics(&self, topics: &[Topic]) -> String {
        if topics.is_empty() {
            return "## Topics\n\n*No topics configured.*\n".to_string();
        }

        build(|output| {
            writeln!(output, "## Topics\n")?;
            writeln!(output, "| Topic | Collection |")?;
            writeln!(output, "|-------|------------|")?;
            for topic in topics {
                writeln!(output, "| {} | `{}` |", topic.name, topic.collection)?;
            }
            Ok(())
        })
    }

    fn format_message(&self, message: &str) -> String {
        format!("> {}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("> ⚠️ **Error:** {}\n", error)
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}
