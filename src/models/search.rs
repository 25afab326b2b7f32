//! Search-related models for queries and results.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::point::ChunkMetadata;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// Machine-parseable JSON format
    Json,
    /// Documentation-friendly Markdown format
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// Named vector a query is matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorField {
    /// Embedding of the chunk text
    #[default]
    Default,
    /// Embedding of the document summary
    Summary,
}

impl VectorField {
    pub const ALL: [VectorField; 2] = [VectorField::Default, VectorField::Summary];

    pub fn name(self) -> &'static str {
        match self {
            VectorField::Default => "default",
            VectorField::Summary => "summary",
        }
    }

    /// Resolve a user-supplied search type. Unknown values fall back to
    /// [`VectorField::Default`] with a warning instead of failing.
    pub fn from_search_type(search_type: &str) -> Self {
        match search_type {
            "default" => VectorField::Default,
            "summary" => VectorField::Summary,
            other => {
                warn!(search_type = other, "unknown search type, falling back to 'default'");
                VectorField::Default
            }
        }
    }
}

impl<'de> Deserialize<'de> for VectorField {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let search_type = String::deserialize(deserializer)?;
        Ok(VectorField::from_search_type(&search_type))
    }
}

impl std::fmt::Display for VectorField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single similarity search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    /// Chunk text
    pub content: String,
    pub metadata: ChunkMetadata,
    pub score: f32,
}

/// Results of a retrieval command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResults {
    pub query: String,
    pub collection: String,
    pub search_type: VectorField,
    pub results: Vec<RetrievedDocument>,
    pub duration_ms: u64,
}

impl QueryResults {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
