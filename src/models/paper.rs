use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One record of a topic's `pdfs_metadata.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub pdf_url: String,
    #[serde(default)]
    pub filepath: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub authors: Vec<String>,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub published: String,
}

impl PaperMetadata {
    /// Last `/`-separated segment of the PDF URL.
    pub fn pdf_name(&self) -> &str {
        self.pdf_url.rsplit('/').next().unwrap_or_default()
    }
}

/// Find the record for a document by matching its name against the end of each
/// record's `pdf_url`. First match wins.
pub fn find_metadata<'a>(records: &'a [PaperMetadata], doc_name: &str) -> Option<&'a PaperMetadata> {
    records
        .iter()
        .find(|record| record.pdf_url.ends_with(doc_name))
}

/// A converted paper body.
#[derive(Debug, Clone)]
pub struct Document {
    /// File name without the `.md` suffix
    pub name: String,
    pub path: PathBuf,
    pub content: String,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, content: String) -> Self {
        let path = path.into();
        let name = derive_doc_name(&path);
        Self {
            name,
            path,
            content,
        }
    }
}

/// Document name used for metadata lookup: the file name up to its first `.md`.
pub fn derive_doc_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    match file_name.split_once(".md") {
        Some((stem, _)) => stem.to_string(),
        None => file_name,
    }
}
