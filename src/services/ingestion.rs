//! Corpus ingestion: markdown papers plus their arXiv metadata into
//! per-topic collections.
//!
//! Expected layout:
//!
//! ```text
//! <root>/<topic dir>/pdfs_metadata.json
//! <root>/<topic dir>/**/markdowns/**/*.md
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use indicatif::ProgressBar;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::chunker::TextChunker;
use super::index::{UploadSummary, VectorIndex};
use crate::error::IngestError;
use crate::models::{
    ChunkMetadata, Document, IndexingConfig, PaperMetadata, Point, PointPayload, find_metadata,
};
use crate::utils::file::{collect_markdown_files_in, find_markdown_dirs, read_file_content};

pub const METADATA_FILE: &str = "pdfs_metadata.json";
const TOPIC_DIR_PREFIX: &str = "arxiv_pdfs_";

/// Collection name for a topic directory: its name minus the `arxiv_pdfs_` prefix.
pub fn collection_name(topic_dir: &Path) -> String {
    let name = topic_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    match name.strip_prefix(TOPIC_DIR_PREFIX) {
        Some(rest) => rest.to_string(),
        None => name,
    }
}

/// Read a topic's metadata records. A missing file yields no records.
pub fn load_metadata(topic_dir: &Path) -> Result<Vec<PaperMetadata>, IngestError> {
    let path = topic_dir.join(METADATA_FILE);
    if !path.exists() {
        warn!(path = %path.display(), "metadata file missing, documents get empty metadata");
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&content)?)
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TopicIngestStats {
    pub collection: String,
    pub documents: u64,
    pub documents_skipped: u64,
    pub chunks: u64,
    /// `None` on a dry run
    pub upload: Option<UploadSummary>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestStats {
    pub topics: Vec<TopicIngestStats>,
    pub topics_skipped: Vec<String>,
    pub dry_run: bool,
    pub duration_ms: u64,
}

impl IngestStats {
    pub fn documents(&self) -> u64 {
        self.topics.iter().map(|t| t.documents).sum()
    }

    pub fn chunks(&self) -> u64 {
        self.topics.iter().map(|t| t.chunks).sum()
    }
}

pub struct IngestionPipeline {
    index: Arc<VectorIndex>,
    chunker: TextChunker,
    upload_batch_size: usize,
    max_file_size: u64,
    dry_run: bool,
    progress: Option<ProgressBar>,
}

impl IngestionPipeline {
    pub fn new(index: Arc<VectorIndex>, config: &IndexingConfig) -> Self {
        Self {
            index,
            chunker: TextChunker::from_config(config),
            upload_batch_size: config.upload_batch_size,
            max_file_size: config.max_file_size,
            dry_run: false,
            progress: None,
        }
    }

    /// Chunk and embed without uploading.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Ticked once per document processed.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Turn one document into points, IDs counting up from `start_id`.
    /// All points share the document's summary vector and metadata.
    pub async fn process_document(
        &self,
        document: &Document,
        records: &[PaperMetadata],
        start_id: u64,
    ) -> Result<Vec<Point>, IngestError> {
        let paper = match find_metadata(records, &document.name) {
            Some(paper) => paper.clone(),
            None => {
                warn!(document = %document.name, "no metadata record found");
                PaperMetadata::default()
            }
        };

        let chunks = self.chunker.chunk(&document.content)?;
        if chunks.is_empty() {
            debug!(document = %document.name, "document produced no chunks");
            return Ok(Vec::new());
        }

        let summary_vector = self.index.encode(&paper.summary).await?;
        let chunk_vectors = self.index.encode_batch(&chunks).await?;
        let metadata = ChunkMetadata::from(&paper);

        let points = chunks
            .into_iter()
            .zip(chunk_vectors)
            .enumerate()
            .map(|(i, (chunk, vector))| {
                Point::new(
                    start_id + i as u64,
                    vector,
                    summary_vector.clone(),
                    PointPayload {
                        page_content: chunk,
                        metadata: metadata.clone(),
                    },
                )
            })
            .collect::<Vec<_>>();

        debug!(document = %document.name, chunks = points.len(), "processed document");
        Ok(points)
    }

    /// Ingest every markdown document of one topic directory into its
    /// collection with a single upload.
    pub async fn ingest_topic(&self, topic_dir: &Path) -> Result<TopicIngestStats, IngestError> {
        let collection = collection_name(topic_dir);
        let mut stats = TopicIngestStats {
            collection: collection.clone(),
            ..Default::default()
        };

        let markdown_dirs = find_markdown_dirs(topic_dir);
        if markdown_dirs.is_empty() {
            warn!(collection = %collection, "no markdowns directory, skipping topic");
            return Ok(stats);
        }

        let records = load_metadata(topic_dir)?;
        info!(
            collection = %collection,
            dirs = markdown_dirs.len(),
            records = records.len(),
            "ingesting topic"
        );

        let files = collect_markdown_files_in(&markdown_dirs);

        if let Some(pb) = &self.progress {
            pb.set_length(files.len() as u64);
            pb.set_position(0);
            pb.set_message(collection.clone());
        }

        let mut points = Vec::new();
        for path in files {
            if let Some(pb) = &self.progress {
                pb.inc(1);
            }

            let content = match read_file_content(&path, self.max_file_size) {
                Ok(content) => content,
                Err(e) => {
                    error!(path = %path.display(), error = %e, "failed to read document, skipping");
                    stats.documents_skipped += 1;
                    continue;
                }
            };

            let document = Document::new(path, content);
            let start_id = points.len() as u64 + 1;
            let document_points = self.process_document(&document, &records, start_id).await?;
            stats.documents += 1;
            stats.chunks += document_points.len() as u64;
            points.extend(document_points);
        }

        if self.dry_run {
            info!(collection = %collection, chunks = stats.chunks, "dry run, nothing uploaded");
            return Ok(stats);
        }

        if points.is_empty() {
            info!(collection = %collection, "no documents processed");
        }
        let summary = self
            .index
            .upload_points(&collection, points, self.upload_batch_size)
            .await?;
        stats.upload = Some(summary);

        Ok(stats)
    }

    /// Ingest every topic directory directly under `root`.
    pub async fn ingest_corpus(&self, root: &Path) -> Result<IngestStats, IngestError> {
        let start = Instant::now();
        let mut topic_dirs: Vec<PathBuf> = std::fs::read_dir(root)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .filter(|path| {
                !path
                    .file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with('.'))
            })
            .collect();
        topic_dirs.sort();

        let mut stats = IngestStats {
            dry_run: self.dry_run,
            ..Default::default()
        };

        for topic_dir in topic_dirs {
            let topic = self.ingest_topic(&topic_dir).await?;
            if topic.documents == 0 && topic.documents_skipped == 0 && topic.upload.is_none() {
                stats.topics_skipped.push(topic.collection);
            } else {
                stats.topics.push(topic);
            }
        }

        stats.duration_ms = start.elapsed().as_millis() as u64;
        Ok(stats)
    }
}
