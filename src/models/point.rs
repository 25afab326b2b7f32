use serde::{Deserialize, Serialize};

use super::paper::PaperMetadata;

/// Paper-level metadata stored alongside every chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(default)]
    pub article_title: String,
    #[serde(default)]
    pub url: String,
    /// Last path segment of `url`
    #[serde(default)]
    pub pdf_name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub published: String,
}

impl From<&PaperMetadata> for ChunkMetadata {
    fn from(paper: &PaperMetadata) -> Self {
        Self {
            article_title: paper.title.clone(),
            url: paper.pdf_url.clone(),
            pdf_name: paper.pdf_name().to_string(),
            summary: paper.summary.clone(),
            authors: paper.authors.clone(),
            published: paper.published.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointPayload {
    pub page_content: String,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointVectors {
    pub default: Vec<f32>,
    pub summary: Vec<f32>,
}

/// A storable retrieval unit: one chunk, its two embeddings and its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Reassigned by `VectorIndex::upload_points`
    pub id: u64,
    pub vectors: PointVectors,
    pub payload: PointPayload,
}

impl Point {
    pub fn new(id: u64, default: Vec<f32>, summary: Vec<f32>, payload: PointPayload) -> Self {
        Self {
            id,
            vectors: PointVectors { default, summary },
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_metadata_from_paper() {
        let paper = PaperMetadata {
            title: "AnyI2V".to_string(),
            pdf_url: "http://arxiv.org/pdf/2507.02857v1".to_string(),
            filepath: "./arxiv_pdfs/2507.02857v1.pdf".to_string(),
            summary: "Training-free motion control.".to_string(),
            authors: vec!["Ziye Li".to_string()],
            published: "2025-07-03".to_string(),
        };

        let metadata = ChunkMetadata::from(&paper);
        assert_eq!(metadata.article_title, "AnyI2V");
        assert_eq!(metadata.pdf_name, "2507.02857v1");
        assert_eq!(metadata.authors, vec!["Ziye Li".to_string()]);
    }

    #[test]
    fn test_payload_json_shape() {
        let payload = PointPayload {
            page_content: "text".to_string(),
            metadata: ChunkMetadata::default(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["page_content"], "text");
        assert_eq!(json["metadata"]["authors"], serde_json::json!([]));
        assert_eq!(json["metadata"]["article_title"], "");
    }

    #[test]
    fn test_metadata_tolerates_missing_fields() {
        let metadata: ChunkMetadata = serde_json::from_str(r#"{"url": "u"}"#).unwrap();
        assert_eq!(metadata.url, "u");
        assert!(metadata.authors.is_empty());
    }
}
