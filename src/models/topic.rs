//! Mapping from research topic names to vector store collections.

use serde::Serialize;

pub const DEFAULT_TOPICS: [&str; 4] = [
    "Diffusion Models in Computer Vision",
    "Graph Neural Networks (GNNs) for Molecular Property Prediction",
    "Transformer Models for Protein Folding",
    "Large Language Models for Mathematical Reasoning",
];

/// Collection name for a topic: spaces become underscores.
pub fn topic_slug(name: &str) -> String {
    name.trim().replace(' ', "_")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topic {
    pub name: String,
    pub collection: String,
}

/// Static catalog of the topics that have a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicCatalog {
    topics: Vec<Topic>,
}

impl TopicCatalog {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let topics = names
            .into_iter()
            .map(|name| {
                let name = name.as_ref().trim().to_string();
                Topic {
                    collection: topic_slug(&name),
                    name,
                }
            })
            .filter(|t| !t.name.is_empty())
            .collect();
        Self { topics }
    }

    /// Collection for an exact topic name, `None` for anything unrecognized.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.topics
            .iter()
            .find(|t| t.name == name.trim())
            .map(|t| t.collection.as_str())
    }

    /// Resolve either a topic name or a collection slug.
    pub fn resolve(&self, name_or_slug: &str) -> Option<&str> {
        let key = name_or_slug.trim();
        self.lookup(key).or_else(|| {
            self.topics
                .iter()
                .find(|t| t.collection == key)
                .map(|t| t.collection.as_str())
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.topics.iter().map(|t| t.name.as_str())
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

impl Default for TopicCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_TOPICS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug() {
        assert_eq!(
            topic_slug("Graph Neural Networks (GNNs) for Molecular Property Prediction"),
            "Graph_Neural_Networks_(GNNs)_for_Molecular_Property_Prediction"
        );
    }

    #[test]
    fn test_lookup_known_topic() {
        let catalog = TopicCatalog::default();
        assert_eq!(
            catalog.lookup("Diffusion Models in Computer Vision"),
            Some("Diffusion_Models_in_Computer_Vision")
        );
    }

    #[test]
    fn test_lookup_unknown_topic() {
        let catalog = TopicCatalog::default();
        assert_eq!(catalog.lookup("Quantum Error Correction"), None);
        assert_eq!(catalog.lookup(""), None);
    }

    #[test]
    fn test_resolve_accepts_slug() {
        let catalog = TopicCatalog::default();
        assert_eq!(
            catalog.resolve("Transformer_Models_for_Protein_Folding"),
            Some("Transformer_Models_for_Protein_Folding")
        );
        assert_eq!(catalog.lookup("Transformer_Models_for_Protein_Folding"), None);
    }

    #[test]
    fn test_custom_catalog_skips_blank_names() {
        let catalog = TopicCatalog::new(["  Sparse Attention ", ""]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.lookup("Sparse Attention"), Some("Sparse_Attention"));
    }
}
