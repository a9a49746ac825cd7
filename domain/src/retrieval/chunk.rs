//! Retrieved chunk value objects

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A metadata value attached to a chunk: a scalar or a list of scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<MetadataValue>),
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::Text(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::Text(s)
    }
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        MetadataValue::Integer(v)
    }
}

impl From<bool> for MetadataValue {
    fn from(v: bool) -> Self {
        MetadataValue::Bool(v)
    }
}

/// Metadata map keyed by field name. Ordered so traces are stable.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// Equality filter passed through to a retriever.
pub type MetadataFilter = BTreeMap<String, MetadataValue>;

/// A retrieval-unit fragment of a larger document.
///
/// Chunks are produced once per retrieval and never mutated afterwards;
/// later stages only filter or reorder them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub content: String,
    /// Higher is more relevant. Comparable within one retriever only.
    #[serde(default, alias = "score")]
    pub relevance_score: f64,
    #[serde(default)]
    pub metadata: Metadata,
}

impl RetrievedChunk {
    pub fn new(content: impl Into<String>, relevance_score: f64) -> Self {
        Self {
            content: content.into(),
            relevance_score,
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Whether the lowercased content contains at least one of `tokens`.
    pub fn mentions_any<S: AsRef<str>>(&self, tokens: &[S]) -> bool {
        let haystack = self.content.to_lowercase();
        tokens
            .iter()
            .any(|t| haystack.contains(&t.as_ref().to_lowercase()))
    }

    /// Whether every entry of `filter` is present with an equal value.
    pub fn matches_filter(&self, filter: &MetadataFilter) -> bool {
        filter
            .iter()
            .all(|(key, expected)| self.metadata.get(key) == Some(expected))
    }
}

/// A caller-supplied chunk, either a bare string or a full record.
///
/// Bare strings are treated as fully relevant evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SuppliedChunk {
    Text(String),
    Chunk(RetrievedChunk),
}

impl From<SuppliedChunk> for RetrievedChunk {
    fn from(supplied: SuppliedChunk) -> Self {
        match supplied {
            SuppliedChunk::Text(content) => RetrievedChunk::new(content, 1.0),
            SuppliedChunk::Chunk(chunk) => chunk,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mentions_any_is_case_insensitive() {
        let chunk = RetrievedChunk::new("Sprint 일정 is fixed", 0.8);
        assert!(chunk.mentions_any(&["sprint"]));
        assert!(chunk.mentions_any(&["일정"]));
        assert!(!chunk.mentions_any(&["예산"]));
        assert!(!chunk.mentions_any::<&str>(&[]));
    }

    #[test]
    fn test_matches_filter() {
        let chunk = RetrievedChunk::new("x", 0.5)
            .with_metadata("project", "alpha")
            .with_metadata("phase", 2i64);

        let mut filter = MetadataFilter::new();
        assert!(chunk.matches_filter(&filter));

        filter.insert("project".to_string(), "alpha".into());
        assert!(chunk.matches_filter(&filter));

        filter.insert("phase".to_string(), 3i64.into());
        assert!(!chunk.matches_filter(&filter));
    }

    #[test]
    fn test_supplied_chunk_deserialization() {
        let json = r#"["plain text", {"content": "record", "relevance_score": 0.4, "metadata": {"tags": ["a", "b"]}}]"#;
        let supplied: Vec<SuppliedChunk> = serde_json::from_str(json).unwrap();
        let chunks: Vec<RetrievedChunk> = supplied.into_iter().map(Into::into).collect();

        assert_eq!(chunks[0].content, "plain text");
        assert_eq!(chunks[0].relevance_score, 1.0);
        assert_eq!(chunks[1].relevance_score, 0.4);
        assert_eq!(
            chunks[1].metadata.get("tags"),
            Some(&MetadataValue::List(vec!["a".into(), "b".into()]))
        );
    }

    #[test]
    fn test_score_alias() {
        let chunk: RetrievedChunk = serde_json::from_str(r#"{"content": "c", "score": 0.9}"#).unwrap();
        assert_eq!(chunk.relevance_score, 0.9);
        assert!(chunk.metadata.is_empty());
    }
}
