//! In-memory corpus retriever
//!
//! Scores every chunk by the fraction of query tokens it contains. Good
//! enough for demos and tests; real deployments point at a search service.

use async_trait::async_trait;
use ragloop_application::ports::retriever::{RetrievalError, Retriever};
use ragloop_domain::retrieval::filter_tokens;
use ragloop_domain::{MetadataFilter, RetrievedChunk, SuppliedChunk};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Errors loading a corpus file
#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Failed to read corpus {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid corpus {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Retriever over a fixed list of chunks
#[derive(Debug, Clone, Default)]
pub struct InMemoryRetriever {
    chunks: Vec<RetrievedChunk>,
}

impl InMemoryRetriever {
    pub fn new(chunks: Vec<RetrievedChunk>) -> Self {
        Self { chunks }
    }

    /// Load a JSON array whose items are strings or chunk records.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CorpusError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CorpusError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let retriever = Self::from_json_str(&content).map_err(|source| CorpusError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        info!(
            "Loaded {} corpus chunks from {}",
            retriever.len(),
            path.display()
        );
        Ok(retriever)
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let items: Vec<SuppliedChunk> = serde_json::from_str(json)?;
        Ok(Self::new(items.into_iter().map(RetrievedChunk::from).collect()))
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    fn query_tokens(query: &str) -> Vec<String> {
        let tokens = filter_tokens(query);
        if tokens.is_empty() {
            query
                .split_whitespace()
                .map(str::to_lowercase)
                .collect()
        } else {
            tokens
        }
    }
}

#[async_trait]
impl Retriever for InMemoryRetriever {
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievedChunk>, RetrievalError> {
        let tokens = Self::query_tokens(query);
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f64, &RetrievedChunk)> = self
            .chunks
            .iter()
            .filter(|chunk| filter.is_none_or(|f| chunk.matches_filter(f)))
            .filter_map(|chunk| {
                let content = chunk.content.to_lowercase();
                let hits = tokens.iter().filter(|t| content.contains(t.as_str())).count();
                (hits > 0).then(|| (hits as f64 / tokens.len() as f64, chunk))
            })
            .collect();
        // stable: ties keep corpus order
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(top_k);

        debug!("In-memory search '{}': {} hits", query, scored.len());
        Ok(scored
            .into_iter()
            .map(|(score, chunk)| RetrievedChunk {
                relevance_score: score,
                ..chunk.clone()
            })
            .collect())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> InMemoryRetriever {
        InMemoryRetriever::from_json_str(
            r#"[
                "프로젝트 일정: 1단계는 3월 15일 종료",
                {"content": "예산 집행 현황 보고", "metadata": {"team": "finance"}},
                {"content": "일정 변경 시 예산 재검토", "relevance_score": 0.2, "metadata": {"team": "pmo"}},
                "리스크 관리 계획"
            ]"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_ranks_by_token_overlap() {
        let results = corpus().search("일정 예산", 5, None).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].content, "일정 변경 시 예산 재검토");
        assert_eq!(results[0].relevance_score, 1.0);
        assert_eq!(results[1].relevance_score, 0.5);
    }

    #[tokio::test]
    async fn test_honors_top_k_and_filter() {
        let retriever = corpus();
        assert_eq!(retriever.search("일정 예산", 1, None).await.unwrap().len(), 1);

        let filter = MetadataFilter::from([("team".to_string(), "finance".into())]);
        let results = retriever.search("일정 예산", 5, Some(&filter)).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "예산 집행 현황 보고");
    }

    #[tokio::test]
    async fn test_no_overlap_returns_nothing() {
        let results = corpus().search("날씨", 5, None).await.unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        std::fs::write(&path, r#"["a 문서", "b 문서"]"#).unwrap();
        assert_eq!(InMemoryRetriever::from_json_file(&path).unwrap().len(), 2);

        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            InMemoryRetriever::from_json_file(&path),
            Err(CorpusError::Parse { .. })
        ));
        assert!(matches!(
            InMemoryRetriever::from_json_file(dir.path().join("missing.json")),
            Err(CorpusError::Io { .. })
        ));
    }
}
