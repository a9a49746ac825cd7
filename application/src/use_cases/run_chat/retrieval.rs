//! Retrieval gateway: one search plus the relevance and lexical post-filters.

use crate::config::RetrievalParams;
use crate::ports::retriever::{RetrievalError, Retriever};
use ragloop_domain::RetrievedChunk;
use ragloop_domain::retrieval::filter_tokens;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Where the chunks of one attempt came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkSource {
    Supplied,
    Retriever,
}

impl ChunkSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkSource::Supplied => "supplied",
            ChunkSource::Retriever => "retriever",
        }
    }
}

/// Result of one retrieval attempt. Failures are carried, not raised.
#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub chunks: Vec<RetrievedChunk>,
    pub source: ChunkSource,
    /// Chunks returned by the retriever before filtering
    pub raw_count: usize,
    pub error: Option<RetrievalError>,
}

pub struct RetrievalGateway {
    retriever: Arc<dyn Retriever>,
    params: RetrievalParams,
}

impl RetrievalGateway {
    pub fn new(retriever: Arc<dyn Retriever>, params: RetrievalParams) -> Self {
        Self { retriever, params }
    }

    /// Search for `query`, or reuse `supplied` on the first attempt.
    ///
    /// The search never passes a metadata filter; precision is recovered by
    /// the quality gate.
    pub async fn retrieve(
        &self,
        query: &str,
        supplied: Option<&[RetrievedChunk]>,
        retry_count: u32,
    ) -> RetrievalOutcome {
        if let Some(chunks) = supplied
            && retry_count == 0
        {
            info!("Using {} pre-supplied chunks", chunks.len());
            return RetrievalOutcome {
                chunks: chunks.to_vec(),
                source: ChunkSource::Supplied,
                raw_count: chunks.len(),
                error: None,
            };
        }

        let search = self.retriever.search(query, self.params.top_k, None);
        let result = match tokio::time::timeout(self.params.timeout, search).await {
            Ok(result) => result,
            Err(_) => Err(RetrievalError::Timeout),
        };

        match result {
            Ok(chunks) => {
                let raw_count = chunks.len();
                let chunks = self.post_filter(query, chunks);
                info!(
                    "{} returned {} chunks, {} after filtering",
                    self.retriever.name(),
                    raw_count,
                    chunks.len()
                );
                RetrievalOutcome {
                    chunks,
                    source: ChunkSource::Retriever,
                    raw_count,
                    error: None,
                }
            }
            Err(e) => {
                error!("Retrieval failed: {}", e);
                RetrievalOutcome {
                    chunks: Vec::new(),
                    source: ChunkSource::Retriever,
                    raw_count: 0,
                    error: Some(e),
                }
            }
        }
    }

    /// Relevance floor, then the lexical gate.
    ///
    /// The lexical gate is dropped when it would remove every chunk.
    fn post_filter(&self, query: &str, chunks: Vec<RetrievedChunk>) -> Vec<RetrievedChunk> {
        let relevant: Vec<RetrievedChunk> = chunks
            .into_iter()
            .filter(|c| c.relevance_score >= self.params.min_relevance_score)
            .collect();

        let tokens = filter_tokens(query);
        debug!("Lexical filter tokens for '{}': {:?}", query, tokens);
        if tokens.is_empty() || relevant.is_empty() {
            return relevant;
        }

        let matched: Vec<RetrievedChunk> = relevant
            .iter()
            .filter(|c| c.mentions_any(&tokens))
            .cloned()
            .collect();
        if matched.is_empty() {
            warn!("Lexical filter removed all chunks, keeping the ranked set");
            return relevant;
        }
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ragloop_domain::MetadataFilter;
    use std::sync::Mutex;
    use std::time::Duration;

    struct StaticRetriever {
        chunks: Vec<RetrievedChunk>,
        calls: Mutex<Vec<(String, usize, bool)>>,
    }

    impl StaticRetriever {
        fn new(chunks: Vec<RetrievedChunk>) -> Self {
            Self {
                chunks,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Retriever for StaticRetriever {
        async fn search(
            &self,
            query: &str,
            top_k: usize,
            filter: Option<&MetadataFilter>,
        ) -> Result<Vec<RetrievedChunk>, RetrievalError> {
            self.calls
                .lock()
                .unwrap()
                .push((query.to_string(), top_k, filter.is_some()));
            Ok(self.chunks.clone())
        }
    }

    struct FailingRetriever(RetrievalError);

    #[async_trait]
    impl Retriever for FailingRetriever {
        async fn search(
            &self,
            _query: &str,
            _top_k: usize,
            _filter: Option<&MetadataFilter>,
        ) -> Result<Vec<RetrievedChunk>, RetrievalError> {
            Err(self.0.clone())
        }
    }

    struct SlowRetriever;

    #[async_trait]
    impl Retriever for SlowRetriever {
        async fn search(
            &self,
            _query: &str,
            _top_k: usize,
            _filter: Option<&MetadataFilter>,
        ) -> Result<Vec<RetrievedChunk>, RetrievalError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(vec![])
        }
    }

    fn gateway(retriever: Arc<dyn Retriever>) -> RetrievalGateway {
        RetrievalGateway::new(retriever, RetrievalParams::default())
    }

    #[tokio::test]
    async fn test_supplied_chunks_skip_search_on_first_attempt() {
        let retriever = Arc::new(StaticRetriever::new(vec![]));
        let gateway = gateway(retriever.clone());
        let supplied = vec![RetrievedChunk::new("무관한 문서", 0.1)];

        let outcome = gateway.retrieve("일정", Some(&supplied), 0).await;
        assert_eq!(outcome.source, ChunkSource::Supplied);
        assert_eq!(outcome.chunks, supplied);
        assert!(retriever.calls.lock().unwrap().is_empty());

        let outcome = gateway.retrieve("일정", Some(&supplied), 1).await;
        assert_eq!(outcome.source, ChunkSource::Retriever);
        assert_eq!(retriever.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_is_unfiltered_and_uses_top_k() {
        let retriever = Arc::new(StaticRetriever::new(vec![]));
        gateway(retriever.clone()).retrieve("일정", None, 0).await;
        let calls = retriever.calls.lock().unwrap();
        assert_eq!(calls[0], ("일정".to_string(), 5, false));
    }

    #[tokio::test]
    async fn test_relevance_floor() {
        let retriever = Arc::new(StaticRetriever::new(vec![
            RetrievedChunk::new("일정 A", 0.9),
            RetrievedChunk::new("일정 B", 0.29),
            RetrievedChunk::new("일정 C", 0.3),
        ]));
        let outcome = gateway(retriever).retrieve("일정", None, 0).await;
        let contents: Vec<_> = outcome.chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["일정 A", "일정 C"]);
        assert_eq!(outcome.raw_count, 3);
    }

    #[tokio::test]
    async fn test_lexical_filter_keeps_matching_chunks() {
        let retriever = Arc::new(StaticRetriever::new(vec![
            RetrievedChunk::new("예산 집행 현황", 0.9),
            RetrievedChunk::new("스프린트 일정표", 0.8),
        ]));
        let outcome = gateway(retriever).retrieve("일정을 알려줘", None, 0).await;
        assert_eq!(outcome.chunks.len(), 1);
        assert_eq!(outcome.chunks[0].content, "스프린트 일정표");
    }

    #[tokio::test]
    async fn test_lexical_filter_never_empties_the_set() {
        let retriever = Arc::new(StaticRetriever::new(vec![
            RetrievedChunk::new("예산 집행 현황", 0.9),
            RetrievedChunk::new("리스크 목록", 0.8),
        ]));
        let outcome = gateway(retriever).retrieve("일정을 알려줘", None, 0).await;
        assert_eq!(outcome.chunks.len(), 2);
    }

    #[tokio::test]
    async fn test_failure_degrades_to_empty() {
        let retriever = Arc::new(FailingRetriever(RetrievalError::Unavailable(
            "connection refused".to_string(),
        )));
        let outcome = gateway(retriever).retrieve("일정", None, 0).await;
        assert!(outcome.chunks.is_empty());
        assert!(matches!(outcome.error, Some(RetrievalError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_timeout_degrades_to_empty() {
        let params = RetrievalParams::default().with_timeout(Duration::from_millis(10));
        let gateway = RetrievalGateway::new(Arc::new(SlowRetriever), params);
        let outcome = gateway.retrieve("일정", None, 0).await;
        assert!(outcome.chunks.is_empty());
        assert_eq!(outcome.error, Some(RetrievalError::Timeout));
    }
}
