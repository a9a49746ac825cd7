//! HTTP search client
//!
//! POSTs `{query, top_k, filter}` as JSON and accepts either a bare array of
//! chunks or `{"results": [...]}`.

use async_trait::async_trait;
use ragloop_application::ports::retriever::{RetrievalError, Retriever};
use ragloop_domain::{MetadataFilter, RetrievedChunk};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    top_k: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a MetadataFilter>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    Bare(Vec<RetrievedChunk>),
    Wrapped { results: Vec<RetrievedChunk> },
}

/// Retriever backed by a remote search endpoint
pub struct HttpRetriever {
    client: reqwest::Client,
    url: String,
}

impl HttpRetriever {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn request_error(e: reqwest::Error) -> RetrievalError {
    if e.is_timeout() {
        RetrievalError::Timeout
    } else if e.is_connect() {
        RetrievalError::Unavailable(e.to_string())
    } else {
        RetrievalError::RequestFailed(e.to_string())
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievedChunk>, RetrievalError> {
        let response = self
            .client
            .post(&self.url)
            .json(&SearchRequest {
                query,
                top_k,
                filter,
            })
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::RequestFailed(format!(
                "HTTP error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body = response
            .json::<SearchResponse>()
            .await
            .map_err(|e| RetrievalError::InvalidResponse(e.to_string()))?;
        let mut chunks = match body {
            SearchResponse::Bare(chunks) | SearchResponse::Wrapped { results: chunks } => chunks,
        };
        chunks.truncate(top_k);
        debug!("HTTP search '{}': {} chunks", query, chunks.len());
        Ok(chunks)
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve;

    #[tokio::test]
    async fn test_posts_query_and_decodes_bare_array() {
        let body = r#"[{"content": "일정 문서", "relevance_score": 0.9, "metadata": {"page": 3}}]"#;
        let (url, captured) = serve(vec![(200, body.to_string())]).await;

        let retriever = HttpRetriever::new(format!("{}/search", url));
        let chunks = retriever.search("일정", 3, None).await.unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].relevance_score, 0.9);
        let requests = captured.lock().unwrap();
        assert_eq!(requests[0].request_line, "POST /search HTTP/1.1");
        let sent: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(sent["query"], "일정");
        assert_eq!(sent["top_k"], 3);
        assert!(sent.get("filter").is_none());
    }

    #[tokio::test]
    async fn test_decodes_wrapped_results_and_truncates() {
        let body = r#"{"results": [{"content": "a", "score": 0.5}, {"content": "b"}]}"#;
        let (url, _) = serve(vec![(200, body.to_string())]).await;
        let chunks = HttpRetriever::new(url).search("q", 1, None).await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].relevance_score, 0.5);
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let (url, _) = serve(vec![(500, "{}".to_string())]).await;
        let result = HttpRetriever::new(url).search("q", 1, None).await;
        assert!(matches!(result, Err(RetrievalError::RequestFailed(_))));
    }

    #[tokio::test]
    async fn test_invalid_body() {
        let (url, _) = serve(vec![(200, r#"{"hits": 3}"#.to_string())]).await;
        let result = HttpRetriever::new(url).search("q", 1, None).await;
        assert!(matches!(result, Err(RetrievalError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let result = HttpRetriever::new(url).search("q", 1, None).await;
        assert!(matches!(result, Err(RetrievalError::Unavailable(_))));
    }
}
