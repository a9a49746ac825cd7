//! Retriever port
//!
//! Defines the interface to the search collaborator (vector store, search
//! service, in-memory corpus).

use async_trait::async_trait;
use ragloop_domain::{MetadataFilter, RetrievedChunk};
use thiserror::Error;

/// Errors that can occur while searching
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RetrievalError {
    #[error("Retriever unavailable: {0}")]
    Unavailable(String),

    #[error("Search request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid search response: {0}")]
    InvalidResponse(String),

    #[error("Search timed out")]
    Timeout,
}

/// Ranked search over the knowledge collection
///
/// Implementations must accept `filter: None`. Scores only need to be
/// comparable within one collaborator; higher is more relevant.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return at most `top_k` chunks, best first
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievedChunk>, RetrievalError>;

    /// Short name used in logs
    fn name(&self) -> &str {
        "retriever"
    }
}
