//! Retrieval parameters: gateway filtering and refinement loop control.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retrieval and refinement loop control.
///
/// | Field | Default | Used by |
/// |-------|---------|---------|
/// | `top_k` | 5 | gateway |
/// | `min_relevance_score` | 0.3 | gateway |
/// | `max_query_retries` | 4 | quality gate, validation repair |
/// | `fuzzy_match_threshold` | 70 | refiner |
/// | `timeout` | 10s | gateway |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalParams {
    pub top_k: usize,
    /// Chunks scoring below this are dropped.
    pub min_relevance_score: f64,
    /// Global ceiling on retries per run, shared by refinement and repair.
    pub max_query_retries: u32,
    /// Similarity (0-100) a corpus term needs to replace the query.
    pub fuzzy_match_threshold: f64,
    /// Per-call timeout; a timed out search yields no chunks.
    pub timeout: Duration,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_relevance_score: 0.3,
            max_query_retries: 4,
            fuzzy_match_threshold: 70.0,
            timeout: Duration::from_secs(10),
        }
    }
}

impl RetrievalParams {
    // ==================== Builder Methods ====================

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_min_relevance_score(mut self, score: f64) -> Self {
        self.min_relevance_score = score;
        self
    }

    pub fn with_max_query_retries(mut self, max: u32) -> Self {
        self.max_query_retries = max;
        self
    }

    pub fn with_fuzzy_match_threshold(mut self, threshold: f64) -> Self {
        self.fuzzy_match_threshold = threshold;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = RetrievalParams::default();
        assert_eq!(params.top_k, 5);
        assert_eq!(params.min_relevance_score, 0.3);
        assert_eq!(params.max_query_retries, 4);
        assert_eq!(params.fuzzy_match_threshold, 70.0);
    }

    #[test]
    fn test_builder() {
        let params = RetrievalParams::default()
            .with_top_k(10)
            .with_max_query_retries(2)
            .with_timeout(Duration::from_millis(500));

        assert_eq!(params.top_k, 10);
        assert_eq!(params.max_query_retries, 2);
        assert_eq!(params.timeout, Duration::from_millis(500));
    }
}
