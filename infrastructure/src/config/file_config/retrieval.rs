//! Retrieval configuration from TOML (`[retrieval]` section)

use ragloop_application::RetrievalParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw retrieval configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRetrievalConfig {
    pub top_k: usize,
    pub min_relevance_score: f64,
    pub max_query_retries: u32,
    /// Similarity on a 0-100 scale
    pub fuzzy_match_threshold: f64,
    pub timeout_seconds: u64,
}

impl Default for FileRetrievalConfig {
    fn default() -> Self {
        let params = RetrievalParams::default();
        Self {
            top_k: params.top_k,
            min_relevance_score: params.min_relevance_score,
            max_query_retries: params.max_query_retries,
            fuzzy_match_threshold: params.fuzzy_match_threshold,
            timeout_seconds: params.timeout.as_secs(),
        }
    }
}

impl FileRetrievalConfig {
    pub fn to_params(&self) -> RetrievalParams {
        RetrievalParams::default()
            .with_top_k(self.top_k)
            .with_min_relevance_score(self.min_relevance_score)
            .with_max_query_retries(self.max_query_retries)
            .with_fuzzy_match_threshold(self.fuzzy_match_threshold)
            .with_timeout(Duration::from_secs(self.timeout_seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_application_defaults() {
        assert_eq!(
            FileRetrievalConfig::default().to_params(),
            RetrievalParams::default()
        );
    }

    #[test]
    fn test_partial_section() {
        let config: FileRetrievalConfig = toml::from_str("top_k = 8\ntimeout_seconds = 3").unwrap();
        let params = config.to_params();
        assert_eq!(params.top_k, 8);
        assert_eq!(params.timeout, Duration::from_secs(3));
        assert_eq!(params.max_query_retries, 4);
    }
}
