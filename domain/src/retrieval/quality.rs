//! Retrieval quality gate
//!
//! Scores a retrieved chunk set against the query with two signals:
//!
//! | Signal   | Condition                        | Default weight |
//! |----------|----------------------------------|----------------|
//! | coverage | `chunks >= 3`                    | 0.4            |
//! | coverage | `0 < chunks < 3`                 | 0.2            |
//! | lexical  | `match_ratio >= 0.5`             | 0.6            |
//! | lexical  | `0 < match_ratio < 0.5`          | 0.3            |
//!
//! The weights are empirically tuned, so every one of them is configuration.

use super::chunk::RetrievedChunk;
use super::keywords::extract_keywords;
use serde::{Deserialize, Serialize};

/// Weights and thresholds of the quality gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityPolicy {
    /// Chunk count that earns the full coverage weight
    pub full_coverage_chunks: usize,
    pub full_coverage_weight: f64,
    pub partial_coverage_weight: f64,
    /// Fraction of chunks mentioning a keyword that earns the full lexical weight
    pub keyword_match_good_ratio: f64,
    pub good_match_weight: f64,
    pub partial_match_weight: f64,
    /// Minimum score to stop refining
    pub quality_threshold: f64,
}

impl Default for QualityPolicy {
    fn default() -> Self {
        Self {
            full_coverage_chunks: 3,
            full_coverage_weight: 0.4,
            partial_coverage_weight: 0.2,
            keyword_match_good_ratio: 0.5,
            good_match_weight: 0.6,
            partial_match_weight: 0.3,
            quality_threshold: 0.6,
        }
    }
}

/// Score and human-readable reasons for one assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityVerdict {
    pub score: f64,
    pub reasons: Vec<String>,
}

/// Routing signal produced by the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityDecision {
    Proceed,
    Refine,
}

impl QualityPolicy {
    pub fn with_quality_threshold(mut self, threshold: f64) -> Self {
        self.quality_threshold = threshold;
        self
    }

    pub fn with_keyword_match_good_ratio(mut self, ratio: f64) -> Self {
        self.keyword_match_good_ratio = ratio;
        self
    }

    fn coverage(&self, chunk_count: usize) -> f64 {
        if chunk_count >= self.full_coverage_chunks {
            self.full_coverage_weight
        } else if chunk_count > 0 {
            self.partial_coverage_weight
        } else {
            0.0
        }
    }

    fn lexical(&self, match_ratio: f64) -> f64 {
        if match_ratio >= self.keyword_match_good_ratio {
            self.good_match_weight
        } else if match_ratio > 0.0 {
            self.partial_match_weight
        } else {
            0.0
        }
    }

    /// Score for a chunk count and keyword match ratio, clamped to `[0, 1]`.
    pub fn score(&self, chunk_count: usize, match_ratio: f64) -> f64 {
        let lexical = if chunk_count > 0 {
            self.lexical(match_ratio)
        } else {
            0.0
        };
        (self.coverage(chunk_count) + lexical).clamp(0.0, 1.0)
    }

    /// Assess `chunks` against the keywords of `query`.
    pub fn assess(&self, chunks: &[RetrievedChunk], query: &str) -> QualityVerdict {
        let mut reasons = Vec::new();
        let count = chunks.len();

        if count >= self.full_coverage_chunks {
            reasons.push(format!("sufficient chunks ({})", count));
        } else if count > 0 {
            reasons.push(format!("some chunks found ({})", count));
        } else {
            reasons.push("no chunks".to_string());
        }

        let mut match_ratio = 0.0;
        if count > 0 {
            let keywords = extract_keywords(query);
            let matched = chunks.iter().filter(|c| c.mentions_any(&keywords)).count();
            match_ratio = matched as f64 / count as f64;

            let percent = (match_ratio * 100.0).round();
            if match_ratio >= self.keyword_match_good_ratio {
                reasons.push(format!("keyword match good ({}%)", percent));
            } else if match_ratio > 0.0 {
                reasons.push(format!("partial keyword match ({}%)", percent));
            } else {
                reasons.push("keyword match failed".to_string());
            }
        }

        QualityVerdict {
            score: self.score(count, match_ratio),
            reasons,
        }
    }

    /// Proceed when the evidence is good enough or the retry budget is spent.
    ///
    /// The retry ceiling is what bounds the refinement cycle.
    pub fn decide(&self, score: f64, retry_count: u32, max_retries: u32) -> QualityDecision {
        if score >= self.quality_threshold || retry_count >= max_retries {
            QualityDecision::Proceed
        } else {
            QualityDecision::Refine
        }
    }
}
