//! Reply confidence scoring

use crate::intent::Intent;
use serde::{Deserialize, Serialize};

/// Confidence assigned to a reply, by intent and evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidencePolicy {
    pub casual: f64,
    pub pms_query: f64,
    pub general: f64,
    /// Used when the intent is still unresolved
    pub default: f64,
    pub max_confidence: f64,
    pub boost_per_chunk: f64,
    pub max_boost: f64,
    /// Used for replies produced after validation or inference failed
    pub degraded: f64,
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        Self {
            casual: 0.95,
            pms_query: 0.70,
            general: 0.80,
            default: 0.75,
            max_confidence: 0.95,
            boost_per_chunk: 0.05,
            max_boost: 0.15,
            degraded: 0.30,
        }
    }
}

impl ConfidencePolicy {
    fn base(&self, intent: Intent) -> f64 {
        match intent {
            Intent::Casual => self.casual,
            Intent::PmsQuery => self.pms_query,
            Intent::General => self.general,
            Intent::Uncertain => self.default,
        }
    }

    /// Base confidence for `intent`, boosted per supporting chunk.
    pub fn score(&self, intent: Intent, chunk_count: usize) -> f64 {
        let mut confidence = self.base(intent);
        if chunk_count > 0 {
            let boost = (chunk_count as f64 * self.boost_per_chunk).min(self.max_boost);
            confidence = (confidence + boost).min(self.max_confidence);
        }
        round2(confidence.clamp(0.0, 1.0))
    }

    /// Confidence for a degraded reply; never above the normal score.
    pub fn degraded_score(&self, intent: Intent, chunk_count: usize) -> f64 {
        round2(self.degraded.min(self.score(intent, chunk_count)))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_casual_confidence() {
        assert_eq!(ConfidencePolicy::default().score(Intent::Casual, 0), 0.95);
    }

    #[test]
    fn test_general_without_chunks() {
        assert_eq!(ConfidencePolicy::default().score(Intent::General, 0), 0.80);
    }

    #[test]
    fn test_pms_query_boost_is_capped() {
        let policy = ConfidencePolicy::default();
        assert_eq!(policy.score(Intent::PmsQuery, 1), 0.75);
        assert_eq!(policy.score(Intent::PmsQuery, 2), 0.80);
        assert_eq!(policy.score(Intent::PmsQuery, 3), 0.85);
        assert_eq!(policy.score(Intent::PmsQuery, 10), 0.85);
    }

    #[test]
    fn test_overall_cap() {
        let policy = ConfidencePolicy::default();
        assert_eq!(policy.score(Intent::Casual, 5), 0.95);
    }

    #[test]
    fn test_degraded_is_reduced() {
        let policy = ConfidencePolicy::default();
        let degraded = policy.degraded_score(Intent::PmsQuery, 4);
        assert_eq!(degraded, 0.30);
        assert!(degraded < policy.score(Intent::PmsQuery, 4));
    }
}
