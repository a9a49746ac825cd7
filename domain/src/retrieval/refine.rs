//! Query refinement
//!
//! Strategy selection is indexed by retry count, not by score, so a given
//! query and corpus always refine the same way:
//!
//! | retry | strategy                                                        |
//! |-------|-----------------------------------------------------------------|
//! | 0     | keyword bag of the original query                               |
//! | 1     | best fuzzy-matched term from the previous attempt's chunks      |
//! | 2+    | keyword bag again (no new strategies)                           |

use super::chunk::RetrievedChunk;
use super::fuzzy::{candidate_terms, similar_terms};
use super::keywords::extract_keywords;
use serde::{Deserialize, Serialize};

/// Which strategy produced a refined query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefinementStrategy {
    /// Space-joined keywords of the original query
    KeywordBag,
    /// A term found in the retrieved corpus
    CorpusTerm,
    /// Corpus search found nothing; keyword bag used instead
    KeywordBagFallback,
    /// No keywords survived; the current query is kept
    Unchanged,
}

impl RefinementStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefinementStrategy::KeywordBag => "keyword_bag",
            RefinementStrategy::CorpusTerm => "corpus_term",
            RefinementStrategy::KeywordBagFallback => "keyword_bag_fallback",
            RefinementStrategy::Unchanged => "unchanged",
        }
    }
}

/// Output of one refinement step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Refinement {
    pub query: String,
    pub strategy: RefinementStrategy,
    /// Terms the new query was built from
    pub extracted_terms: Vec<String>,
}

/// Pure query-text transformation; never talks to a retriever.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRefiner {
    /// Minimum similarity (0-100) for a corpus term to be used
    pub fuzzy_match_threshold: f64,
}

impl Default for QueryRefiner {
    fn default() -> Self {
        Self {
            fuzzy_match_threshold: 70.0,
        }
    }
}

impl QueryRefiner {
    pub fn new(fuzzy_match_threshold: f64) -> Self {
        Self {
            fuzzy_match_threshold,
        }
    }

    /// Produce the next search query.
    ///
    /// `chunks` are the chunks returned by the attempt being refined.
    pub fn refine(
        &self,
        original_query: &str,
        current_query: &str,
        retry_count: u32,
        chunks: &[RetrievedChunk],
    ) -> Refinement {
        if retry_count == 1 {
            if let Some(refinement) = self.corpus_term(original_query, chunks) {
                return refinement;
            }
            return Self::keyword_bag(
                original_query,
                current_query,
                RefinementStrategy::KeywordBagFallback,
            );
        }
        Self::keyword_bag(original_query, current_query, RefinementStrategy::KeywordBag)
    }

    fn keyword_bag(
        original_query: &str,
        current_query: &str,
        strategy: RefinementStrategy,
    ) -> Refinement {
        let keywords = extract_keywords(original_query);
        if keywords.is_empty() {
            return Refinement {
                query: current_query.to_string(),
                strategy: RefinementStrategy::Unchanged,
                extracted_terms: Vec::new(),
            };
        }
        Refinement {
            query: keywords.join(" "),
            strategy,
            extracted_terms: keywords,
        }
    }

    fn corpus_term(&self, original_query: &str, chunks: &[RetrievedChunk]) -> Option<Refinement> {
        let keywords = extract_keywords(original_query);
        if keywords.is_empty() || chunks.is_empty() {
            return None;
        }
        let documents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let candidates = candidate_terms(&documents);
        let matches = similar_terms(&keywords, &candidates, self.fuzzy_match_threshold);
        let best = matches.first()?;

        Some(Refinement {
            query: best.term.clone(),
            strategy: RefinementStrategy::CorpusTerm,
            extracted_terms: matches.iter().take(3).map(|m| m.term.clone()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUERY: &str = "프로젝트 일정이 어떻게 되나요?";

    #[test]
    fn test_first_refinement_is_keyword_bag() {
        let refinement = QueryRefiner::default().refine(QUERY, QUERY, 0, &[]);
        assert_eq!(refinement.query, "프로젝트 일정 되나요");
        assert_eq!(refinement.strategy, RefinementStrategy::KeywordBag);
        assert_eq!(refinement.extracted_terms.len(), 3);
    }

    #[test]
    fn test_second_refinement_uses_corpus_term() {
        let chunks = vec![
            RetrievedChunk::new("전체 일정표 는 3월에 확정됩니다", 0.5),
            RetrievedChunk::new("예산 보고", 0.4),
        ];
        let refinement = QueryRefiner::default().refine(QUERY, "프로젝트 일정 되나요", 1, &chunks);
        assert_eq!(refinement.strategy, RefinementStrategy::CorpusTerm);
        assert_eq!(refinement.query, "일정표");
        assert!(chunks[0].content.contains(&refinement.query));
    }

    #[test]
    fn test_second_refinement_falls_back_without_match() {
        let chunks = vec![RetrievedChunk::new("예산 보고", 0.4)];
        let refinement = QueryRefiner::default().refine(QUERY, "x", 1, &chunks);
        assert_eq!(refinement.strategy, RefinementStrategy::KeywordBagFallback);
        assert_eq!(refinement.query, "프로젝트 일정 되나요");
    }

    #[test]
    fn test_later_refinements_repeat_keyword_bag() {
        let refinement = QueryRefiner::default().refine(QUERY, "일정표", 3, &[]);
        assert_eq!(refinement.strategy, RefinementStrategy::KeywordBag);
        assert_eq!(refinement.query, "프로젝트 일정 되나요");
    }

    #[test]
    fn test_no_keywords_keeps_current_query() {
        let refinement = QueryRefiner::default().refine("뭐 좀", "뭐 좀", 0, &[]);
        assert_eq!(refinement.strategy, RefinementStrategy::Unchanged);
        assert_eq!(refinement.query, "뭐 좀");
    }
}
