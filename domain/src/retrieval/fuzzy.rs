//! Fuzzy term matching between query keywords and document vocabulary.

use std::collections::BTreeSet;

/// Shortest and longest candidate term, in characters
const MIN_TERM_CHARS: usize = 2;
const MAX_TERM_CHARS: usize = 20;

/// Longest n-gram (in words) considered as a candidate term
const MAX_NGRAM_WORDS: usize = 3;

/// How many candidates each keyword may contribute before thresholding
const MATCHES_PER_KEYWORD: usize = 3;

/// Normalized indel similarity in `[0, 100]`.
///
/// `100 * 2 * LCS(a, b) / (|a| + |b|)`, computed over characters. Two empty
/// strings are identical.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }

    // Single-row LCS table
    let mut row = vec![0usize; b.len() + 1];
    for &ca in &a {
        let mut diagonal = 0;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }
    let lcs = row[b.len()];
    100.0 * (2 * lcs) as f64 / total as f64
}

/// All 1..=3 word n-grams of the documents whose length is 2..=20 chars.
pub fn candidate_terms<S: AsRef<str>>(documents: &[S]) -> BTreeSet<String> {
    let mut terms = BTreeSet::new();
    for doc in documents {
        let words: Vec<&str> = doc.as_ref().split_whitespace().collect();
        for start in 0..words.len() {
            for n in 1..=MAX_NGRAM_WORDS {
                if start + n > words.len() {
                    break;
                }
                let term = words[start..start + n].join(" ");
                let len = term.chars().count();
                if (MIN_TERM_CHARS..=MAX_TERM_CHARS).contains(&len) {
                    terms.insert(term);
                }
            }
        }
    }
    terms
}

/// A document term that resembles a query keyword
#[derive(Debug, Clone, PartialEq)]
pub struct TermMatch {
    pub term: String,
    pub keyword: String,
    pub score: f64,
}

/// Document terms similar to `keywords`, best first, one entry per term.
///
/// A candidate equal to its keyword (ignoring case) is skipped: the point is
/// to discover how the documents phrase a concept, not to echo the query.
pub fn similar_terms(
    keywords: &[String],
    candidates: &BTreeSet<String>,
    threshold: f64,
) -> Vec<TermMatch> {
    let mut matches: Vec<TermMatch> = Vec::new();

    for keyword in keywords {
        let mut scored: Vec<(&String, f64)> = candidates
            .iter()
            .map(|term| (term, ratio(keyword, term)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        for (term, score) in scored.into_iter().take(MATCHES_PER_KEYWORD) {
            if score < threshold || term.to_lowercase() == keyword.to_lowercase() {
                continue;
            }
            match matches.iter_mut().find(|m| &m.term == term) {
                Some(existing) if existing.score < score => {
                    existing.score = score;
                    existing.keyword = keyword.clone();
                }
                Some(_) => {}
                None => matches.push(TermMatch {
                    term: term.clone(),
                    keyword: keyword.clone(),
                    score,
                }),
            }
        }
    }

    // Stable: ties keep keyword order, then lexical candidate order
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_identical_and_disjoint() {
        assert_eq!(ratio("일정", "일정"), 100.0);
        assert_eq!(ratio("abc", "xyz"), 0.0);
        assert_eq!(ratio("", ""), 100.0);
        assert_eq!(ratio("a", ""), 0.0);
    }

    #[test]
    fn test_ratio_partial_overlap() {
        // LCS("일정표", "일정") = 2 -> 100 * 4 / 5
        assert!((ratio("일정표", "일정") - 80.0).abs() < 1e-9);
        // LCS("kitten", "sitting") = 4 -> 100 * 8 / 13
        assert!((ratio("kitten", "sitting") - 800.0 / 13.0).abs() < 1e-9);
    }

    #[test]
    fn test_ratio_is_symmetric() {
        assert_eq!(ratio("스프린트", "스프린트 계획"), ratio("스프린트 계획", "스프린트"));
    }

    #[test]
    fn test_candidate_terms_ngrams_and_length_bounds() {
        let terms = candidate_terms(&["a 일정표 확정 내용입니다"]);
        assert!(terms.contains("일정표"));
        assert!(terms.contains("일정표 확정"));
        assert!(terms.contains("a 일정표 확정"));
        // single character terms are excluded
        assert!(!terms.contains("a"));

        let long = "x".repeat(21);
        assert!(candidate_terms(&[long.as_str()]).is_empty());
    }

    #[test]
    fn test_similar_terms_excludes_exact_keyword() {
        let candidates = candidate_terms(&["일정 일정표 예산"]);
        let keywords = vec!["일정".to_string()];
        let matches = similar_terms(&keywords, &candidates, 70.0);

        assert!(!matches.is_empty());
        assert_eq!(matches[0].term, "일정표");
        assert!(matches.iter().all(|m| m.term != "일정"));
    }

    #[test]
    fn test_similar_terms_threshold() {
        let candidates = candidate_terms(&["예산 보고서"]);
        let keywords = vec!["일정".to_string()];
        assert!(similar_terms(&keywords, &candidates, 70.0).is_empty());
    }
}
