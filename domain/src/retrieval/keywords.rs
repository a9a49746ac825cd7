//! Keyword extraction for Korean/English queries.
//!
//! Three extractors share one shape (split on whitespace, trim punctuation,
//! drop stopwords, strip one trailing particle) but differ in their word
//! lists and casing because each feeds a different consumer:
//!
//! - [`extract_keywords`]: quality assessment and query refinement
//! - [`filter_tokens`]: the retrieval gateway's lexical post-filter
//! - [`broaden_keywords`]: repair of an "unable to answer" response

use crate::core::string::char_len;

const PUNCTUATION: &[char] = &[
    '.', ',', '!', '?', ';', ':', '(', ')', '[', ']', '{', '}', '"', '\'',
];

const KEYWORD_STOPWORDS: &[&str] = &[
    "이", "가", "은", "는", "을", "를", "에", "에서", "로", "으로", "의", "도", "만", "까지",
    "부터", "께", "에게", "한테", "뭐", "뭐야", "뭔가", "어떻게", "무엇", "대해", "알려줘",
    "알려주세요", "설명", "해줘", "해주세요", "좀", "요", "야",
];

const KEYWORD_PARTICLES: &[&str] = &[
    "에서", "으로", "에게", "까지", "부터", "에", "를", "을", "이", "가", "은", "는", "의", "도",
    "만",
];

const FILTER_STOPWORDS: &[&str] = &[
    "프로젝트", "대해", "알려줘", "알려", "해주세요", "해줘", "설명", "정보", "현황에", "현황을",
    "현황은",
];

const FILTER_PARTICLES: &[&str] = &[
    "에서", "에게", "부터", "까지", "으로써", "으로서", "으로", "과", "와", "을", "를", "이", "가",
    "에", "의", "도", "만", "은", "는", "께",
];

const BROADEN_STOPWORDS: &[&str] = &[
    "이", "가", "은", "는", "을", "를", "에", "에서", "로", "으로", "의", "도", "만", "까지",
    "부터", "께", "에게", "한테", "와", "과", "또는", "그리고", "하지만", "그러나", "따라서",
    "그래서", "혹은", "또한",
];

const BROADEN_PARTICLES: &[&str] = &[
    "에서", "에게", "부터", "까지", "으로써", "으로서", "으로", "과", "와", "을", "를", "이", "가",
    "에", "의", "도", "만", "은", "는",
];

fn trim_punctuation(word: &str) -> &str {
    word.trim_matches(PUNCTUATION)
}

/// Strip the first matching particle when at least `min_stem` characters remain.
fn strip_particle<'a>(word: &'a str, particles: &[&str], min_stem: usize) -> &'a str {
    for particle in particles {
        if let Some(stem) = word.strip_suffix(particle)
            && char_len(stem) >= min_stem
        {
            return stem;
        }
    }
    word
}

/// Core keywords of a query, original casing preserved.
///
/// Used to score chunk overlap and to build the keyword-bag refinement.
pub fn extract_keywords(query: &str) -> Vec<String> {
    let mut keywords = Vec::new();
    for raw in query.split_whitespace() {
        let word = trim_punctuation(raw);
        if char_len(word) < 2 || KEYWORD_STOPWORDS.contains(&word.to_lowercase().as_str()) {
            continue;
        }
        let word = strip_particle(word, KEYWORD_PARTICLES, 2);
        if char_len(word) >= 2 {
            keywords.push(word.to_string());
        }
    }
    keywords
}

/// Lowercased tokens used to post-filter retrieved chunks.
///
/// Drops domain-generic words ("프로젝트", "정보") that would match every
/// chunk and so carry no filtering signal.
pub fn filter_tokens(query: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for raw in query.split_whitespace() {
        let token = trim_punctuation(raw).to_lowercase();
        if char_len(&token) < 2 {
            continue;
        }
        let token = strip_particle(&token, FILTER_PARTICLES, 1);
        if token.is_empty() || FILTER_STOPWORDS.contains(&token) {
            continue;
        }
        if char_len(token) >= 2 {
            tokens.push(token.to_string());
        }
    }
    tokens
}

/// Broadened keyword query, falling back to the input when nothing survives.
///
/// Uses a wider stopword list that also removes conjunctions, so a long
/// compound question collapses to its content words.
pub fn broaden_keywords(query: &str) -> String {
    let mut keywords = Vec::new();
    for raw in query.split_whitespace() {
        let word = trim_punctuation(raw).to_lowercase();
        let word = strip_particle(&word, BROADEN_PARTICLES, 1);
        if !word.is_empty() && !BROADEN_STOPWORDS.contains(&word) && char_len(word) > 1 {
            keywords.push(word.to_string());
        }
    }
    if keywords.is_empty() {
        query.to_string()
    } else {
        keywords.join(" ")
    }
}
