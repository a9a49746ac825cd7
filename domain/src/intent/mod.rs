//! Intent routing
//!
//! Classification happens twice per run:
//!
//! 1. **Coarse** (before retrieval): only short, unmistakable greetings are
//!    `Casual`; everything else is `Uncertain` and goes to retrieval.
//! 2. **Final** (after retrieval): `PmsQuery` when any chunk survived,
//!    otherwise `General`. The domain decision is made from evidence.

use crate::core::string::char_len;
use crate::retrieval::RetrievedChunk;
use serde::{Deserialize, Serialize};

/// Intent of a user message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Greeting, thanks or apology; answered with a canned reply
    Casual,
    /// Not yet known; retrieval decides
    Uncertain,
    /// In-domain question backed by retrieved chunks
    PmsQuery,
    /// No supporting chunks were found
    General,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Casual => "casual",
            Intent::Uncertain => "uncertain",
            Intent::PmsQuery => "pms_query",
            Intent::General => "general",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Greeting detector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentRouter {
    /// Messages at or above this many characters are never casual
    pub max_casual_chars: usize,
    pub casual_patterns: Vec<String>,
}

impl Default for IntentRouter {
    fn default() -> Self {
        Self {
            max_casual_chars: 10,
            casual_patterns: [
                "안녕", "고마워", "감사", "미안", "죄송", "잘가", "반가", "ㅎㅎ", "ㅋㅋ", "ㄱㅅ",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl IntentRouter {
    /// `Casual` only for a short message containing a greeting pattern.
    ///
    /// Treating a real question as casual skips retrieval entirely, so the
    /// bar is deliberately strict.
    pub fn classify_coarse(&self, message: &str) -> Intent {
        if char_len(message) >= self.max_casual_chars {
            return Intent::Uncertain;
        }
        let lowered = message.to_lowercase();
        if self
            .casual_patterns
            .iter()
            .any(|p| lowered.contains(&p.to_lowercase()))
        {
            Intent::Casual
        } else {
            Intent::Uncertain
        }
    }

    /// Re-classify from retrieval evidence.
    pub fn classify_final(&self, chunks: &[RetrievedChunk]) -> Intent {
        if chunks.is_empty() {
            Intent::General
        } else {
            Intent::PmsQuery
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_greetings_are_casual() {
        let router = IntentRouter::default();
        assert_eq!(router.classify_coarse("안녕하세요"), Intent::Casual);
        assert_eq!(router.classify_coarse("안녕하세요!"), Intent::Casual);
        assert_eq!(router.classify_coarse("고마워요"), Intent::Casual);
        assert_eq!(router.classify_coarse("ㅋㅋ"), Intent::Casual);
    }

    #[test]
    fn test_long_messages_are_never_casual() {
        let router = IntentRouter::default();
        assert_eq!(
            router.classify_coarse("안녕하세요 프로젝트 일정 알려주세요"),
            Intent::Uncertain
        );
        // exactly 10 characters
        assert_eq!(router.classify_coarse("감사합니다 일정은?"), Intent::Uncertain);
    }

    #[test]
    fn test_short_non_greeting_is_uncertain() {
        let router = IntentRouter::default();
        assert_eq!(router.classify_coarse("일정?"), Intent::Uncertain);
        assert_eq!(router.classify_coarse("수고하셨습니다"), Intent::Uncertain);
    }

    #[test]
    fn test_classify_final() {
        let router = IntentRouter::default();
        assert_eq!(router.classify_final(&[]), Intent::General);
        assert_eq!(
            router.classify_final(&[RetrievedChunk::new("일정", 0.9)]),
            Intent::PmsQuery
        );
    }

    #[test]
    fn test_intent_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Intent::PmsQuery).unwrap(), r#""pms_query""#);
    }
}
