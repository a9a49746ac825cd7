//! Structural response validation and the failure repair table

use crate::core::string::char_len;
use crate::retrieval::keywords::broaden_keywords;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Why a response was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    Empty,
    /// Cut off mid-output, over-long, or the inference call timed out
    Truncated,
    Repetitive,
    Malformed,
    UnableToAnswer,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Empty => "EMPTY",
            FailureKind::Truncated => "TRUNCATED",
            FailureKind::Repetitive => "REPETITIVE",
            FailureKind::Malformed => "MALFORMED",
            FailureKind::UnableToAnswer => "UNABLE_TO_ANSWER",
        }
    }

    /// The query repair for this failure. Total over the enum.
    pub fn repair_action(&self) -> RepairAction {
        match self {
            FailureKind::Empty => RepairAction::AskSpecifically,
            FailureKind::Truncated => RepairAction::Shorten,
            FailureKind::Repetitive => RepairAction::ChangeAngle,
            FailureKind::Malformed => RepairAction::Reformat,
            FailureKind::UnableToAnswer => RepairAction::Broaden,
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Deterministic rewrite of the search query after a failed response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairAction {
    AskSpecifically,
    /// Keep the first few tokens to reduce generation length pressure
    Shorten,
    ChangeAngle,
    Reformat,
    /// Re-extract keywords with a wider stopword list
    Broaden,
}

/// Tokens kept by [`RepairAction::Shorten`]
const SHORTEN_TOKENS: usize = 5;

impl RepairAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepairAction::AskSpecifically => "ask_specifically",
            RepairAction::Shorten => "shorten",
            RepairAction::ChangeAngle => "change_angle",
            RepairAction::Reformat => "reformat",
            RepairAction::Broaden => "broaden",
        }
    }

    pub fn apply(&self, query: &str) -> String {
        match self {
            RepairAction::AskSpecifically => format!("구체적으로 {}에 대해 설명해주세요", query),
            RepairAction::Shorten => {
                let words: Vec<&str> = query.split_whitespace().collect();
                if words.len() > SHORTEN_TOKENS {
                    words[..SHORTEN_TOKENS].join(" ")
                } else {
                    query.to_string()
                }
            }
            RepairAction::ChangeAngle => format!("{} 다른 관점에서", query),
            RepairAction::Reformat => format!("이 질문에 대해 설명해주세요: {}", query),
            RepairAction::Broaden => broaden_keywords(query),
        }
    }
}

/// Outcome of validating one response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub is_valid: bool,
    pub failure: Option<FailureKind>,
    pub suggest_retry: bool,
    pub reason: String,
}

impl ValidationVerdict {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            failure: None,
            suggest_retry: false,
            reason: String::new(),
        }
    }

    pub fn invalid(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            failure: Some(kind),
            suggest_retry: true,
            reason: reason.into(),
        }
    }

    /// An inference timeout is reported as truncation.
    pub fn timed_out() -> Self {
        Self::invalid(FailureKind::Truncated, "inference timed out")
    }
}

/// Thresholds for structural checks. Configuration, not contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    pub max_chars: usize,
    /// Word count below which n-gram repetition is not measured
    pub min_words_for_repetition: usize,
    /// Share of repeated word trigrams that marks a reply repetitive
    pub max_repetition_ratio: f64,
    /// A non-trivial line repeated this often marks a reply repetitive
    pub max_line_repeats: usize,
    /// Minimum share of alphanumeric characters among non-space characters
    pub min_alphanumeric_ratio: f64,
    /// Refusals longer than this are treated as real answers
    pub unable_max_chars: usize,
    pub unable_phrases: Vec<String>,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            max_chars: 8000,
            min_words_for_repetition: 8,
            max_repetition_ratio: 0.5,
            max_line_repeats: 3,
            min_alphanumeric_ratio: 0.3,
            unable_max_chars: 80,
            unable_phrases: [
                "모르겠습니다",
                "답변할 수 없",
                "답변드릴 수 없",
                "알 수 없습니다",
                "i don't know",
                "cannot answer",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Characters a finished sentence may end with: punctuation, closing
/// brackets and quotes, and the common Korean sentence and noun-form endings.
const CLOSING_PUNCTUATION: &[char] = &[
    '.', '!', '?', '。', '…', '~', ')', ']', '"', '\'', '”', '’', '」', '』', '*', '`', '다', '요',
    '죠', '음', '함', '됨', '임',
];
const DANGLING_ENDINGS: &[char] = &[',', ':', '(', '[', '{', '-', '·', '→', '/'];
const RESIDUAL_MARKUP: &[&str] = &["<|", "|>", "<start_of_turn", "<end_of_turn"];

impl ValidationPolicy {
    /// Classify a cleaned response. Checks run from most to least severe.
    pub fn validate(&self, text: &str, _message: &str) -> ValidationVerdict {
        let text = text.trim();
        let chars = char_len(text);

        if chars == 0 {
            return ValidationVerdict::invalid(FailureKind::Empty, "response is empty");
        }
        if let Some(reason) = self.malformed(text) {
            return ValidationVerdict::invalid(FailureKind::Malformed, reason);
        }
        if let Some(reason) = self.repetitive(text) {
            return ValidationVerdict::invalid(FailureKind::Repetitive, reason);
        }
        if let Some(reason) = self.truncated(text, chars) {
            return ValidationVerdict::invalid(FailureKind::Truncated, reason);
        }
        if chars <= self.unable_max_chars {
            let lowered = text.to_lowercase();
            if self
                .unable_phrases
                .iter()
                .any(|p| lowered.contains(&p.to_lowercase()))
            {
                return ValidationVerdict::invalid(
                    FailureKind::UnableToAnswer,
                    "response declines to answer",
                );
            }
        }
        ValidationVerdict::valid()
    }

    fn malformed(&self, text: &str) -> Option<String> {
        if text.matches("```").count() % 2 == 1 {
            return Some("unbalanced code fence".to_string());
        }
        if let Some(marker) = RESIDUAL_MARKUP.iter().find(|m| text.contains(**m)) {
            return Some(format!("residual template markup '{}'", marker));
        }
        let visible: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
        let alphanumeric = visible.iter().filter(|c| c.is_alphanumeric()).count();
        let ratio = alphanumeric as f64 / visible.len() as f64;
        if ratio < self.min_alphanumeric_ratio {
            return Some(format!("mostly symbols ({:.0}% alphanumeric)", ratio * 100.0));
        }
        None
    }

    fn repetitive(&self, text: &str) -> Option<String> {
        let mut line_counts: HashMap<&str, usize> = HashMap::new();
        for line in text.lines().map(str::trim).filter(|l| char_len(l) >= 5) {
            *line_counts.entry(line).or_default() += 1;
        }
        if let Some((_, count)) = line_counts
            .iter()
            .find(|(_, count)| **count >= self.max_line_repeats)
        {
            return Some(format!("a line repeats {} times", count));
        }

        let words: Vec<&str> = text.split_whitespace().collect();
        if words.len() < self.min_words_for_repetition {
            return None;
        }
        let trigrams: Vec<&[&str]> = words.windows(3).collect();
        let distinct: HashSet<&[&str]> = trigrams.iter().copied().collect();
        let repetition = 1.0 - distinct.len() as f64 / trigrams.len() as f64;
        if repetition >= self.max_repetition_ratio {
            return Some(format!("{:.0}% of trigrams repeat", repetition * 100.0));
        }
        None
    }

    fn truncated(&self, text: &str, chars: usize) -> Option<String> {
        if chars > self.max_chars {
            return Some(format!("response exceeds {} characters", self.max_chars));
        }
        let last = text.chars().last()?;
        if DANGLING_ENDINGS.contains(&last) {
            return Some(format!("response ends with '{}'", last));
        }
        if CLOSING_PUNCTUATION.contains(&last) || ends_with_list_item(text) {
            return None;
        }
        Some(format!("response stops mid-sentence at '{}'", last))
    }
}

/// Bullets, numbered items and table rows need no closing punctuation.
fn ends_with_list_item(text: &str) -> bool {
    let Some(line) = text.lines().last().map(str::trim) else {
        return false;
    };
    if line.starts_with('|') && line.ends_with('|') {
        return true;
    }
    if ["- ", "* ", "• "].iter().any(|b| line.starts_with(b)) {
        return true;
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    digits > 0 && (line[digits..].starts_with(". ") || line[digits..].starts_with(") "))
}
