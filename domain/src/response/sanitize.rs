//! Response sanitization pipeline
//!
//! Raw model output passes through pure text stages in a fixed order:
//!
//! 1. [`strip_control_tokens`]: chat-template tokens; cut at a second turn
//! 2. [`strip_role_markers`]: `assistant:` prefixes and bare role lines
//! 3. [`strip_meta_blocks`]: triple-quoted blocks
//! 4. [`strip_echo_lines`]: leading model-name, separator and restated
//!    question lines, and trailing meta commentary
//! 5. [`strip_instruction_echoes`]: fixed catalogue of prompt phrases
//! 6. [`sanitize_characters`]: ASCII control characters (non-ASCII kept)
//! 7. [`trim_dangling_tail`]: half-emitted tokens at the end
//!
//! Each stage is independent and safe to run on already-clean text.

use regex::Regex;
use std::sync::LazyLock;

/// Tokens that open or close a turn in the supported chat templates
const TURN_TOKENS: &[&str] = &[
    "<|im_start|>",
    "<|im_end|>",
    "<start_of_turn>",
    "<end_of_turn>",
    "</s>",
];

/// Fragments left behind when a turn token is cut mid-stream
const PARTIAL_TOKENS: &[&str] = &["|im_end|>", "<|im_end", "|im_start|>", "<|im_start"];

const THINK_TAGS: &[&str] = &["<think>", "</think>"];

const ROLE_WORDS: &[&str] = &["assistant", "system", "user", "model"];


static TRIPLE_SINGLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'''[\s\S]*?'''").expect("valid regex"));
static TRIPLE_DOUBLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""""[\s\S]*?""""#).expect("valid regex"));
static SEPARATOR_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:=+|-{3,})$").expect("valid regex"));
/// What may follow a model name on a header line: versions, sizes, "모델"
static HEADER_TAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\s*v?\d+(?:\.\d+)*b?)*(?:\s*(?:모델|model))?[\s.:：!()\-]*$")
        .expect("valid regex")
});
static TRAILING_META: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)제공된 정보로.*?답변했습니다|이제 사용자.*?요청대로|요청.*?한국어로.*?제공|완벽하게 답변했습니다")
        .expect("valid regex")
});
static INLINE_META: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)제공된 정보로.*?답변했습니다",
        r"|이제 사용자님?의 요청대로.*?제공",
        r"|사용자님?의 요청대로.*?설명.*?제공",
        r"|요청(?:대로|하신).*?한국어로.*?제공",
    ))
    .expect("valid regex")
});
static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Prompt phrases a model sometimes echoes back verbatim
pub fn default_instruction_echoes() -> Vec<String> {
    [
        "현재 질문에 대한 답변을 작성해 주세요",
        "현재 질문에 대한 답변을 작성해주세요",
        "답변을 작성해 주세요",
        "답변을 작성해주세요",
        "Please write an answer",
        "Write an answer",
        "답변은 3~6문장",
        "관련 문서:",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Stage 1: drop leading turn tokens, cut at the next one, remove leftovers.
pub fn strip_control_tokens(text: &str) -> String {
    let mut rest = text.trim_start();
    'leading: loop {
        for token in TURN_TOKENS {
            if let Some(stripped) = rest.strip_prefix(token) {
                rest = stripped.trim_start();
                continue 'leading;
            }
        }
        break;
    }

    let cut = TURN_TOKENS
        .iter()
        .chain(PARTIAL_TOKENS)
        .filter_map(|token| rest.find(token))
        .min()
        .unwrap_or(rest.len());

    let mut out = rest[..cut].to_string();
    for tag in THINK_TAGS {
        out = out.replace(tag, "");
    }
    out
}

fn starts_with_role_word(text: &str) -> Option<usize> {
    for role in ROLE_WORDS {
        if text
            .get(..role.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(role))
        {
            let next = text[role.len()..].chars().next();
            if next.is_none_or(|c| c.is_whitespace() || c == ':' || c == '：') {
                return Some(role.len());
            }
        }
    }
    None
}

/// Stage 2: remove role labels the model emitted as text.
pub fn strip_role_markers(text: &str) -> String {
    let mut lines = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        let lowered = trimmed.to_lowercase();

        if ROLE_WORDS.contains(&lowered.as_str()) {
            continue;
        }
        if trimmed.starts_with("사용자:") || trimmed.starts_with("사용자：") {
            continue;
        }
        if lowered.starts_with("user:") || lowered.starts_with("system:") {
            continue;
        }
        if let Some(len) = starts_with_role_word(trimmed)
            && trimmed[len..].trim_start().starts_with([':', '：'])
        {
            let after = trimmed[len..].trim_start();
            let content = after
                .trim_start_matches([':', '：'])
                .trim_start();
            if !content.is_empty() {
                lines.push(content.to_string());
            }
            continue;
        }
        lines.push(line.to_string());
    }

    let joined = lines.join("\n");
    let trimmed = joined.trim_start();
    // "model\n..." or "assistant ..." at the very start
    match starts_with_role_word(trimmed) {
        Some(len) => trimmed[len..].trim_start().to_string(),
        None => trimmed.to_string(),
    }
}

/// Stage 3: remove triple-quoted blocks and stray delimiters.
pub fn strip_meta_blocks(text: &str) -> String {
    let out = TRIPLE_SINGLE.replace_all(text, "");
    let out = TRIPLE_DOUBLE.replace_all(&out, "");
    let mut out = out.trim();
    for delimiter in ["'''", "\"\"\""] {
        out = out.strip_prefix(delimiter).unwrap_or(out).trim_start();
        out = out.strip_suffix(delimiter).unwrap_or(out).trim_end();
    }
    out.to_string()
}

fn is_model_header(lowered: &str, markers: &[String]) -> bool {
    markers.iter().any(|marker| {
        lowered
            .strip_prefix(marker.as_str())
            .is_some_and(|tail| HEADER_TAIL.is_match(tail))
    })
}

fn is_restated_question(line: &str, message: &str) -> bool {
    let normalize = |s: &str| s.trim().trim_end_matches(['?', '？', '.', ' ']).to_string();
    let message = normalize(message);
    !message.is_empty() && normalize(line) == message
}

/// Stage 4: drop header lines restating the model or the question, and
/// trailing meta commentary.
///
/// Never removes every line: if all lines look like headers the text is
/// returned unchanged.
pub fn strip_echo_lines(text: &str, model_markers: &[&str], message: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let markers: Vec<String> = model_markers.iter().map(|m| m.to_lowercase()).collect();

    let mut start = 0;
    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        let header = trimmed.is_empty()
            || SEPARATOR_LINE.is_match(trimmed)
            || is_model_header(&trimmed.to_lowercase(), &markers)
            || is_restated_question(trimmed, message);
        if header {
            start = i + 1;
        } else {
            break;
        }
    }
    if start >= lines.len() {
        return text.trim().to_string();
    }

    let mut end = lines.len();
    for i in (start..lines.len()).rev() {
        if TRAILING_META.is_match(lines[i]) {
            end = i;
            break;
        }
    }
    if end == start {
        end = lines.len();
    }

    lines[start..end].join("\n").trim().to_string()
}

/// Stage 5: remove prompt phrases the model echoed back.
pub fn strip_instruction_echoes(text: &str, phrases: &[String]) -> String {
    let mut out = INLINE_META.replace_all(text, "").into_owned();
    for phrase in phrases {
        if phrase.is_empty() {
            continue;
        }
        if let Ok(re) = Regex::new(&format!("(?i){}", regex::escape(phrase))) {
            out = re.replace_all(&out, "").into_owned();
        }
    }
    out.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Stage 6: drop ASCII control characters except newline, tab and carriage
/// return. Every non-ASCII character is preserved so the reply's script
/// survives intact.
pub fn sanitize_characters(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_ascii_control() || matches!(c, '\n' | '\t' | '\r'))
        .collect()
}

/// Byte offset where a trailing prefix of a known turn token begins.
fn partial_token_start(text: &str) -> Option<usize> {
    TURN_TOKENS
        .iter()
        .chain(PARTIAL_TOKENS)
        .chain(THINK_TAGS)
        .filter_map(|token| {
            (2..token.len())
                .rev()
                .find(|&k| text.ends_with(&token[..k]))
                .map(|k| text.len() - k)
        })
        .min()
}

/// Stage 7: trim half-emitted tokens such as `<|im_e` or a lone `|` at the end.
///
/// Only prefixes of the known turn tokens are cut, so text like `PM|QA` or a
/// closing table row survives.
pub fn trim_dangling_tail(text: &str) -> String {
    let mut out = text.trim_end();
    loop {
        if let Some(start) = partial_token_start(out) {
            out = out[..start].trim_end();
            continue;
        }
        let table_row = out
            .lines()
            .last()
            .is_some_and(|line| line.trim_start().starts_with('|'));
        match out.strip_suffix(['<', '|']) {
            Some(stripped) if !table_row => out = stripped.trim_end(),
            _ => break,
        }
    }
    out.to_string()
}

/// Runs every stage in order.
#[derive(Debug, Clone)]
pub struct ResponseSanitizer {
    model_markers: Vec<String>,
    instruction_echoes: Vec<String>,
}

impl ResponseSanitizer {
    pub fn new(model_markers: Vec<String>) -> Self {
        Self {
            model_markers,
            instruction_echoes: default_instruction_echoes(),
        }
    }

    pub fn with_instruction_echoes(mut self, phrases: Vec<String>) -> Self {
        self.instruction_echoes = phrases;
        self
    }

    pub fn clean(&self, raw: &str, message: &str) -> String {
        let markers: Vec<&str> = self.model_markers.iter().map(String::as_str).collect();

        let text = strip_control_tokens(raw);
        let text = strip_role_markers(&text);
        let text = strip_meta_blocks(&text);
        let text = strip_echo_lines(&text, &markers, message);
        let text = strip_instruction_echoes(&text, &self.instruction_echoes);
        let text = sanitize_characters(&text);
        let text = trim_dangling_tail(&text);
        BLANK_RUN.replace_all(&text, "\n\n").trim().to_string()
    }
}
