//! Identity guardrail
//!
//! Free-form generation is unreliable about the model's own name, and a
//! hallucinated identity is worse than a fixed sentence. Identity questions
//! are therefore answered from configuration, and generated replies that
//! mention another assistant are replaced wholesale.

use serde::{Deserialize, Serialize};

const DEFAULT_MODEL_NAME: &str = "로컬 LLM";

/// Particles and copulas that may follow a name inside one token
/// ("사라가", "ChatGPT입니다").
const NAME_SUFFIXES: &[&str] = &[
    "이", "가", "은", "는", "을", "를", "의", "와", "과", "도", "만", "로", "으로", "에게", "께서",
    "라고", "이라고", "야", "이야", "예요", "이에요", "입니다", "이며", "님", "씨",
];

/// Static identity of the serving model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityProfile {
    /// Display name used in the canonical sentence
    pub model_name: String,
    /// Answer identity questions without calling the inference engine
    pub short_circuit: bool,
    /// Tokens naming the assistant or a model ("모델", "너", "you")
    pub subject_tokens: Vec<String>,
    /// Tokens asking for a name ("이름", "누구", "name")
    pub name_tokens: Vec<String>,
    /// Names that must never appear in a reply
    pub disallowed_names: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for IdentityProfile {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL_NAME.to_string(),
            short_circuit: true,
            subject_tokens: strings(&[
                "모델", "model", "너는", "너의", "넌", "당신은", "당신의", "you", "your",
            ]),
            name_tokens: strings(&["이름", "name", "누구", "who"]),
            disallowed_names: strings(&[
                "니콜라스", "nicolas", "알렉스", "alex", "사라", "sara", "gpt-4", "gpt4",
                "chatgpt", "claude", "gemini", "palm",
            ]),
        }
    }
}

/// Result of applying the guardrail to a reply
#[derive(Debug, Clone, PartialEq)]
pub struct GuardrailOutcome {
    pub reply: String,
    pub replaced: bool,
}

impl IdentityProfile {
    /// Derive the display name from a model file path.
    pub fn from_model_path(path: &str) -> Self {
        let file = path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(path)
            .to_lowercase();
        let model_name = if file.contains("lfm2") {
            "Llama Forge Model 2 (LFM2)"
        } else if file.contains("gemma") {
            "Gemma 3"
        } else if file.contains("llama") {
            "Llama 기반 모델"
        } else {
            DEFAULT_MODEL_NAME
        };
        Self::default().with_model_name(model_name)
    }

    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    pub fn with_short_circuit(mut self, enabled: bool) -> Self {
        self.short_circuit = enabled;
        self
    }

    /// The fixed answer to "what model are you".
    pub fn canonical_sentence(&self) -> String {
        format!("저는 {} 모델입니다.", self.model_name)
    }

    /// Whether `message` asks for the assistant's identity.
    ///
    /// Requires both a subject token and a name token, so "프로젝트 이름"
    /// is not mistaken for an identity question.
    pub fn is_identity_question(&self, message: &str) -> bool {
        let lowered = message.to_lowercase();
        let has = |tokens: &[String]| tokens.iter().any(|t| lowered.contains(&t.to_lowercase()));
        has(&self.subject_tokens) && has(&self.name_tokens)
    }

    /// Strings whose presence marks a reply as naming the right model.
    pub fn identity_markers(&self) -> Vec<&str> {
        let mut markers = vec![self.model_name.as_str()];
        for known in ["Llama", "Gemma", "LFM2", DEFAULT_MODEL_NAME] {
            if !markers.contains(&known) {
                markers.push(known);
            }
        }
        markers
    }

    /// Whether `reply` names one of the disallowed assistants.
    ///
    /// Names match whole tokens, optionally followed by a particle, so
    /// "사라가" matches while "사라졌습니다" and "alexander" do not.
    pub fn names_disallowed(&self, reply: &str) -> bool {
        let lowered = reply.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '-'))
            .filter(|t| !t.is_empty())
            .collect();
        self.disallowed_names.iter().any(|name| {
            let name = name.to_lowercase();
            tokens.iter().any(|token| match token.strip_prefix(name.as_str()) {
                Some(rest) => rest.is_empty() || NAME_SUFFIXES.contains(&rest),
                None => false,
            })
        })
    }

    /// Replace the reply when it names a disallowed assistant, or when it
    /// answers an identity question without the canonical name.
    pub fn enforce(&self, reply: &str, identity_question: bool) -> GuardrailOutcome {
        let wrong_name = self.names_disallowed(reply);
        let missing_identity = identity_question && !reply.contains(&self.model_name);

        if wrong_name || missing_identity {
            GuardrailOutcome {
                reply: self.canonical_sentence(),
                replaced: true,
            }
        } else {
            GuardrailOutcome {
                reply: reply.to_string(),
                replaced: false,
            }
        }
    }
}
