//! Prompt rendering for chat-tuned models

use crate::conversation::{ConversationTurn, Role, recent_turns};
use crate::retrieval::RetrievedChunk;
use serde::{Deserialize, Serialize};

/// Turn markup understood by the serving model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptFormat {
    /// `<|im_start|>role ... <|im_end|>`
    #[default]
    ChatMl,
    /// `<start_of_turn>role ... <end_of_turn>`, assistant rendered as `model`
    Gemma,
}

impl PromptFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptFormat::ChatMl => "chat_ml",
            PromptFormat::Gemma => "gemma",
        }
    }
}

impl std::str::FromStr for PromptFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chat_ml" | "chatml" => Ok(PromptFormat::ChatMl),
            "gemma" => Ok(PromptFormat::Gemma),
            other => Err(format!("unknown prompt format: {}", other)),
        }
    }
}

/// Stop sequences covering both turn formats
pub const STOP_SEQUENCES: &[&str] = &["<end_of_turn>", "<start_of_turn>", "</s>", "<|im_end|>"];

pub fn stop_sequences() -> Vec<String> {
    STOP_SEQUENCES.iter().map(|s| s.to_string()).collect()
}

/// Renders system policy, the recent history window, then the current
/// message followed by the numbered chunks.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder {
    format: PromptFormat,
    history_limit: usize,
}

impl PromptBuilder {
    pub fn new(format: PromptFormat, history_limit: usize) -> Self {
        Self {
            format,
            history_limit,
        }
    }

    pub fn build(
        &self,
        system: &str,
        history: &[ConversationTurn],
        message: &str,
        chunks: &[RetrievedChunk],
    ) -> String {
        let history = recent_turns(history, self.history_limit);
        match self.format {
            PromptFormat::ChatMl => Self::chat_ml(system, history, message, chunks),
            PromptFormat::Gemma => Self::gemma(system, history, message, chunks),
        }
    }

    fn chat_ml(
        system: &str,
        history: &[ConversationTurn],
        message: &str,
        chunks: &[RetrievedChunk],
    ) -> String {
        let mut parts = vec!["<|im_start|>system".to_string(), system.to_string()];
        parts.push("<|im_end|>".to_string());

        for turn in history {
            parts.push(format!("<|im_start|>{}", turn.role.as_str()));
            parts.push(turn.content.clone());
            parts.push("<|im_end|>".to_string());
        }

        parts.push("<|im_start|>user".to_string());
        parts.push(message.to_string());
        if !chunks.is_empty() {
            parts.push("\n관련 문서:".to_string());
            parts.extend(numbered(chunks));
        }
        parts.push("<|im_end|>".to_string());
        parts.push("<|im_start|>assistant".to_string());

        parts.join("\n")
    }

    fn gemma(
        system: &str,
        history: &[ConversationTurn],
        message: &str,
        chunks: &[RetrievedChunk],
    ) -> String {
        let mut parts = vec![
            "<start_of_turn>system".to_string(),
            system.to_string(),
            "<end_of_turn>".to_string(),
        ];

        for turn in history {
            let role = match turn.role {
                Role::User => "user",
                Role::Assistant => "model",
            };
            parts.push(format!("<start_of_turn>{}", role));
            parts.push(turn.content.clone());
            parts.push("<end_of_turn>".to_string());
        }

        parts.push("<start_of_turn>user".to_string());
        parts.push(format!("현재 질문: {}", message));
        if !chunks.is_empty() {
            parts.push(String::new());
            parts.push("관련 문서 (RAG):".to_string());
            parts.extend(numbered(chunks));
        }
        parts.push("<end_of_turn>".to_string());
        parts.push("<start_of_turn>model".to_string());

        parts.join("\n")
    }
}

fn numbered(chunks: &[RetrievedChunk]) -> impl Iterator<Item = String> + '_ {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("{}. {}", i + 1, chunk.content))
}
