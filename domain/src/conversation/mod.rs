//! Conversation value objects: the incoming message and prior turns.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One prior turn supplied by the caller as context.
///
/// Turns are never persisted by the workflow; the caller owns history and
/// passes a window of it with every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The most recent `limit` turns of `history`, oldest first.
pub fn recent_turns(history: &[ConversationTurn], limit: usize) -> &[ConversationTurn] {
    let start = history.len().saturating_sub(limit);
    &history[start..]
}

/// A validated user message (Value Object)
///
/// The only request-level validation in the workflow: an empty or
/// whitespace-only message is rejected before any stage runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMessage {
    content: String,
}

impl UserMessage {
    /// Try to create a new message, rejecting empty input
    pub fn try_new(content: impl Into<String>) -> Result<Self, DomainError> {
        let content = content.into();
        if content.trim().is_empty() {
            Err(DomainError::EmptyMessage)
        } else {
            Ok(Self { content })
        }
    }

    /// Get the message content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Consume and return the inner content
    pub fn into_content(self) -> String {
        self.content
    }
}

impl std::fmt::Display for UserMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let m = UserMessage::try_new("프로젝트 일정이 어떻게 되나요?").unwrap();
        assert_eq!(m.content(), "프로젝트 일정이 어떻게 되나요?");
    }

    #[test]
    fn test_empty_message_rejected() {
        assert_eq!(UserMessage::try_new(""), Err(DomainError::EmptyMessage));
        assert_eq!(UserMessage::try_new("  \n\t"), Err(DomainError::EmptyMessage));
    }

    #[test]
    fn test_recent_turns_window() {
        let history: Vec<_> = (0..8)
            .map(|i| ConversationTurn::user(format!("turn {}", i)))
            .collect();
        let window = recent_turns(&history, 5);
        assert_eq!(window.len(), 5);
        assert_eq!(window[0].content, "turn 3");
        assert_eq!(window[4].content, "turn 7");

        assert_eq!(recent_turns(&history[..2], 5).len(), 2);
        assert!(recent_turns(&history, 0).is_empty());
    }

    #[test]
    fn test_role_serde_lowercase() {
        let turn = ConversationTurn::assistant("네");
        let json = serde_json::to_string(&turn).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"네"}"#);
        let back: ConversationTurn = serde_json::from_str(&json).unwrap();
        assert_eq!(back, turn);
    }
}
