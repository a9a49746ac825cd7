//! Type definitions for the RunChat use case.

use ragloop_domain::{ConversationTurn, RetrievedChunk, SuppliedChunk};
use thiserror::Error;

/// Errors that reach the caller of a chat run
///
/// Collaborator failures never do: they degrade into trace entries and
/// fallback replies.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RunChatError {
    #[error("Operation cancelled")]
    Cancelled,
}

impl RunChatError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunChatError::Cancelled)
    }
}

/// Input for the RunChat use case
#[derive(Debug, Clone, Default)]
pub struct RunChatInput {
    /// The user's message
    pub message: String,
    /// Prior turns, oldest first; only the most recent window is used
    pub history: Vec<ConversationTurn>,
    /// Chunks fetched by the caller; used instead of the first search
    pub supplied_chunks: Option<Vec<RetrievedChunk>>,
}

impl RunChatInput {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_history(mut self, history: Vec<ConversationTurn>) -> Self {
        self.history = history;
        self
    }

    /// Accepts plain strings or full chunk records.
    pub fn with_supplied_chunks(mut self, chunks: Vec<SuppliedChunk>) -> Self {
        let chunks: Vec<RetrievedChunk> = chunks.into_iter().map(RetrievedChunk::from).collect();
        self.supplied_chunks = (!chunks.is_empty()).then_some(chunks);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supplied_chunks_are_normalized() {
        let input = RunChatInput::new("일정").with_supplied_chunks(vec![
            SuppliedChunk::Text("일정은 3월입니다.".to_string()),
            SuppliedChunk::Chunk(RetrievedChunk::new("예산", 0.4)),
        ]);
        let chunks = input.supplied_chunks.unwrap();
        assert_eq!(chunks[0].relevance_score, 1.0);
        assert!(chunks[0].metadata.is_empty());
        assert_eq!(chunks[1].relevance_score, 0.4);
    }

    #[test]
    fn test_empty_supplied_chunks_are_ignored() {
        let input = RunChatInput::new("일정").with_supplied_chunks(vec![]);
        assert!(input.supplied_chunks.is_none());
    }
}
