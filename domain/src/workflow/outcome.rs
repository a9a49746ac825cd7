//! Run results

use super::state::{Trace, WorkflowState};
use crate::intent::Intent;
use serde::Serialize;

/// The populated result record of one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub confidence: f64,
    pub intent: Intent,
    pub chunk_count: usize,
    pub retry_count: u32,
    pub trace: Trace,
}

impl ChatReply {
    /// Close out a finished state. A state that never got an intent is
    /// reported as `general`.
    pub fn from_state(mut state: WorkflowState) -> Self {
        state.finish_trace();
        Self {
            reply: state.response.clone().unwrap_or_default(),
            confidence: state.confidence,
            intent: state.intent.unwrap_or(Intent::General),
            chunk_count: state.retrieved_chunks.len(),
            retry_count: state.retry_count(),
            trace: state.trace,
        }
    }
}

/// How a run ended.
///
/// `Degraded` still carries a complete reply; it only marks that a fallback
/// text or reduced confidence was used.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChatOutcome {
    Answered(ChatReply),
    Degraded { reply: ChatReply, reason: String },
    Rejected { reason: String },
}

impl ChatOutcome {
    pub fn reply(&self) -> Option<&ChatReply> {
        match self {
            ChatOutcome::Answered(reply) | ChatOutcome::Degraded { reply, .. } => Some(reply),
            ChatOutcome::Rejected { .. } => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ChatOutcome::Degraded { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, ChatOutcome::Rejected { .. })
    }

    pub fn status(&self) -> &'static str {
        match self {
            ChatOutcome::Answered(_) => "answered",
            ChatOutcome::Degraded { .. } => "degraded",
            ChatOutcome::Rejected { .. } => "rejected",
        }
    }
}
