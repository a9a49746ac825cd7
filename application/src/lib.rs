//! Application layer for ragloop
//!
//! This crate contains the chat use case, port definitions, and application
//! configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{GenerationParams, RetrievalParams, WorkflowConfig};
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    inference::{Completion, InferenceEngine, InferenceError, InferenceParams, SharedInference},
    progress::{NoProgress, WorkflowProgress},
    retriever::{RetrievalError, Retriever},
};
pub use use_cases::run_chat::{RunChatError, RunChatInput, RunChatUseCase};
