//! Domain layer for ragloop
//!
//! This crate contains the retrieval-orchestration policy: every decision
//! the workflow makes, expressed as pure functions and value objects.
//! It has no dependencies on I/O, async runtimes or collaborators.
//!
//! # Core Concepts
//!
//! ## Quality gate
//!
//! Retrieved evidence is scored for coverage and lexical overlap. A low
//! score sends the query to the refiner; the retry ceiling bounds the cycle.
//!
//! ## Validation and repair
//!
//! Generated replies are sanitized, checked by the identity guardrail and
//! validated structurally. A failed reply gets one repaired retrieval pass
//! paid from the same retry budget.

pub mod conversation;
pub mod core;
pub mod intent;
pub mod prompt;
pub mod response;
pub mod retrieval;
pub mod workflow;

// Re-export commonly used types
pub use conversation::{ConversationTurn, Role, UserMessage};
pub use core::error::DomainError;
pub use intent::{Intent, IntentRouter};
pub use prompt::{PromptBuilder, PromptCatalog, PromptFormat, PromptKey};
pub use response::{
    ConfidencePolicy, FailureKind, GuardrailOutcome, IdentityProfile, RepairAction,
    ResponseSanitizer, ValidationPolicy, ValidationVerdict,
};
pub use retrieval::{
    Metadata, MetadataFilter, MetadataValue, QualityDecision, QualityPolicy, QualityVerdict,
    QueryRefiner, Refinement, RefinementStrategy, RetrievedChunk, SuppliedChunk,
};
pub use workflow::{ChatOutcome, ChatReply, Event, Stage, Trace, WorkflowState, transition};
