//! Prompt domain
//!
//! Fixed texts (system policy and canned replies) and the turn-format
//! renderer used for every inference call.

mod builder;
mod catalog;

pub use builder::{PromptBuilder, PromptFormat, STOP_SEQUENCES, stop_sequences};
pub use catalog::{PromptCatalog, PromptKey};
