//! Application-level configuration.
//!
//! This module provides configuration types that control how the chat
//! workflow behaves:
//!
//! - [`RetrievalParams`]: gateway filtering, retry ceiling, timeouts
//! - [`GenerationParams`]: sampling, prompt layout, inference timeout
//! - [`WorkflowConfig`]: container for every slice, domain policies included

pub mod generation_params;
pub mod retrieval_params;
pub mod workflow_config;

pub use generation_params::GenerationParams;
pub use retrieval_params::RetrievalParams;
pub use workflow_config::WorkflowConfig;
