//! Infrastructure layer for ragloop
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod inference;
pub mod logging;
pub mod prompts;
pub mod retrieval;

#[cfg(all(test, feature = "http"))]
mod test_support;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileBackendConfig, FileConfig, FileOutputConfig,
    FileOutputFormat,
};
pub use inference::EchoEngine;
#[cfg(feature = "http")]
pub use inference::LlamaServerEngine;
pub use logging::JsonlConversationLogger;
pub use prompts::PromptDirectory;
#[cfg(feature = "http")]
pub use retrieval::HttpRetriever;
pub use retrieval::{CorpusError, InMemoryRetriever};
