//! Configuration file loading for ragloop
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `RAGLOOP_*` environment variables (`__` separates sections)
//! 2. `--config <path>` specified file
//! 3. Project root: `./ragloop.toml` or `./.ragloop.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/ragloop/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileBackendConfig, FileConfig, FileGenerationConfig,
    FileIdentityConfig, FileOutputConfig, FileOutputFormat, FilePromptsConfig,
    FileRetrievalConfig,
};
pub use loader::ConfigLoader;
