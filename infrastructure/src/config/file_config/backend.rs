//! Collaborator endpoints from TOML (`[backend]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the retriever and the inference engine live
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    /// JSON corpus for the in-memory retriever
    pub corpus: Option<PathBuf>,
    /// Search endpoint for the HTTP retriever
    pub retriever_url: Option<String>,
    /// llama.cpp server base URL
    pub llama_url: Option<String>,
    /// Server slot erased before every completion
    pub slot_id: u32,
}
