//! Retriever adapters
//!
//! - [`InMemoryRetriever`]: token-overlap search over a JSON corpus
//! - [`HttpRetriever`]: client for a remote search endpoint (feature `http`)

#[cfg(feature = "http")]
mod http;
mod memory;

#[cfg(feature = "http")]
pub use http::HttpRetriever;
pub use memory::{CorpusError, InMemoryRetriever};
