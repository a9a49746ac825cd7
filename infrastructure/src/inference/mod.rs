//! Inference engine adapters
//!
//! - [`LlamaServerEngine`]: llama.cpp server client (feature `http`)
//! - [`EchoEngine`]: offline engine that answers with the best chunk

mod echo;
#[cfg(feature = "http")]
mod llama_server;

pub use echo::EchoEngine;
#[cfg(feature = "http")]
pub use llama_server::LlamaServerEngine;
