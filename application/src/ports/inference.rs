//! Inference engine port
//!
//! The generation collaborator is a single stateful handle: it keeps a
//! context cache that must be reset before every unrelated call, and only
//! one call may be in flight at a time. [`SharedInference`] enforces both.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// Errors that can occur during inference
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("Inference engine unavailable: {0}")]
    Unavailable(String),

    #[error("Inference request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid inference response: {0}")]
    InvalidResponse(String),

    #[error("Inference timed out")]
    Timeout,
}

impl InferenceError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, InferenceError::Timeout)
    }
}

/// Sampling parameters for one call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceParams {
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub repeat_penalty: f64,
    pub stop: Vec<String>,
}

/// Text returned by one inference call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub text: String,
    /// Generation stopped because `max_tokens` ran out
    pub hit_token_limit: bool,
}

impl Completion {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            hit_token_limit: false,
        }
    }

    /// A completion cut off by the token limit
    pub fn token_limited(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            hit_token_limit: true,
        }
    }
}

impl From<String> for Completion {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// A stateful text-generation handle
///
/// `&mut self` on both operations makes exclusive access part of the type.
#[async_trait]
pub trait InferenceEngine: Send {
    /// Clear the handle's context before reuse
    async fn reset(&mut self) -> Result<(), InferenceError>;

    /// Generate a completion for `prompt`
    async fn infer(
        &mut self,
        prompt: &str,
        params: &InferenceParams,
    ) -> Result<Completion, InferenceError>;

    /// Model identifier (file name or served model id)
    fn model_name(&self) -> &str;
}

/// Process-wide handle that serializes callers on one engine.
#[derive(Clone)]
pub struct SharedInference {
    engine: Arc<Mutex<Box<dyn InferenceEngine>>>,
    model_name: Arc<str>,
}

impl SharedInference {
    pub fn new(engine: Box<dyn InferenceEngine>) -> Self {
        let model_name: Arc<str> = Arc::from(engine.model_name());
        Self {
            engine: Arc::new(Mutex::new(engine)),
            model_name,
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Reset then infer while holding the handle.
    ///
    /// `timeout` covers reset and inference, not the wait for the lock.
    pub async fn generate(
        &self,
        prompt: &str,
        params: &InferenceParams,
        timeout: Duration,
    ) -> Result<Completion, InferenceError> {
        let mut engine = self.engine.lock().await;
        debug!("Inference handle acquired ({})", self.model_name);

        let call = async {
            engine.reset().await?;
            engine.infer(prompt, params).await
        };
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(InferenceError::Timeout),
        }
    }
}
