//! Generation parameters: sampling, prompt layout and inference timeout.

use crate::ports::inference::InferenceParams;
use ragloop_domain::PromptFormat;
use ragloop_domain::prompt::stop_sequences;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sampling and prompt settings for the synthesizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub repeat_penalty: f64,
    pub stop_sequences: Vec<String>,
    /// Prior turns included in the prompt.
    pub context_message_limit: usize,
    pub prompt_format: PromptFormat,
    /// Covers reset and inference; expiry is treated as a truncated reply.
    pub timeout: Duration,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 8182,
            temperature: 0.7,
            top_p: 0.9,
            repeat_penalty: 1.1,
            stop_sequences: stop_sequences(),
            context_message_limit: 5,
            prompt_format: PromptFormat::ChatMl,
            timeout: Duration::from_secs(120),
        }
    }
}

impl GenerationParams {
    pub fn inference_params(&self) -> InferenceParams {
        InferenceParams {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            repeat_penalty: self.repeat_penalty,
            stop: self.stop_sequences.clone(),
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = top_p;
        self
    }

    pub fn with_repeat_penalty(mut self, penalty: f64) -> Self {
        self.repeat_penalty = penalty;
        self
    }

    pub fn with_context_message_limit(mut self, limit: usize) -> Self {
        self.context_message_limit = limit;
        self
    }

    pub fn with_prompt_format(mut self, format: PromptFormat) -> Self {
        self.prompt_format = format;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
