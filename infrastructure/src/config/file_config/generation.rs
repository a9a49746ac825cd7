//! Generation configuration from TOML (`[generation]` section)

use ragloop_application::GenerationParams;
use ragloop_domain::PromptFormat;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw generation configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGenerationConfig {
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub repeat_penalty: f64,
    /// Replaces the built-in stop sequences when set
    pub stop_sequences: Option<Vec<String>>,
    pub context_message_limit: usize,
    /// `chat_ml` or `gemma`
    pub prompt_format: PromptFormat,
    pub timeout_seconds: u64,
}

impl Default for FileGenerationConfig {
    fn default() -> Self {
        let params = GenerationParams::default();
        Self {
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            repeat_penalty: params.repeat_penalty,
            stop_sequences: None,
            context_message_limit: params.context_message_limit,
            prompt_format: params.prompt_format,
            timeout_seconds: params.timeout.as_secs(),
        }
    }
}

impl FileGenerationConfig {
    pub fn to_params(&self) -> GenerationParams {
        let mut params = GenerationParams::default()
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature)
            .with_top_p(self.top_p)
            .with_repeat_penalty(self.repeat_penalty)
            .with_context_message_limit(self.context_message_limit)
            .with_prompt_format(self.prompt_format)
            .with_timeout(Duration::from_secs(self.timeout_seconds));
        if let Some(stop) = &self.stop_sequences {
            params.stop_sequences = stop.clone();
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_application_defaults() {
        assert_eq!(
            FileGenerationConfig::default().to_params(),
            GenerationParams::default()
        );
    }

    #[test]
    fn test_gemma_format_and_custom_stops() {
        let toml_str = r#"
prompt_format = "gemma"
stop_sequences = ["<end_of_turn>"]
"#;
        let config: FileGenerationConfig = toml::from_str(toml_str).unwrap();
        let params = config.to_params();
        assert_eq!(params.prompt_format, PromptFormat::Gemma);
        assert_eq!(params.stop_sequences, vec!["<end_of_turn>".to_string()]);
    }
}
