//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Policy sections (`[quality]`, `[intent]`, `[validation]`, `[confidence]`)
//! deserialize straight into domain types.

mod backend;
mod generation;
mod identity;
mod output;
mod prompts;
mod retrieval;

pub use backend::FileBackendConfig;
pub use generation::FileGenerationConfig;
pub use identity::FileIdentityConfig;
pub use output::{FileOutputConfig, FileOutputFormat};
pub use prompts::FilePromptsConfig;
pub use retrieval::FileRetrievalConfig;

use crate::prompts::PromptDirectory;
use ragloop_application::WorkflowConfig;
use ragloop_domain::{ConfidencePolicy, IntentRouter, QualityPolicy, ValidationPolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    #[error("{field} must be within [0, 1], got {value}")]
    ScoreOutOfRange { field: &'static str, value: f64 },

    #[error("retrieval.top_k cannot be 0")]
    ZeroTopK,

    #[error("{0} cannot be 0")]
    ZeroTimeout(&'static str),

    #[error("retrieval.fuzzy_match_threshold must be within [0, 100], got {0}")]
    FuzzyThresholdOutOfRange(f64),

    #[error("generation.max_tokens cannot be 0")]
    ZeroMaxTokens,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub retrieval: FileRetrievalConfig,
    pub quality: QualityPolicy,
    pub intent: IntentRouter,
    pub generation: FileGenerationConfig,
    pub validation: ValidationPolicy,
    pub confidence: ConfidencePolicy,
    pub identity: FileIdentityConfig,
    pub prompts: FilePromptsConfig,
    pub backend: FileBackendConfig,
    pub output: FileOutputConfig,
}

fn check_score(field: &'static str, value: f64) -> Result<(), ConfigValidationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigValidationError::ScoreOutOfRange { field, value })
    }
}

impl FileConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.retrieval.top_k == 0 {
            return Err(ConfigValidationError::ZeroTopK);
        }
        if self.retrieval.timeout_seconds == 0 {
            return Err(ConfigValidationError::ZeroTimeout("retrieval.timeout_seconds"));
        }
        if self.generation.timeout_seconds == 0 {
            return Err(ConfigValidationError::ZeroTimeout("generation.timeout_seconds"));
        }
        if self.generation.max_tokens == 0 {
            return Err(ConfigValidationError::ZeroMaxTokens);
        }
        let fuzzy = self.retrieval.fuzzy_match_threshold;
        if !(0.0..=100.0).contains(&fuzzy) {
            return Err(ConfigValidationError::FuzzyThresholdOutOfRange(fuzzy));
        }

        let scores = [
            ("retrieval.min_relevance_score", self.retrieval.min_relevance_score),
            ("quality.quality_threshold", self.quality.quality_threshold),
            ("quality.keyword_match_good_ratio", self.quality.keyword_match_good_ratio),
            ("quality.full_coverage_weight", self.quality.full_coverage_weight),
            ("quality.partial_coverage_weight", self.quality.partial_coverage_weight),
            ("quality.good_match_weight", self.quality.good_match_weight),
            ("quality.partial_match_weight", self.quality.partial_match_weight),
            ("generation.top_p", self.generation.top_p),
            ("validation.max_repetition_ratio", self.validation.max_repetition_ratio),
            ("validation.min_alphanumeric_ratio", self.validation.min_alphanumeric_ratio),
            ("confidence.casual", self.confidence.casual),
            ("confidence.pms_query", self.confidence.pms_query),
            ("confidence.general", self.confidence.general),
            ("confidence.default", self.confidence.default),
            ("confidence.max_confidence", self.confidence.max_confidence),
            ("confidence.degraded", self.confidence.degraded),
        ];
        for (field, value) in scores {
            check_score(field, value)?;
        }

        Ok(())
    }

    /// Build the runtime configuration, reading `prompts.dir` if set.
    pub fn to_workflow_config(&self) -> WorkflowConfig {
        let mut prompts = WorkflowConfig::default().prompts;
        if let Some(dir) = &self.prompts.dir {
            prompts = PromptDirectory::new(dir).apply(prompts);
        }
        prompts = self.prompts.apply_inline(prompts);

        WorkflowConfig::default()
            .with_retrieval(self.retrieval.to_params())
            .with_quality(self.quality.clone())
            .with_intent(self.intent.clone())
            .with_generation(self.generation.to_params())
            .with_validation(self.validation.clone())
            .with_confidence(self.confidence.clone())
            .with_identity(self.identity.to_profile())
            .with_prompts(prompts)
    }
}
