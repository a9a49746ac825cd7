//! Workflow configuration container.
//!
//! [`WorkflowConfig`] groups every tunable of a chat run. The weights and
//! thresholds are empirically chosen, so all of them stay overridable.
//!
//! | Type | Consumed by |
//! |------|-------------|
//! | [`RetrievalParams`] | gateway, quality loop, repair budget |
//! | [`QualityPolicy`] | quality gate |
//! | [`IntentRouter`] | coarse/final classification |
//! | [`GenerationParams`] | synthesizer |
//! | [`ValidationPolicy`] | validator |
//! | [`ConfidencePolicy`] | final scoring |
//! | [`IdentityProfile`] | guardrail, sanitizer |
//! | [`PromptCatalog`] | synthesizer, canned replies |

use super::{GenerationParams, RetrievalParams};
use ragloop_domain::{
    ConfidencePolicy, IdentityProfile, IntentRouter, PromptCatalog, QualityPolicy,
    ValidationPolicy,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub retrieval: RetrievalParams,
    pub quality: QualityPolicy,
    pub intent: IntentRouter,
    pub generation: GenerationParams,
    pub validation: ValidationPolicy,
    pub confidence: ConfidencePolicy,
    pub identity: IdentityProfile,
    pub prompts: PromptCatalog,
}

impl WorkflowConfig {
    // ==================== Builder Methods ====================

    pub fn with_retrieval(mut self, retrieval: RetrievalParams) -> Self {
        self.retrieval = retrieval;
        self
    }

    pub fn with_quality(mut self, quality: QualityPolicy) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_intent(mut self, intent: IntentRouter) -> Self {
        self.intent = intent;
        self
    }

    pub fn with_generation(mut self, generation: GenerationParams) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_validation(mut self, validation: ValidationPolicy) -> Self {
        self.validation = validation;
        self
    }

    pub fn with_confidence(mut self, confidence: ConfidencePolicy) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_identity(mut self, identity: IdentityProfile) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_prompts(mut self, prompts: PromptCatalog) -> Self {
        self.prompts = prompts;
        self
    }
}
