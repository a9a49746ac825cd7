//! Response synthesizer: canned short-circuits, one guarded inference call,
//! sanitization and the identity guardrail.

use crate::config::GenerationParams;
use crate::ports::inference::{InferenceError, SharedInference};
use ragloop_domain::core::string::truncate;
use ragloop_domain::{
    ConversationTurn, IdentityProfile, Intent, PromptBuilder, PromptCatalog, ResponseSanitizer,
    RetrievedChunk,
};
use tracing::{debug, info, warn};

/// Why a reply was produced without inference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CannedKind {
    Casual,
    Identity,
    OutOfScope,
}

impl CannedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CannedKind::Casual => "casual",
            CannedKind::Identity => "identity",
            CannedKind::OutOfScope => "out_of_scope",
        }
    }
}

/// Result of one synthesis attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Synthesis {
    Canned {
        reply: String,
        kind: CannedKind,
    },
    Generated {
        reply: String,
        prompt_length: usize,
        /// The guardrail replaced the whole reply
        guardrail_replaced: bool,
        /// The engine stopped at `max_tokens`
        hit_token_limit: bool,
    },
    Failed {
        error: InferenceError,
        prompt_length: usize,
    },
}

pub struct ResponseSynthesizer {
    inference: SharedInference,
    params: GenerationParams,
    prompts: PromptCatalog,
    identity: IdentityProfile,
    sanitizer: ResponseSanitizer,
}

impl ResponseSynthesizer {
    pub fn new(
        inference: SharedInference,
        params: GenerationParams,
        prompts: PromptCatalog,
        identity: IdentityProfile,
    ) -> Self {
        let markers = identity
            .identity_markers()
            .into_iter()
            .map(str::to_string)
            .collect();
        Self {
            inference,
            params,
            prompts,
            identity,
            sanitizer: ResponseSanitizer::new(markers),
        }
    }

    /// Synthesize a reply for `message`.
    ///
    /// Order: casual greeting, identity short-circuit, out-of-scope when
    /// there is no evidence, then a single inference call.
    pub async fn synthesize(
        &self,
        message: &str,
        history: &[ConversationTurn],
        chunks: &[RetrievedChunk],
        intent: Intent,
    ) -> Synthesis {
        if intent == Intent::Casual {
            info!("Casual message, returning greeting");
            return Synthesis::Canned {
                reply: self.prompts.casual_response.clone(),
                kind: CannedKind::Casual,
            };
        }

        let identity_question = self.identity.is_identity_question(message);
        if identity_question && self.identity.short_circuit {
            info!("Identity question, answering from configuration");
            return Synthesis::Canned {
                reply: self.identity.canonical_sentence(),
                kind: CannedKind::Identity,
            };
        }

        if chunks.is_empty() {
            info!("No supporting chunks, out of scope");
            return Synthesis::Canned {
                reply: self.prompts.out_of_scope.clone(),
                kind: CannedKind::OutOfScope,
            };
        }

        let prompt = PromptBuilder::new(self.params.prompt_format, self.params.context_message_limit)
            .build(&self.prompts.system, history, message, chunks);
        let prompt_length = prompt.chars().count();
        info!(
            "Generating with {} chunks ({} prompt chars, {})",
            chunks.len(),
            prompt_length,
            self.params.prompt_format.as_str()
        );

        let completion = match self
            .inference
            .generate(&prompt, &self.params.inference_params(), self.params.timeout)
            .await
        {
            Ok(completion) => completion,
            Err(error) => {
                warn!("Inference failed: {}", error);
                return Synthesis::Failed {
                    error,
                    prompt_length,
                };
            }
        };
        let raw = completion.text;
        debug!("Raw reply: {}", truncate(&raw, 200));
        if completion.hit_token_limit {
            warn!(
                "Generation stopped at the token limit ({})",
                self.params.max_tokens
            );
        }

        let cleaned = self.sanitizer.clean(&raw, message);
        let guarded = self.identity.enforce(&cleaned, identity_question);
        if guarded.replaced {
            warn!("Guardrail replaced reply: {}", truncate(&cleaned, 100));
        }

        Synthesis::Generated {
            reply: guarded.reply,
            prompt_length,
            guardrail_replaced: guarded.replaced,
            hit_token_limit: completion.hit_token_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::inference::{Completion, InferenceEngine, InferenceParams};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    struct ScriptedEngine {
        replies: VecDeque<Result<Completion, InferenceError>>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl InferenceEngine for ScriptedEngine {
        async fn reset(&mut self) -> Result<(), InferenceError> {
            Ok(())
        }

        async fn infer(
            &mut self,
            prompt: &str,
            _params: &InferenceParams,
        ) -> Result<Completion, InferenceError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .pop_front()
                .unwrap_or_else(|| Err(InferenceError::RequestFailed("no more replies".into())))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn synthesizer(
        replies: Vec<Result<Completion, InferenceError>>,
    ) -> (ResponseSynthesizer, Arc<Mutex<Vec<String>>>) {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let engine = ScriptedEngine {
            replies: replies.into(),
            prompts: prompts.clone(),
        };
        let synthesizer = ResponseSynthesizer::new(
            SharedInference::new(Box::new(engine)),
            GenerationParams::default(),
            PromptCatalog::default(),
            IdentityProfile::default().with_model_name("Gemma 3"),
        );
        (synthesizer, prompts)
    }

    fn chunks() -> Vec<RetrievedChunk> {
        vec![RetrievedChunk::new("프로젝트 일정은 3월 15일 마감입니다.", 0.9)]
    }

    #[tokio::test]
    async fn test_casual_is_canned() {
        let (synth, prompts) = synthesizer(vec![]);
        let result = synth.synthesize("안녕", &[], &[], Intent::Casual).await;
        assert_eq!(
            result,
            Synthesis::Canned {
                reply: PromptCatalog::default().casual_response,
                kind: CannedKind::Casual,
            }
        );
        assert!(prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_identity_question_skips_inference() {
        let (synth, prompts) = synthesizer(vec![]);
        let result = synth
            .synthesize("너의 모델 이름이 뭐야?", &[], &chunks(), Intent::PmsQuery)
            .await;
        assert_eq!(
            result,
            Synthesis::Canned {
                reply: "저는 Gemma 3 모델입니다.".to_string(),
                kind: CannedKind::Identity,
            }
        );
        assert!(prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_chunks_is_out_of_scope() {
        let (synth, prompts) = synthesizer(vec![]);
        let result = synth
            .synthesize("오늘 날씨 어때?", &[], &[], Intent::General)
            .await;
        assert!(matches!(
            result,
            Synthesis::Canned {
                kind: CannedKind::OutOfScope,
                ..
            }
        ));
        assert!(prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generated_reply_is_sanitized() {
        let (synth, prompts) = synthesizer(vec![Ok(Completion::new(
            "<|im_start|>assistant\n프로젝트 일정은 3월 15일 마감입니다.<|im_end|>",
        ))]);
        let result = synth
            .synthesize("프로젝트 일정 알려줘", &[], &chunks(), Intent::PmsQuery)
            .await;
        match result {
            Synthesis::Generated {
                reply,
                guardrail_replaced,
                prompt_length,
                hit_token_limit,
            } => {
                assert_eq!(reply, "프로젝트 일정은 3월 15일 마감입니다.");
                assert!(!guardrail_replaced);
                assert!(!hit_token_limit);
                assert!(prompt_length > 0);
            }
            other => panic!("expected Generated, got {:?}", other),
        }
        let prompts = prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("1. 프로젝트 일정은 3월 15일 마감입니다."));
    }

    #[tokio::test]
    async fn test_guardrail_replaces_wrong_identity() {
        let (synth, _) = synthesizer(vec![Ok(Completion::new("저는 ChatGPT입니다. 일정은 3월입니다."))]);
        let result = synth
            .synthesize("프로젝트 일정 알려줘", &[], &chunks(), Intent::PmsQuery)
            .await;
        match result {
            Synthesis::Generated {
                reply,
                guardrail_replaced,
                ..
            } => {
                assert_eq!(reply, "저는 Gemma 3 모델입니다.");
                assert!(guardrail_replaced);
            }
            other => panic!("expected Generated, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_inference_failure_is_reported() {
        let (synth, _) = synthesizer(vec![Err(InferenceError::Unavailable("down".into()))]);
        let result = synth
            .synthesize("프로젝트 일정 알려줘", &[], &chunks(), Intent::PmsQuery)
            .await;
        assert!(matches!(
            result,
            Synthesis::Failed {
                error: InferenceError::Unavailable(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_token_limit_is_reported() {
        let (synth, _) = synthesizer(vec![Ok(Completion::token_limited(
            "프로젝트 일정은 3월 15일에 최종 확",
        ))]);
        let result = synth
            .synthesize("프로젝트 일정 알려줘", &[], &chunks(), Intent::PmsQuery)
            .await;
        assert!(matches!(
            result,
            Synthesis::Generated {
                hit_token_limit: true,
                ..
            }
        ));
    }
}
