//! Run Chat use case
//!
//! Drives one chat run through the workflow state machine:
//!
//! | Stage          | Work                                              |
//! |----------------|---------------------------------------------------|
//! | ClassifyCoarse | greeting check (casual skips retrieval)           |
//! | Retrieve       | search or reuse pre-supplied chunks, post-filter  |
//! | AssessQuality  | coverage + lexical score, proceed or refine       |
//! | Refine         | keyword bag / corpus term rewrite, retry + 1      |
//! | ClassifyFinal  | `pms_query` with evidence, `general` without      |
//! | Synthesize     | canned reply or one guarded inference call        |
//! | Validate       | structural checks on the cleaned reply            |
//! | Repair         | failure-specific query rewrite, retry + 1, once   |
//!
//! Refinement and repair draw from one retry budget
//! ([`RetrievalParams::max_query_retries`](crate::config::RetrievalParams)),
//! which bounds every collaborator call made by a run.

mod retrieval;
mod synthesis;
mod types;

pub use retrieval::{ChunkSource, RetrievalGateway, RetrievalOutcome};
pub use synthesis::{CannedKind, ResponseSynthesizer, Synthesis};
pub use types::{RunChatError, RunChatInput};

use crate::config::WorkflowConfig;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::inference::SharedInference;
use crate::ports::progress::WorkflowProgress;
use crate::ports::retriever::Retriever;
use crate::use_cases::shared::{cancellable, check_cancelled};
use ragloop_domain::core::string::truncate;
use ragloop_domain::{
    ChatOutcome, ChatReply, Event, FailureKind, Intent, QueryRefiner, Stage, UserMessage,
    ValidationVerdict, WorkflowState, transition,
};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Use case for answering one chat message
pub struct RunChatUseCase {
    gateway: Arc<RetrievalGateway>,
    synthesizer: Arc<ResponseSynthesizer>,
    refiner: QueryRefiner,
    config: Arc<WorkflowConfig>,
    conversation_logger: Arc<dyn ConversationLogger>,
    cancellation_token: Option<CancellationToken>,
}

impl Clone for RunChatUseCase {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            synthesizer: self.synthesizer.clone(),
            refiner: self.refiner.clone(),
            config: self.config.clone(),
            conversation_logger: self.conversation_logger.clone(),
            cancellation_token: self.cancellation_token.clone(),
        }
    }
}

/// Run-local bookkeeping that is not part of the traced state
#[derive(Default)]
struct RunFlags {
    /// Next retrieval belongs to the repair pass
    recovery: bool,
    /// Verdict forced by an inference timeout
    pending_verdict: Option<ValidationVerdict>,
    last_failure: Option<FailureKind>,
    timed_out: bool,
    degraded: Option<String>,
}

impl RunChatUseCase {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        inference: SharedInference,
        config: WorkflowConfig,
    ) -> Self {
        let gateway = RetrievalGateway::new(retriever, config.retrieval.clone());
        let synthesizer = ResponseSynthesizer::new(
            inference,
            config.generation.clone(),
            config.prompts.clone(),
            config.identity.clone(),
        );
        Self {
            gateway: Arc::new(gateway),
            synthesizer: Arc::new(synthesizer),
            refiner: QueryRefiner::new(config.retrieval.fuzzy_match_threshold),
            config: Arc::new(config),
            conversation_logger: Arc::new(NoConversationLogger),
            cancellation_token: None,
        }
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Set a cancellation token for graceful interruption
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Answer `input.message`.
    ///
    /// Always produces a reply unless the run is cancelled. An empty message
    /// is rejected before any stage runs.
    pub async fn execute(
        &self,
        input: RunChatInput,
        progress: &dyn WorkflowProgress,
    ) -> Result<ChatOutcome, RunChatError> {
        let message = match UserMessage::try_new(input.message.clone()) {
            Ok(message) => message,
            Err(e) => {
                warn!("Rejected chat input: {}", e);
                return Ok(ChatOutcome::Rejected {
                    reason: e.to_string(),
                });
            }
        };
        info!("Starting chat run: {}", truncate(message.content(), 100));

        let max_retries = self.config.retrieval.max_query_retries;
        let mut state = WorkflowState::new(message.into_content());
        let mut flags = RunFlags::default();
        let mut stage = Stage::ClassifyCoarse;

        while !stage.is_terminal() {
            check_cancelled(&self.cancellation_token)?;
            progress.on_stage(stage, state.retry_count());
            debug!("Stage {} (retry {})", stage, state.retry_count());

            let event = match stage {
                Stage::ClassifyCoarse => self.classify_coarse(&mut state),
                Stage::Retrieve => self.retrieve(&mut state, &mut flags, &input).await?,
                Stage::AssessQuality => self.assess_quality(&mut state, max_retries),
                Stage::Refine => self.refine(&mut state, progress),
                Stage::ClassifyFinal => self.classify_final(&mut state),
                Stage::Synthesize => self.synthesize(&mut state, &mut flags, &input).await?,
                Stage::Validate => self.validate(&mut state, &mut flags, max_retries),
                Stage::Repair => self.repair(&mut state, &mut flags, progress),
                Stage::Done => break,
            };

            stage = match transition(stage, event) {
                Ok(next) => next,
                Err(e) => {
                    error!("Workflow aborted: {}", e);
                    state.response = Some(self.config.prompts.generation_error.clone());
                    flags.degraded = Some(e.to_string());
                    Stage::Done
                }
            };
        }

        Ok(self.finish(state, flags, progress))
    }

    fn classify_coarse(&self, state: &mut WorkflowState) -> Event {
        let intent = self.config.intent.classify_coarse(state.message());
        info!("Coarse intent: {}", intent);
        state.set_intent(intent);
        if intent == Intent::Casual {
            Event::Casual
        } else {
            Event::Uncertain
        }
    }

    async fn retrieve(
        &self,
        state: &mut WorkflowState,
        flags: &mut RunFlags,
        input: &RunChatInput,
    ) -> Result<Event, RunChatError> {
        state.record_search_attempt();
        let outcome = cancellable(
            &self.cancellation_token,
            self.gateway.retrieve(
                &state.current_query,
                input.supplied_chunks.as_deref(),
                state.retry_count(),
            ),
        )
        .await?;

        if let Some(e) = &outcome.error {
            state.trace.record("retrieval_error", e.to_string());
        }
        self.conversation_logger.log(ConversationEvent::new(
            "retrieval",
            json!({
                "query": state.current_query,
                "retry_count": state.retry_count(),
                "source": outcome.source.as_str(),
                "raw_count": outcome.raw_count,
                "chunk_count": outcome.chunks.len(),
                "error": outcome.error.as_ref().map(|e| e.to_string()),
            }),
        ));
        state.retrieved_chunks = outcome.chunks;

        if std::mem::take(&mut flags.recovery) {
            Ok(Event::RecoveryRetrieved)
        } else {
            Ok(Event::Retrieved)
        }
    }

    fn assess_quality(&self, state: &mut WorkflowState, max_retries: u32) -> Event {
        let verdict = self
            .config
            .quality
            .assess(&state.retrieved_chunks, &state.current_query);
        info!(
            "Quality {:.2} over {} chunks: {}",
            verdict.score,
            state.retrieved_chunks.len(),
            verdict.reasons.join(", ")
        );
        state.set_quality(verdict);
        state.quality_event(&self.config.quality, max_retries)
    }

    fn refine(&self, state: &mut WorkflowState, progress: &dyn WorkflowProgress) -> Event {
        let refinement = self.refiner.refine(
            state.message(),
            &state.current_query,
            state.retry_count(),
            &state.retrieved_chunks,
        );
        info!(
            "Refined query ({}): '{}' -> '{}'",
            refinement.strategy.as_str(),
            state.current_query,
            refinement.query
        );
        self.conversation_logger.log(ConversationEvent::new(
            "refinement",
            json!({
                "from": state.current_query,
                "to": refinement.query,
                "strategy": refinement.strategy.as_str(),
                "retry_count": state.retry_count() + 1,
                "extracted_terms": refinement.extracted_terms,
            }),
        ));
        state.apply_refinement(refinement);
        progress.on_query_refined(&state.current_query, state.retry_count());
        Event::Refined
    }

    fn classify_final(&self, state: &mut WorkflowState) -> Event {
        let intent = self.config.intent.classify_final(&state.retrieved_chunks);
        info!("Final intent: {}", intent);
        state.set_intent(intent);
        Event::Classified
    }

    async fn synthesize(
        &self,
        state: &mut WorkflowState,
        flags: &mut RunFlags,
        input: &RunChatInput,
    ) -> Result<Event, RunChatError> {
        let intent = state.intent.unwrap_or(Intent::General);
        let synthesis = cancellable(
            &self.cancellation_token,
            self.synthesizer.synthesize(
                state.message(),
                &input.history,
                &state.retrieved_chunks,
                intent,
            ),
        )
        .await?;

        let event = match synthesis {
            Synthesis::Canned { reply, kind } => {
                state.trace.record("prompt_length", 0);
                self.log_synthesis(kind.as_str(), 0, &reply);
                state.response = Some(reply);
                Event::Answered
            }
            Synthesis::Generated {
                reply,
                prompt_length,
                guardrail_replaced,
                hit_token_limit,
            } => {
                state.trace.record("prompt_length", prompt_length);
                if guardrail_replaced {
                    state.trace.record("guardrail_replaced", true);
                }
                if hit_token_limit && !guardrail_replaced {
                    flags.pending_verdict = Some(ValidationVerdict::invalid(
                        FailureKind::Truncated,
                        "generation stopped at the token limit",
                    ));
                }
                self.log_synthesis("generated", prompt_length, &reply);
                state.response = Some(reply);
                Event::Generated
            }
            Synthesis::Failed {
                error,
                prompt_length,
            } if error.is_timeout() => {
                state.trace.record("prompt_length", prompt_length);
                state.trace.record("inference_error", error.to_string());
                self.log_synthesis("timeout", prompt_length, "");
                state.response = None;
                flags.timed_out = true;
                flags.pending_verdict = Some(ValidationVerdict::timed_out());
                Event::Generated
            }
            Synthesis::Failed {
                error,
                prompt_length,
            } => {
                error!("Inference unavailable: {}", error);
                state.trace.record("prompt_length", prompt_length);
                state.trace.record("inference_error", error.to_string());
                self.log_synthesis("failed", prompt_length, "");
                state.response = Some(self.config.prompts.generation_error.clone());
                flags.degraded = Some(format!("inference failed: {}", error));
                Event::InferenceFailed
            }
        };
        Ok(event)
    }

    fn log_synthesis(&self, kind: &str, prompt_length: usize, reply: &str) {
        self.conversation_logger.log(ConversationEvent::new(
            "synthesis",
            json!({
                "kind": kind,
                "prompt_length": prompt_length,
                "reply": reply,
            }),
        ));
    }

    fn validate(&self, state: &mut WorkflowState, flags: &mut RunFlags, max_retries: u32) -> Event {
        let verdict = match flags.pending_verdict.take() {
            Some(verdict) => verdict,
            None => {
                flags.timed_out = false;
                let reply = state.response.as_deref().unwrap_or_default();
                self.config.validation.validate(reply, state.message())
            }
        };

        self.conversation_logger.log(ConversationEvent::new(
            "validation",
            json!({
                "is_valid": verdict.is_valid,
                "failure_kind": verdict.failure.map(|k| k.as_str()),
                "reason": verdict.reason,
                "retry_count": state.retry_count(),
            }),
        ));

        let event = state.validation_event(&verdict, max_retries);
        if let Some(kind) = verdict.failure {
            warn!("Reply failed validation ({}): {}", kind, verdict.reason);
            state.trace.record(
                "response_validation_failed",
                json!({
                    "failure_kind": kind.as_str(),
                    "reason": verdict.reason,
                    "suggest_retry": verdict.suggest_retry,
                    "repair_action": kind.repair_action().as_str(),
                }),
            );
            flags.last_failure = Some(kind);
        }

        if event == Event::RetriesExhausted {
            let fallback = if flags.timed_out {
                &self.config.prompts.timeout
            } else {
                &self.config.prompts.generation_error
            };
            warn!("No retries left, replying with fallback text");
            state.response = Some(fallback.clone());
            flags.degraded = Some(format!("validation failed: {}", verdict.reason));
        }
        event
    }

    fn repair(
        &self,
        state: &mut WorkflowState,
        flags: &mut RunFlags,
        progress: &dyn WorkflowProgress,
    ) -> Event {
        let kind = flags.last_failure.unwrap_or(FailureKind::Empty);
        let action = kind.repair_action();
        let query = action.apply(state.message());
        info!(
            "Repairing after {} ({}): '{}'",
            kind,
            action.as_str(),
            query
        );
        self.conversation_logger.log(ConversationEvent::new(
            "refinement",
            json!({
                "from": state.current_query,
                "to": query,
                "strategy": format!("repair:{}", action.as_str()),
                "retry_count": state.retry_count() + 1,
            }),
        ));
        state.apply_repair(query);
        state.response = None;
        flags.recovery = true;
        progress.on_query_refined(&state.current_query, state.retry_count());
        Event::Repaired
    }

    fn finish(
        &self,
        mut state: WorkflowState,
        flags: RunFlags,
        progress: &dyn WorkflowProgress,
    ) -> ChatOutcome {
        let intent = state.intent.unwrap_or(Intent::General);
        let chunk_count = state.retrieved_chunks.len();
        state.confidence = if flags.degraded.is_some() {
            self.config.confidence.degraded_score(intent, chunk_count)
        } else {
            self.config.confidence.score(intent, chunk_count)
        };
        if state.response.is_none() {
            state.response = Some(self.config.prompts.generation_error.clone());
        }

        info!(
            "Chat run finished: intent={}, chunks={}, retries={}, confidence={:.2}",
            intent,
            chunk_count,
            state.retry_count(),
            state.confidence
        );
        progress.on_run_complete(intent, state.confidence);

        let reply = ChatReply::from_state(state);
        self.conversation_logger.log(ConversationEvent::new(
            "run_completed",
            json!({
                "intent": reply.intent.as_str(),
                "confidence": reply.confidence,
                "chunk_count": reply.chunk_count,
                "retry_count": reply.retry_count,
                "degraded": flags.degraded,
                "reply": reply.reply,
            }),
        ));

        match flags.degraded {
            Some(reason) => ChatOutcome::Degraded { reply, reason },
            None => ChatOutcome::Answered(reply),
        }
    }
}
