//! Per-run mutable state

use crate::intent::Intent;
use crate::retrieval::{QualityDecision, QualityPolicy, QualityVerdict, Refinement, RetrievedChunk};
use crate::response::ValidationVerdict;
use super::stage::Event;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Diagnostic map attached to every reply. Entries are added, never removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Trace(BTreeMap<String, Value>);

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }
}

/// The single record threaded through one run.
///
/// `retry_count` only moves forward, through [`WorkflowState::apply_refinement`]
/// and [`WorkflowState::apply_repair`].
#[derive(Debug, Clone)]
pub struct WorkflowState {
    message: String,
    pub current_query: String,
    retry_count: u32,
    pub intent: Option<Intent>,
    pub retrieved_chunks: Vec<RetrievedChunk>,
    pub quality: Option<QualityVerdict>,
    pub extracted_terms: Vec<String>,
    pub response: Option<String>,
    pub confidence: f64,
    pub trace: Trace,
    repair_attempted: bool,
}

impl WorkflowState {
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            current_query: message.clone(),
            message,
            retry_count: 0,
            intent: None,
            retrieved_chunks: Vec::new(),
            quality: None,
            extracted_terms: Vec::new(),
            response: None,
            confidence: 0.0,
            trace: Trace::new(),
            repair_attempted: false,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn repair_attempted(&self) -> bool {
        self.repair_attempted
    }

    pub fn has_retry_budget(&self, max_retries: u32) -> bool {
        self.retry_count < max_retries
    }

    /// Set the intent, keeping the first value as `initial_intent` in the trace.
    pub fn set_intent(&mut self, intent: Intent) {
        let key = if self.intent.is_none() {
            "initial_intent"
        } else {
            "final_intent"
        };
        self.trace.record(key, intent.as_str());
        self.intent = Some(intent);
    }

    pub fn record_search_attempt(&mut self) {
        self.trace.record(
            format!("search_query_attempt_{}", self.retry_count),
            self.current_query.clone(),
        );
    }

    pub fn set_quality(&mut self, verdict: QualityVerdict) {
        self.trace.record("rag_quality_score", verdict.score);
        self.trace.record("rag_quality_reasons", verdict.reasons.clone());
        self.quality = Some(verdict);
    }

    pub fn quality_score(&self) -> f64 {
        self.quality.as_ref().map_or(0.0, |q| q.score)
    }

    pub fn apply_refinement(&mut self, refinement: Refinement) {
        self.retry_count += 1;
        self.trace.record(
            format!("refined_query_{}", self.retry_count),
            refinement.query.clone(),
        );
        self.current_query = refinement.query;
        self.extracted_terms = refinement.extracted_terms;
    }

    /// Spend one retry on a repaired query. Only one repair per run.
    pub fn apply_repair(&mut self, query: String) {
        self.retry_count += 1;
        self.repair_attempted = true;
        self.trace
            .record(format!("refined_query_{}", self.retry_count), query.clone());
        self.current_query = query;
    }

    /// Route out of `AssessQuality`.
    pub fn quality_event(&self, policy: &QualityPolicy, max_retries: u32) -> Event {
        match policy.decide(self.quality_score(), self.retry_count, max_retries) {
            QualityDecision::Proceed => Event::QualitySufficient,
            QualityDecision::Refine => Event::QualityInsufficient,
        }
    }

    /// Route out of `Validate`. At most one repair pass, paid from the
    /// same retry budget as refinement.
    pub fn validation_event(&self, verdict: &ValidationVerdict, max_retries: u32) -> Event {
        if verdict.is_valid {
            Event::ValidationPassed
        } else if verdict.suggest_retry
            && !self.repair_attempted
            && self.has_retry_budget(max_retries)
        {
            Event::ValidationFailed
        } else {
            Event::RetriesExhausted
        }
    }

    /// `query_refinement` summary, present once any retry was spent.
    pub fn finish_trace(&mut self) {
        if self.retry_count > 0 {
            self.trace.record(
                "query_refinement",
                json!({
                    "original_query": self.message,
                    "final_query": self.current_query,
                    "retry_count": self.retry_count,
                    "extracted_terms": self.extracted_terms,
                }),
            );
        }
    }
}
