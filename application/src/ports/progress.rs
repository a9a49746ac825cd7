//! Progress notification port
//!
//! Defines the interface for reporting progress while a chat run moves
//! through the workflow stages.

use ragloop_domain::{Intent, Stage};

/// Callback for progress updates during a run
///
/// Implementations live in the binary and can display progress in
/// various ways (spinner, plain stderr lines, nothing).
pub trait WorkflowProgress: Send + Sync {
    /// Called when a stage starts
    fn on_stage(&self, stage: Stage, retry_count: u32);

    /// Called when the query is rewritten
    fn on_query_refined(&self, _query: &str, _retry_count: u32) {}

    /// Called once the run produced its reply
    fn on_run_complete(&self, _intent: Intent, _confidence: f64) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl WorkflowProgress for NoProgress {
    fn on_stage(&self, _stage: Stage, _retry_count: u32) {}
}
