//! Port for structured run transcripts.
//!
//! Defines the [`ConversationLogger`] trait for recording workflow events
//! (retrieval attempts, refinements, synthesis, validation) to a structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures each run
//! in a machine-readable format (JSONL).

use chrono::{DateTime, Utc};
use serde_json::Value;

/// A structured workflow event for logging.
///
/// Each event has a type string, a UTC timestamp, and a JSON payload
/// containing event-specific fields.
pub struct ConversationEvent {
    /// Event type identifier (e.g., "retrieval", "validation", "run_completed").
    pub event_type: &'static str,
    pub timestamp: DateTime<Utc>,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    /// Create a new event stamped with the current UTC time.
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Port for logging workflow events to a structured log.
///
/// `log` is synchronous and non-fallible; a failed write must not disturb
/// the run.
pub trait ConversationLogger: Send + Sync {
    /// Record an event.
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
