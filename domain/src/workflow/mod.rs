//! Workflow domain
//!
//! The explicit state machine that drives one run, the state it threads
//! through the stages, and the result types handed back to callers.

mod outcome;
mod stage;
mod state;

pub use outcome::{ChatOutcome, ChatReply};
pub use stage::{Event, Stage, transition};
pub use state::{Trace, WorkflowState};
