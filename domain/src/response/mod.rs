//! Response domain
//!
//! Post-generation policy: sanitization stages, the identity guardrail,
//! structural validation with its repair table, and confidence scoring.

pub mod confidence;
pub mod guardrail;
pub mod sanitize;
pub mod validation;

pub use confidence::ConfidencePolicy;
pub use guardrail::{GuardrailOutcome, IdentityProfile};
pub use sanitize::ResponseSanitizer;
pub use validation::{FailureKind, RepairAction, ValidationPolicy, ValidationVerdict};
