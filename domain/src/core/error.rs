//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Message is required")]
    EmptyMessage,

    #[error("No transition from stage {stage} on event {event}")]
    InvalidTransition { stage: String, event: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_message_display() {
        assert_eq!(DomainError::EmptyMessage.to_string(), "Message is required");
    }

    #[test]
    fn test_invalid_transition_display() {
        let error = DomainError::InvalidTransition {
            stage: "retrieve".to_string(),
            event: "valid".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "No transition from stage retrieve on event valid"
        );
    }
}
