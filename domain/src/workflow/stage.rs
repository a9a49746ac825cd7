//! Workflow stages and the transition function
//!
//! ```text
//! ClassifyCoarse --casual--> Synthesize
//!                --uncertain--> Retrieve --> AssessQuality --proceed--> ClassifyFinal --> Synthesize
//!                                  ^              |
//!                                  +--- Refine <--+ refine
//!
//! Synthesize --generated--> Validate --passed/exhausted--> Done
//!            --canned/failed--> Done    --failed--> Repair --> Retrieve (recovery) --> ClassifyFinal
//! ```

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ClassifyCoarse,
    Retrieve,
    AssessQuality,
    Refine,
    ClassifyFinal,
    Synthesize,
    Validate,
    /// Query repair after a failed validation
    Repair,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ClassifyCoarse => "classify_coarse",
            Stage::Retrieve => "retrieve",
            Stage::AssessQuality => "assess_quality",
            Stage::Refine => "refine",
            Stage::ClassifyFinal => "classify_final",
            Stage::Synthesize => "synthesize",
            Stage::Validate => "validate",
            Stage::Repair => "repair",
            Stage::Done => "done",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a stage reports when it finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    Casual,
    Uncertain,
    Retrieved,
    /// Retrieval done as part of the recovery pass; skips the quality loop
    RecoveryRetrieved,
    QualitySufficient,
    QualityInsufficient,
    Refined,
    Classified,
    Generated,
    /// Canned or short-circuited reply that needs no validation
    Answered,
    /// Inference collaborator failed; the run ends with a fallback reply
    InferenceFailed,
    ValidationPassed,
    ValidationFailed,
    RetriesExhausted,
    Repaired,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::Casual => "casual",
            Event::Uncertain => "uncertain",
            Event::Retrieved => "retrieved",
            Event::RecoveryRetrieved => "recovery_retrieved",
            Event::QualitySufficient => "quality_sufficient",
            Event::QualityInsufficient => "quality_insufficient",
            Event::Refined => "refined",
            Event::Classified => "classified",
            Event::Generated => "generated",
            Event::Answered => "answered",
            Event::InferenceFailed => "inference_failed",
            Event::ValidationPassed => "validation_passed",
            Event::ValidationFailed => "validation_failed",
            Event::RetriesExhausted => "retries_exhausted",
            Event::Repaired => "repaired",
        }
    }
}

/// `Stage x Event -> Stage`. Any pair not in the graph is an error.
pub fn transition(stage: Stage, event: Event) -> Result<Stage, DomainError> {
    use Event as E;
    use Stage as S;

    let next = match (stage, event) {
        (S::ClassifyCoarse, E::Casual) => S::Synthesize,
        (S::ClassifyCoarse, E::Uncertain) => S::Retrieve,
        (S::Retrieve, E::Retrieved) => S::AssessQuality,
        (S::Retrieve, E::RecoveryRetrieved) => S::ClassifyFinal,
        (S::AssessQuality, E::QualitySufficient) => S::ClassifyFinal,
        (S::AssessQuality, E::QualityInsufficient) => S::Refine,
        (S::Refine, E::Refined) => S::Retrieve,
        (S::ClassifyFinal, E::Classified) => S::Synthesize,
        (S::Synthesize, E::Generated) => S::Validate,
        (S::Synthesize, E::Answered | E::InferenceFailed) => S::Done,
        (S::Validate, E::ValidationPassed | E::RetriesExhausted) => S::Done,
        (S::Validate, E::ValidationFailed) => S::Repair,
        (S::Repair, E::Repaired) => S::Retrieve,
        (stage, event) => {
            return Err(DomainError::InvalidTransition {
                stage: stage.as_str().to_string(),
                event: event.as_str().to_string(),
            });
        }
    };
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let events = [
            Event::Uncertain,
            Event::Retrieved,
            Event::QualitySufficient,
            Event::Classified,
            Event::Generated,
            Event::ValidationPassed,
        ];
        let mut stage = Stage::ClassifyCoarse;
        for event in events {
            stage = transition(stage, event).unwrap();
        }
        assert_eq!(stage, Stage::Done);
    }

    #[test]
    fn test_refinement_cycle() {
        assert_eq!(
            transition(Stage::AssessQuality, Event::QualityInsufficient).unwrap(),
            Stage::Refine
        );
        assert_eq!(transition(Stage::Refine, Event::Refined).unwrap(), Stage::Retrieve);
    }

    #[test]
    fn test_recovery_pass_skips_quality_loop() {
        let mut stage = Stage::Validate;
        stage = transition(stage, Event::ValidationFailed).unwrap();
        assert_eq!(stage, Stage::Repair);
        stage = transition(stage, Event::Repaired).unwrap();
        assert_eq!(stage, Stage::Retrieve);
        stage = transition(stage, Event::RecoveryRetrieved).unwrap();
        assert_eq!(stage, Stage::ClassifyFinal);
    }

    #[test]
    fn test_casual_goes_straight_to_synthesis() {
        let stage = transition(Stage::ClassifyCoarse, Event::Casual).unwrap();
        assert_eq!(stage, Stage::Synthesize);
        assert_eq!(transition(stage, Event::Answered).unwrap(), Stage::Done);
    }

    #[test]
    fn test_invalid_transition() {
        let err = transition(Stage::Done, Event::Retrieved).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidTransition {
                stage: "done".to_string(),
                event: "retrieved".to_string(),
            }
        );
        assert!(transition(Stage::Retrieve, Event::Casual).is_err());
    }

    #[test]
    fn test_done_is_terminal() {
        assert!(Stage::Done.is_terminal());
        assert!(!Stage::Validate.is_terminal());
    }
}
