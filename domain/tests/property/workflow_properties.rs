use proptest::prelude::*;
use ragloop_domain::retrieval::fuzzy::candidate_terms;
use ragloop_domain::{
    Event, FailureKind, QualityPolicy, QualityVerdict, QueryRefiner, RefinementStrategy,
    RetrievedChunk, Stage, ValidationVerdict, WorkflowState, transition,
};
use ragloop_domain::retrieval::extract_keywords;

const WORDS: &[&str] = &[
    "프로젝트", "일정", "일정이", "예산을", "리스크", "이슈는", "스프린트", "마일스톤", "budget",
    "Schedule", "어떻게", "되나요?", "알려줘", "현황", "담당자", "회의록", "3월",
];

fn sentence() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(WORDS), 0..8).prop_map(|w| w.join(" "))
}

/// Drive the state machine with scripted quality scores and validity flags.
/// Returns the final state and the number of transitions taken.
fn drive(max_retries: u32, scores: &[f64], validity: &[bool]) -> (WorkflowState, usize) {
    let policy = QualityPolicy::default();
    let refiner = QueryRefiner::default();
    let mut state = WorkflowState::new("프로젝트 일정이 어떻게 되나요?");
    let mut stage = Stage::ClassifyCoarse;
    let mut recovery = false;
    let (mut s, mut v, mut steps) = (0, 0, 0);

    while !stage.is_terminal() && steps < 1000 {
        steps += 1;
        let event = match stage {
            Stage::ClassifyCoarse => Event::Uncertain,
            Stage::Retrieve if recovery => {
                recovery = false;
                Event::RecoveryRetrieved
            }
            Stage::Retrieve => Event::Retrieved,
            Stage::AssessQuality => {
                let score = scores[s % scores.len()];
                s += 1;
                state.set_quality(QualityVerdict {
                    score,
                    reasons: vec![],
                });
                state.quality_event(&policy, max_retries)
            }
            Stage::Refine => {
                let refinement = refiner.refine(
                    state.message(),
                    &state.current_query,
                    state.retry_count(),
                    &[],
                );
                state.apply_refinement(refinement);
                Event::Refined
            }
            Stage::ClassifyFinal => Event::Classified,
            Stage::Synthesize => Event::Generated,
            Stage::Validate => {
                let ok = validity[v % validity.len()];
                v += 1;
                let verdict = if ok {
                    ValidationVerdict::valid()
                } else {
                    ValidationVerdict::invalid(FailureKind::Empty, "empty")
                };
                state.validation_event(&verdict, max_retries)
            }
            Stage::Repair => {
                let query = FailureKind::Empty.repair_action().apply(&state.current_query);
                state.apply_repair(query);
                recovery = true;
                Event::Repaired
            }
            Stage::Done => unreachable!(),
        };
        stage = transition(stage, event).expect("driver only emits valid events");
    }
    assert!(stage.is_terminal());
    (state, steps)
}

proptest! {
    #[test]
    fn quality_score_is_bounded(count in 0usize..50, ratio in 0.0f64..=1.0) {
        let score = QualityPolicy::default().score(count, ratio);
        prop_assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn quality_score_monotone_in_chunk_count(count in 0usize..20, ratio in 0.0f64..=1.0) {
        let policy = QualityPolicy::default();
        prop_assert!(policy.score(count, ratio) <= policy.score(count + 1, ratio));
    }

    #[test]
    fn quality_score_monotone_in_match_ratio(
        count in 0usize..20,
        a in 0.0f64..=1.0,
        b in 0.0f64..=1.0,
    ) {
        let policy = QualityPolicy::default();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(policy.score(count, low) <= policy.score(count, high));
    }

    #[test]
    fn keywords_are_substrings_of_query(query in sentence()) {
        for keyword in extract_keywords(&query) {
            prop_assert!(keyword.chars().count() >= 2);
            prop_assert!(query.contains(&keyword));
        }
    }

    #[test]
    fn run_terminates_within_retry_budget(
        max_retries in 0u32..8,
        scores in prop::collection::vec(0.0f64..=1.0, 1..10),
        validity in prop::collection::vec(any::<bool>(), 1..4),
    ) {
        let (state, steps) = drive(max_retries, &scores, &validity);
        prop_assert!(state.retry_count() <= max_retries);
        prop_assert!(steps <= 11 + 3 * max_retries as usize);
    }

    #[test]
    fn corpus_term_comes_from_documents(
        docs in prop::collection::vec(sentence(), 1..5),
    ) {
        let query = "프로젝트 일정이 어떻게 되나요?";
        let chunks: Vec<RetrievedChunk> =
            docs.iter().map(|d| RetrievedChunk::new(d.clone(), 0.8)).collect();
        let refinement = QueryRefiner::default().refine(query, query, 1, &chunks);

        if refinement.strategy == RefinementStrategy::CorpusTerm {
            prop_assert!(candidate_terms(&docs).contains(&refinement.query));
            let keywords = extract_keywords(query);
            prop_assert!(
                !keywords.iter().any(|k| k.to_lowercase() == refinement.query.to_lowercase())
            );
        }
    }
}
