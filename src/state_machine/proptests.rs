//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::*;
use super::transition::*;
use super::*;
use crate::form::{Question, QuestionType};
use crate::generation::{GenerationError, GenerationErrorKind};
use proptest::prelude::*;

const MAX_STAGE: usize = 4;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> ConvContext {
    ConvContext::new("test-conv", MAX_STAGE)
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_question() -> impl Strategy<Value = Question> {
    (
        "[A-Z][a-z ]{1,20}",
        proptest::sample::select(QuestionType::ALL.to_vec()),
        any::<bool>(),
    )
        .prop_map(|(text, kind, required)| {
            let question = Question::new(text, kind);
            let question = if kind.requires_options() {
                question.with_options(["Yes", "No"])
            } else {
                question
            };
            if required {
                question.required()
            } else {
                question
            }
        })
}

fn arb_error() -> impl Strategy<Value = GenerationError> {
    prop_oneof![
        Just(GenerationErrorKind::Network),
        Just(GenerationErrorKind::Service),
        Just(GenerationErrorKind::MalformedResponse),
    ]
    .prop_map(|kind| GenerationError::new(kind, "failure"))
}

fn arb_prompt() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-zA-Z][a-zA-Z ]{0,30}",
        1 => "[ \t\n]{0,3}",
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        arb_prompt().prop_map(|prompt| Event::Submit { prompt }),
        arb_prompt().prop_map(|prompt| Event::Resubmit { prompt }),
        Just(Event::Reset),
        (0u64..6, 0usize..8).prop_map(|(epoch, stage)| Event::ProgressTick { epoch, stage }),
        (0u64..6, proptest::collection::vec(arb_question(), 0..5))
            .prop_map(|(epoch, questions)| Event::GenerationComplete { epoch, questions }),
        (0u64..6, arb_error()).prop_map(|(epoch, error)| Event::GenerationFailed { epoch, error }),
    ]
}

fn arb_state() -> impl Strategy<Value = ConvState> {
    prop_oneof![
        (0u64..6).prop_map(|epoch| ConvState {
            epoch,
            ..ConvState::default()
        }),
        (0u64..6, 0usize..=MAX_STAGE).prop_map(|(epoch, stage_index)| ConvState {
            phase: Phase::Generating,
            stage_index,
            epoch,
            committed_questions: vec![],
        }),
        (0u64..6, proptest::collection::vec(arb_question(), 1..5)).prop_map(
            |(epoch, committed_questions)| ConvState {
                phase: Phase::Presenting,
                stage_index: MAX_STAGE,
                epoch,
                committed_questions,
            }
        ),
    ]
}

// ============================================================================
// State Validity Checkers
// ============================================================================

fn is_valid_state(state: &ConvState) -> bool {
    let questions_match_phase =
        (state.phase == Phase::Presenting) == !state.committed_questions.is_empty();
    state.stage_index <= MAX_STAGE && questions_match_phase
}

fn generation_requests(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, Effect::RequestGeneration { .. }))
        .count()
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // Invariant 1: Valid state after any sequence of transitions
    #[test]
    fn prop_transitions_preserve_validity(events in proptest::collection::vec(arb_event(), 0..30)) {
        let mut state = ConvState::default();
        let ctx = test_context();

        for event in events {
            if let Ok(result) = transition(&state, &ctx, event) {
                state = result.new_state;
                prop_assert!(is_valid_state(&state), "Invalid state: {:?}", state);
            }
        }
    }

    // Invariant 2: Epoch never decreases, stage never decreases within an epoch
    #[test]
    fn prop_epoch_and_stage_monotonic(events in proptest::collection::vec(arb_event(), 0..30)) {
        let mut state = ConvState::default();
        let ctx = test_context();

        for event in events {
            if let Ok(result) = transition(&state, &ctx, event) {
                let next = result.new_state;
                prop_assert!(next.epoch >= state.epoch);
                if next.epoch == state.epoch && next.phase == Phase::Generating {
                    prop_assert!(next.stage_index >= state.stage_index);
                }
                state = next;
            }
        }
    }

    // Invariant 3: At most one generation request per epoch
    #[test]
    fn prop_single_request_per_epoch(events in proptest::collection::vec(arb_event(), 0..30)) {
        let mut state = ConvState::default();
        let ctx = test_context();
        let mut requested_epochs = Vec::new();

        for event in events {
            if let Ok(result) = transition(&state, &ctx, event) {
                for effect in &result.effects {
                    if let Effect::RequestGeneration { epoch, .. } = effect {
                        prop_assert!(!requested_epochs.contains(epoch), "Second request for epoch {}", epoch);
                        prop_assert_eq!(*epoch, result.new_state.epoch);
                        requested_epochs.push(*epoch);
                    }
                }
                state = result.new_state;
            }
        }
    }

    // Invariant 4: Submissions while not idle are rejected without side effects
    #[test]
    fn prop_busy_rejects_submit(state in arb_state(), prompt in arb_prompt()) {
        prop_assume!(state.phase != Phase::Idle);
        let result = transition(&state, &test_context(), Event::Submit { prompt });
        prop_assert_eq!(result.unwrap_err(), TransitionError::InvalidState { phase: state.phase });
    }

    // Invariant 5: Results tagged with another epoch never change state
    #[test]
    fn prop_stale_results_ignored(state in arb_state(), event in arb_event()) {
        let Some(epoch) = event.epoch() else { return Ok(()); };
        prop_assume!(epoch != state.epoch);

        let result = transition(&state, &test_context(), event).unwrap();
        prop_assert_eq!(&result.new_state, &state);
        prop_assert!(result.effects.is_empty());
    }

    // Invariant 6: Reset from anywhere yields a clean idle state in a new epoch
    #[test]
    fn prop_reset_always_clean(state in arb_state()) {
        let result = transition(&state, &test_context(), Event::Reset).unwrap();
        prop_assert_eq!(
            result.new_state,
            ConvState { epoch: state.epoch + 1, ..ConvState::default() }
        );
        prop_assert!(result.effects.contains(&Effect::StopProgress));
        prop_assert!(result.effects.contains(&Effect::ClearMessages));
        prop_assert_eq!(generation_requests(&result.effects), 0);
    }

    // Invariant 7: Any failure in the current epoch releases to Idle with one apology
    #[test]
    fn prop_failure_releases_to_idle(stage in 0usize..=MAX_STAGE, epoch in 1u64..6, error in arb_error()) {
        let state = ConvState { phase: Phase::Generating, stage_index: stage, epoch, committed_questions: vec![] };
        let result = transition(&state, &test_context(), Event::GenerationFailed { epoch, error }).unwrap();

        prop_assert_eq!(result.new_state.phase, Phase::Idle);
        prop_assert!(result.new_state.committed_questions.is_empty());
        let apologies = result.effects.iter()
            .filter(|e| **e == Effect::assistant_message(APOLOGY_MESSAGE))
            .count();
        prop_assert_eq!(apologies, 1);
        prop_assert_eq!(result.effects.first(), Some(&Effect::StopProgress));
    }

    // Invariant 8: Success in the current epoch commits exactly the returned list
    #[test]
    fn prop_success_commits_all(
        stage in 0usize..=MAX_STAGE,
        epoch in 1u64..6,
        questions in proptest::collection::vec(arb_question(), 1..8),
    ) {
        let state = ConvState { phase: Phase::Generating, stage_index: stage, epoch, committed_questions: vec![] };
        let result = transition(
            &state,
            &test_context(),
            Event::GenerationComplete { epoch, questions: questions.clone() },
        ).unwrap();

        prop_assert_eq!(result.new_state.phase, Phase::Presenting);
        prop_assert_eq!(result.new_state.stage_index, MAX_STAGE);
        prop_assert_eq!(&result.new_state.committed_questions, &questions);
        let mentions_count = result.effects.iter().any(|e| matches!(
            e,
            Effect::AppendMessage { role: Role::Assistant, content } if content.contains(&questions.len().to_string())
        ));
        prop_assert!(mentions_count);
    }

    // Invariant 9: State changes are always published
    #[test]
    fn prop_state_changes_publish(state in arb_state(), event in arb_event()) {
        if let Ok(result) = transition(&state, &test_context(), event) {
            if result.new_state != state {
                prop_assert!(
                    result.effects.contains(&Effect::PublishSnapshot),
                    "State changed but no PublishSnapshot effect: {:?} -> {:?}",
                    state,
                    result.new_state
                );
            }
        }
    }
}
