//! Pure state transition function
//!
//! Given the same state, context and event this always produces the same
//! new state and effects. Clocks, ids, timers and network calls live in the
//! runtime.

use super::state::Phase;
use super::{ConvContext, ConvState, Effect, Event};
use crate::form::Question;
use crate::generation::GenerationErrorKind;
use thiserror::Error;

/// Assistant reply appended when a generation fails, whatever the cause
pub const APOLOGY_MESSAGE: &str = "I apologize, but I encountered an error while generating your form. Please try again with a different description.";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    /// Event acknowledged but ignored
    pub fn unchanged(state: &ConvState) -> Self {
        Self::new(state.clone())
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Cannot submit while {phase}; reset the conversation first")]
    InvalidState { phase: Phase },
    #[error("Prompt is empty")]
    EmptyInput,
}

/// Pure transition function
pub fn transition(
    state: &ConvState,
    context: &ConvContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state.phase, event) {
        // ============================================================
        // Submission
        // ============================================================

        (Phase::Idle, Event::Submit { prompt }) => begin_generation(state, prompt),

        (phase, Event::Submit { .. }) => Err(TransitionError::InvalidState { phase }),

        // Resubmit never stacks a second request on one in flight
        (Phase::Generating, Event::Resubmit { .. }) => Err(TransitionError::InvalidState {
            phase: Phase::Generating,
        }),

        (Phase::Idle | Phase::Presenting, Event::Resubmit { prompt }) => {
            let cleared = reset_state(state);
            let started = begin_generation(&cleared, prompt)?;
            Ok(TransitionResult::new(started.new_state)
                .with_effect(Effect::StopProgress)
                .with_effect(Effect::ClearMessages)
                .with_effects(started.effects))
        }

        // ============================================================
        // Reset (any phase)
        // ============================================================

        (_, Event::Reset) => Ok(TransitionResult::new(reset_state(state))
            .with_effect(Effect::StopProgress)
            .with_effect(Effect::ClearMessages)
            .with_effect(Effect::PublishSnapshot)),

        // ============================================================
        // Progress
        // ============================================================

        (Phase::Generating, Event::ProgressTick { epoch, stage }) if epoch == state.epoch => {
            // Never move backwards, never past the last stage
            let next = stage.min(context.max_stage).max(state.stage_index);
            if next == state.stage_index {
                return Ok(TransitionResult::unchanged(state));
            }
            Ok(TransitionResult::new(ConvState {
                stage_index: next,
                ..state.clone()
            })
            .with_effect(Effect::PublishSnapshot))
        }

        // ============================================================
        // Generation outcome
        // ============================================================

        // A form with no questions is not a form
        (Phase::Generating, Event::GenerationComplete { epoch, questions })
            if epoch == state.epoch && questions.is_empty() =>
        {
            Ok(fail_generation(state, GenerationErrorKind::MalformedResponse))
        }

        (Phase::Generating, Event::GenerationComplete { epoch, questions })
            if epoch == state.epoch =>
        {
            Ok(commit_questions(state, context, questions))
        }

        (Phase::Generating, Event::GenerationFailed { epoch, error }) if epoch == state.epoch => {
            Ok(fail_generation(state, error.kind))
        }

        // ============================================================
        // Stale results
        // ============================================================

        // Ticks and outcomes from an older epoch, or arriving after the
        // conversation left Generating, are dropped without a trace.
        (
            _,
            Event::ProgressTick { .. }
            | Event::GenerationComplete { .. }
            | Event::GenerationFailed { .. },
        ) => Ok(TransitionResult::unchanged(state)),
    }
}

fn begin_generation(
    state: &ConvState,
    prompt: String,
) -> Result<TransitionResult, TransitionError> {
    if prompt.trim().is_empty() {
        return Err(TransitionError::EmptyInput);
    }

    let epoch = state.epoch + 1;
    Ok(TransitionResult::new(ConvState {
        phase: Phase::Generating,
        stage_index: 0,
        epoch,
        committed_questions: vec![],
    })
    .with_effect(Effect::user_message(prompt.clone()))
    .with_effect(Effect::PublishSnapshot)
    .with_effect(Effect::StartProgress { epoch })
    .with_effect(Effect::RequestGeneration { epoch, prompt }))
}

fn commit_questions(
    state: &ConvState,
    context: &ConvContext,
    questions: Vec<Question>,
) -> TransitionResult {
    let question_count = questions.len();
    TransitionResult::new(ConvState {
        phase: Phase::Presenting,
        stage_index: context.max_stage,
        epoch: state.epoch,
        committed_questions: questions,
    })
    .with_effect(Effect::StopProgress)
    .with_effect(Effect::assistant_message(completion_message(question_count)))
    .with_effect(Effect::PublishSnapshot)
    .with_effect(Effect::NotifyGenerationDone {
        success: true,
        question_count,
        error_kind: None,
    })
}

fn fail_generation(state: &ConvState, error_kind: GenerationErrorKind) -> TransitionResult {
    TransitionResult::new(ConvState {
        phase: Phase::Idle,
        stage_index: 0,
        epoch: state.epoch,
        committed_questions: state.committed_questions.clone(),
    })
    .with_effect(Effect::StopProgress)
    .with_effect(Effect::assistant_message(APOLOGY_MESSAGE))
    .with_effect(Effect::PublishSnapshot)
    .with_effect(Effect::NotifyGenerationDone {
        success: false,
        question_count: 0,
        error_kind: Some(error_kind),
    })
}

fn reset_state(state: &ConvState) -> ConvState {
    ConvState {
        epoch: state.epoch + 1,
        ..ConvState::default()
    }
}

/// Assistant reply for a successful generation
pub fn completion_message(question_count: usize) -> String {
    let questions = match question_count {
        1 => "1 thoughtfully designed question".to_string(),
        n => format!("{n} thoughtfully designed questions"),
    };
    format!(
        "Perfect! I've crafted a professional form with {questions}. Each question is optimized for maximum engagement and data quality. Your form is ready to collect valuable insights! 🎉"
    )
}
