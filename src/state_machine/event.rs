//! Events that can occur in a conversation

use crate::form::Question;
use crate::generation::GenerationError;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    Submit {
        prompt: String,
    },
    /// Reset followed by submit, applied atomically
    Resubmit {
        prompt: String,
    },
    Reset,

    // Progress simulator events
    ProgressTick {
        epoch: u64,
        stage: usize,
    },

    // Generation client events
    GenerationComplete {
        epoch: u64,
        questions: Vec<Question>,
    },
    GenerationFailed {
        epoch: u64,
        error: GenerationError,
    },
}

impl Event {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Event::Submit { .. } => "submit",
            Event::Resubmit { .. } => "resubmit",
            Event::Reset => "reset",
            Event::ProgressTick { .. } => "progress_tick",
            Event::GenerationComplete { .. } => "generation_complete",
            Event::GenerationFailed { .. } => "generation_failed",
        }
    }

    /// Epoch an asynchronous result belongs to; `None` for user events
    pub fn epoch(&self) -> Option<u64> {
        match self {
            Event::ProgressTick { epoch, .. }
            | Event::GenerationComplete { epoch, .. }
            | Event::GenerationFailed { epoch, .. } => Some(*epoch),
            Event::Submit { .. } | Event::Resubmit { .. } | Event::Reset => None,
        }
    }
}
