//! Effects produced by state transitions

use super::state::Role;
use crate::generation::GenerationErrorKind;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a message to the transcript (id and timestamp assigned by the runtime)
    AppendMessage { role: Role, content: String },

    /// Drop the whole transcript
    ClearMessages,

    /// Start the progress simulator for this epoch
    StartProgress { epoch: u64 },

    /// Stop the progress simulator (no-op if not running)
    StopProgress,

    /// Issue the generation request (spawns as background task)
    RequestGeneration { epoch: u64, prompt: String },

    /// Publish a fresh snapshot to readers
    PublishSnapshot,

    /// Tell connected clients a generation finished
    NotifyGenerationDone {
        success: bool,
        question_count: usize,
        /// Why the generation failed, `None` on success
        error_kind: Option<GenerationErrorKind>,
    },
}

impl Effect {
    pub fn user_message(content: impl Into<String>) -> Self {
        Effect::AppendMessage {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant_message(content: impl Into<String>) -> Self {
        Effect::AppendMessage {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
