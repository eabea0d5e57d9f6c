//! Conversation state types

use crate::form::Question;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Phase
// ============================================================================

/// High-level mode of a conversation.
///
/// There is no failed phase: a failed generation appends an apology to the
/// transcript and releases the conversation back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Ready for a prompt
    #[default]
    Idle,
    /// Generation request in flight, progress stages advancing
    Generating,
    /// A committed form is on display
    Presenting,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Generating => "generating",
            Phase::Presenting => "presenting",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Conversation State
// ============================================================================

/// State owned by the transition function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConvState {
    pub phase: Phase,
    /// Progress cursor, only meaningful while generating
    pub stage_index: usize,
    /// Advanced by every submit and every reset; results tagged with an
    /// older epoch are discarded
    pub epoch: u64,
    /// Empty unless presenting
    pub committed_questions: Vec<Question>,
}

/// Immutable per-conversation parameters
#[derive(Debug, Clone)]
pub struct ConvContext {
    pub conversation_id: String,
    /// Highest stage index the progress cursor may reach
    pub max_stage: usize,
}

impl ConvContext {
    pub fn new(conversation_id: impl Into<String>, max_stage: usize) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            max_stage,
        }
    }
}

// ============================================================================
// Transcript
// ============================================================================

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Chat message record. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    /// Strictly increasing within a conversation, survives resets
    pub sequence: u64,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}
