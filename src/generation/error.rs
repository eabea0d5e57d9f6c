//! Generation error types

use crate::form::ValidationError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Generation failure with classification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct GenerationError {
    pub kind: GenerationErrorKind,
    pub message: String,
}

impl GenerationError {
    pub fn new(kind: GenerationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn empty_input() -> Self {
        Self::new(GenerationErrorKind::EmptyInput, "Prompt is empty")
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::Network, message)
    }

    pub fn service(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::Service, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorKind::MalformedResponse, message)
    }
}

impl From<ValidationError> for GenerationError {
    fn from(err: ValidationError) -> Self {
        Self::malformed(format!("Malformed response: {err}"))
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationErrorKind {
    /// Prompt was blank, nothing was sent
    EmptyInput,
    /// Transport failure or timeout
    Network,
    /// Non-success status from the service
    Service,
    /// Body failed to parse or validate
    MalformedResponse,
}

impl GenerationErrorKind {
    /// Whether the user can sensibly try the same request again
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::Service)
    }
}
