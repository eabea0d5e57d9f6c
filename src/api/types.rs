//! API request and response types

use serde::{Deserialize, Serialize};

/// Request to submit or resubmit a prompt
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub prompt: String,
}

/// Response for submit and resubmit
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub accepted: bool,
}

/// Response for conversation creation
#[derive(Debug, Serialize)]
pub struct CreateConversationResponse {
    pub id: String,
}

/// Response for reset and delete
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
