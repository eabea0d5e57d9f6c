//! Form generation service abstraction
//!
//! The runtime talks to the generation service only through
//! [`FormGenerator`], so it can be driven by mocks in tests.

mod config;
mod error;
mod http;

pub use config::GenerationConfig;
pub use error::{GenerationError, GenerationErrorKind};
pub use http::HttpGenerationClient;

use crate::form::Question;
use async_trait::async_trait;
use std::sync::Arc;

/// Turns a natural-language prompt into a validated question list
#[async_trait]
pub trait FormGenerator: Send + Sync {
    /// Perform exactly one generation request. Never retries.
    async fn generate(&self, prompt: &str) -> Result<Vec<Question>, GenerationError>;
}

#[async_trait]
impl<T: FormGenerator + ?Sized> FormGenerator for Arc<T> {
    async fn generate(&self, prompt: &str) -> Result<Vec<Question>, GenerationError> {
        (**self).generate(prompt).await
    }
}

/// Reject prompts that are blank after trimming
pub fn ensure_prompt(prompt: &str) -> Result<&str, GenerationError> {
    if prompt.trim().is_empty() {
        Err(GenerationError::empty_input())
    } else {
        Ok(prompt)
    }
}

/// Logging wrapper for generators
pub struct LoggingGenerator {
    inner: Arc<dyn FormGenerator>,
    name: String,
}

impl LoggingGenerator {
    pub fn new(inner: Arc<dyn FormGenerator>, name: impl Into<String>) -> Self {
        Self {
            inner,
            name: name.into(),
        }
    }
}

#[async_trait]
impl FormGenerator for LoggingGenerator {
    async fn generate(&self, prompt: &str) -> Result<Vec<Question>, GenerationError> {
        let start = std::time::Instant::now();
        let result = self.inner.generate(prompt).await;
        let duration = start.elapsed();

        match &result {
            Ok(questions) => {
                tracing::info!(
                    generator = %self.name,
                    duration_ms = %duration.as_millis(),
                    questions = questions.len(),
                    "Form generation completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    generator = %self.name,
                    duration_ms = %duration.as_millis(),
                    kind = ?e.kind,
                    error = %e.message,
                    retryable = e.kind.is_retryable(),
                    "Form generation failed"
                );
            }
        }

        result
    }
}
