//! HTTP client for the form generation service

use super::{ensure_prompt, FormGenerator, GenerationConfig, GenerationError};
use crate::form::{validate_questions, Question};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

/// Longest slice of an error body copied into error messages
const BODY_EXCERPT_LEN: usize = 200;

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    topic: &'a str,
}

/// Issues one `POST {base}/openai` per call. Holds no per-call state.
pub struct HttpGenerationClient {
    client: Client,
    endpoint: String,
}

impl HttpGenerationClient {
    pub fn new(config: &GenerationConfig) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            endpoint: config.endpoint(),
        })
    }
}

#[async_trait]
impl FormGenerator for HttpGenerationClient {
    async fn generate(&self, prompt: &str) -> Result<Vec<Question>, GenerationError> {
        ensure_prompt(prompt)?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(&GenerationRequest { topic: prompt })
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(GenerationError::service(format!(
                "HTTP {status}: {}",
                excerpt(&body)
            )));
        }

        let payload: Value = serde_json::from_str(&body).map_err(|e| {
            GenerationError::malformed(format!(
                "Failed to parse response: {e} - body: {}",
                excerpt(&body)
            ))
        })?;

        Ok(validate_questions(payload)?)
    }
}

fn classify_transport_error(e: reqwest::Error) -> GenerationError {
    if e.is_timeout() {
        GenerationError::network(format!("Request timeout: {e}"))
    } else if e.is_connect() {
        GenerationError::network(format!("Connection failed: {e}"))
    } else {
        GenerationError::network(format!("Request failed: {e}"))
    }
}

fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => body.get(..idx).unwrap_or(body),
        None => body,
    }
}
