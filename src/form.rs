//! Generated form questions
//!
//! The generation service returns a bare JSON array of questions. A payload
//! is accepted only when every element is well formed; one broken question
//! rejects the whole batch.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Starter descriptions offered to a user facing an empty conversation
pub const SAMPLE_PROMPTS: [&str; 6] = [
    "Create a comprehensive customer satisfaction survey",
    "Build an employee performance evaluation form",
    "Generate a detailed product feedback questionnaire",
    "Design an event registration and preferences form",
    "Create a job application with screening questions",
    "Build a market research survey form",
];

/// Kind of input a question asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionType {
    ShortAnswer,
    Paragraph,
    MultipleChoice,
    Checkbox,
    Dropdown,
    Date,
    Time,
}

impl QuestionType {
    pub const ALL: [QuestionType; 7] = [
        QuestionType::ShortAnswer,
        QuestionType::Paragraph,
        QuestionType::MultipleChoice,
        QuestionType::Checkbox,
        QuestionType::Dropdown,
        QuestionType::Date,
        QuestionType::Time,
    ];

    /// Wire name of the type
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::ShortAnswer => "shortAnswer",
            QuestionType::Paragraph => "paragraph",
            QuestionType::MultipleChoice => "multipleChoice",
            QuestionType::Checkbox => "checkbox",
            QuestionType::Dropdown => "dropdown",
            QuestionType::Date => "date",
            QuestionType::Time => "time",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Choice-style questions must carry a non-empty option list
    pub fn requires_options(self) -> bool {
        matches!(
            self,
            QuestionType::MultipleChoice | QuestionType::Checkbox | QuestionType::Dropdown
        )
    }
}

/// A single validated form question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    /// Present only for choice-style questions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub required: bool,
}

impl Question {
    pub fn new(text: impl Into<String>, kind: QuestionType) -> Self {
        Self {
            text: text.into(),
            kind,
            options: None,
            required: false,
        }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Reasons a generation payload is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("expected a JSON array of questions, got {0}")]
    NotAnArray(&'static str),
    #[error("response contained no questions")]
    Empty,
    #[error("question {index}: {reason}")]
    InvalidQuestion { index: usize, reason: String },
}

impl ValidationError {
    fn question(index: usize, reason: impl Into<String>) -> Self {
        ValidationError::InvalidQuestion {
            index,
            reason: reason.into(),
        }
    }
}

/// Loosely typed question as it arrives on the wire
#[derive(Debug, Deserialize)]
struct RawQuestion {
    text: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    options: Option<Vec<String>>,
    #[serde(default)]
    required: Option<bool>,
}

/// Validate a decoded response body, all or nothing.
pub fn validate_questions(payload: Value) -> Result<Vec<Question>, ValidationError> {
    let Value::Array(items) = payload else {
        return Err(ValidationError::NotAnArray(json_type_name(&payload)));
    };
    if items.is_empty() {
        return Err(ValidationError::Empty);
    }

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| validate_question(index, item))
        .collect()
}

fn validate_question(index: usize, item: Value) -> Result<Question, ValidationError> {
    let raw: RawQuestion =
        serde_json::from_value(item).map_err(|e| ValidationError::question(index, e.to_string()))?;

    if raw.text.trim().is_empty() {
        return Err(ValidationError::question(index, "text is empty"));
    }

    let kind = QuestionType::from_wire(&raw.kind).ok_or_else(|| {
        ValidationError::question(index, format!("unknown question type `{}`", raw.kind))
    })?;

    let mut question = Question::new(raw.text, kind);
    if kind.requires_options() {
        let options = raw.options.unwrap_or_default();
        if options.is_empty() {
            return Err(ValidationError::question(
                index,
                format!("`{}` requires at least one option", kind.as_str()),
            ));
        }
        if let Some(pos) = options.iter().position(|o| o.trim().is_empty()) {
            return Err(ValidationError::question(
                index,
                format!("option {pos} is empty"),
            ));
        }
        question = question.with_options(options);
    }
    if raw.required.unwrap_or(false) {
        question = question.required();
    }

    Ok(question)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
