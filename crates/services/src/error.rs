//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{ReportError, ValidationError};

/// Errors emitted when importing a question list from JSON text.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ImportError {
    #[error("input is not valid JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),

    #[error("top-level JSON value must be an array")]
    NotAnArray,

    #[error("question at index {index} has an invalid shape: {reason}")]
    InvalidQuestionShape { index: usize, reason: String },
}

/// Errors emitted by `QuizSession`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("quiz is not complete yet")]
    NotComplete,

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Errors emitted by `QuestionGenService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GeneratorError {
    #[error("question generation is not configured")]
    Disabled,

    #[error("requested question count {0} is outside 3..=15")]
    CountOutOfRange(u8),

    #[error("generation request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("generator returned an empty response")]
    EmptyResponse,

    #[error("generator reply contains no JSON array")]
    MissingJsonArray,

    #[error("generator reply could not be parsed: {0}")]
    UnparseableContent(#[source] serde_json::Error),

    #[error("generated question at index {index} is invalid: {source}")]
    InvalidCandidate {
        index: usize,
        #[source]
        source: ValidationError,
    },
}
