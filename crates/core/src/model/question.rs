use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("question text cannot be empty")]
    EmptyQuestionText,

    #[error("a question needs at least two non-empty answer options")]
    InsufficientOptions,

    #[error("correct option index {index} is out of range for {len} options")]
    CorrectIndexOutOfRange { index: usize, len: usize },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A committed multiple-choice question.
///
/// Values of this type always satisfy the structural invariants: non-empty
/// text, at least two non-empty options, and a correct index inside the
/// option range. The only ways in are [`Question::new`] and
/// [`QuestionDraft::validate`](super::QuestionDraft::validate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    text: String,
    options: Vec<String>,
    correct_index: usize,
}

impl Question {
    /// Builds a question from already-clean parts, rejecting anything
    /// malformed.
    ///
    /// This is the structural boundary used by wholesale replacement and
    /// import: unlike draft validation it performs no trimming, no dropping
    /// of blank options, and no index clamping.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyQuestionText` for whitespace-only text,
    /// `ValidationError::InsufficientOptions` when fewer than two options are
    /// given or any option is blank, and
    /// `ValidationError::CorrectIndexOutOfRange` when the index does not
    /// address an option.
    pub fn new(
        text: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
    ) -> Result<Self, ValidationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyQuestionText);
        }
        if options.len() < 2 || options.iter().any(|option| option.trim().is_empty()) {
            return Err(ValidationError::InsufficientOptions);
        }
        if correct_index >= options.len() {
            return Err(ValidationError::CorrectIndexOutOfRange {
                index: correct_index,
                len: options.len(),
            });
        }

        Ok(Self {
            text,
            options,
            correct_index,
        })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// The option at `index`, if it exists.
    #[must_use]
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    /// The text of the correct option.
    #[must_use]
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_index]
    }

    /// Whether choosing `index` would be the correct answer.
    #[must_use]
    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct_index
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
