use crate::model::question::{Question, ValidationError};

/// Minimum number of option slots an authoring form starts with.
const INITIAL_OPTION_SLOTS: usize = 2;

/// In-progress question being authored, not yet committed.
///
/// A draft is freely editable and carries no invariants; they are enforced
/// when [`validate`](Self::validate) turns it into a [`Question`]. Unlike the
/// structural boundary in [`Question::new`], validation here cleans the
/// input: text and options are trimmed, blank options are dropped, and the
/// correct index is clamped into the surviving range rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    text: String,
    options: Vec<String>,
    correct_index: usize,
}

impl Default for QuestionDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestionDraft {
    /// An empty draft with two blank option slots.
    #[must_use]
    pub fn new() -> Self {
        Self {
            text: String::new(),
            options: vec![String::new(); INITIAL_OPTION_SLOTS],
            correct_index: 0,
        }
    }

    /// Convenience constructor for pre-filled drafts.
    #[must_use]
    pub fn with_parts(
        text: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
    ) -> Self {
        Self {
            text: text.into(),
            options,
            correct_index,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Overwrites the option slot at `index`; out-of-range indexes are
    /// ignored.
    pub fn set_option(&mut self, index: usize, value: impl Into<String>) {
        if let Some(slot) = self.options.get_mut(index) {
            *slot = value.into();
        }
    }

    /// Appends a blank option slot.
    pub fn add_option(&mut self) {
        self.options.push(String::new());
    }

    /// Removes the option slot at `index` and remaps the correct index:
    /// removing the marked slot resets it to 0, removing an earlier slot
    /// shifts it down by one. Out-of-range indexes are ignored.
    pub fn remove_option(&mut self, index: usize) {
        if index >= self.options.len() {
            return;
        }
        self.options.remove(index);
        if self.correct_index == index {
            self.correct_index = 0;
        } else if self.correct_index > index {
            self.correct_index -= 1;
        }
    }

    /// Marks the slot at `index` as the correct answer; out-of-range indexes
    /// are ignored.
    pub fn set_correct(&mut self, index: usize) {
        if index < self.options.len() {
            self.correct_index = index;
        }
    }

    /// Clears the draft back to the empty two-slot form.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Cleans and validates the draft into a committed [`Question`].
    ///
    /// Text and options are trimmed and blank options dropped; the correct
    /// index is clamped to the last surviving option, so it is never a
    /// reason for rejection here.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyQuestionText` if the text is blank, or
    /// `ValidationError::InsufficientOptions` if fewer than two options
    /// survive trimming.
    pub fn validate(self) -> Result<Question, ValidationError> {
        let text = self.text.trim().to_owned();
        if text.is_empty() {
            return Err(ValidationError::EmptyQuestionText);
        }

        let options: Vec<String> = self
            .options
            .iter()
            .map(|option| option.trim().to_owned())
            .filter(|option| !option.is_empty())
            .collect();
        if options.len() < 2 {
            return Err(ValidationError::InsufficientOptions);
        }

        let correct_index = self.correct_index.min(options.len() - 1);
        Question::new(text, options, correct_index)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
