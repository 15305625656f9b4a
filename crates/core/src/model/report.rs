use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReportError {
    #[error("answer log has {answers} entries for {total} questions")]
    TooManyAnswers { answers: usize, total: usize },

    #[error("too many questions for a single quiz: {len}")]
    TooManyQuestions { len: usize },
}

/// One evaluated answer, appended exactly once per submitted question, in
/// play order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub question_text: String,
    pub chosen_option_text: String,
    pub correct_option_text: String,
    pub was_correct: bool,
}

/// Aggregate result of a completed quiz attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizReport {
    score: u32,
    total: u32,
    percentage: u32,
    answers: Vec<AnswerRecord>,
    completed_at: DateTime<Utc>,
}

impl QuizReport {
    /// Build a report from the answer log of a finished attempt.
    ///
    /// The score is recomputed from the log rather than trusted, so it
    /// always equals the number of correct records; the percentage is the
    /// rounded share of correct answers (0 for an empty quiz).
    ///
    /// # Errors
    ///
    /// Returns `ReportError::TooManyAnswers` if the log is longer than the
    /// question count, or `ReportError::TooManyQuestions` if the count
    /// cannot fit in `u32`.
    pub fn from_answers(
        answers: Vec<AnswerRecord>,
        total: usize,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, ReportError> {
        if answers.len() > total {
            return Err(ReportError::TooManyAnswers {
                answers: answers.len(),
                total,
            });
        }
        let total =
            u32::try_from(total).map_err(|_| ReportError::TooManyQuestions { len: total })?;

        let mut score = 0_u32;
        for answer in &answers {
            if answer.was_correct {
                score = score.saturating_add(1);
            }
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let percentage = if total == 0 {
            0
        } else {
            (f64::from(score) * 100.0 / f64::from(total)).round() as u32
        };

        Ok(Self {
            score,
            total,
            percentage,
            answers,
            completed_at,
        })
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn percentage(&self) -> u32 {
        self.percentage
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
