use chrono::{DateTime, Utc};

use quiz_core::model::{AnswerRecord, Question, QuizReport, ReportRecord};
use storage::store::StorageError;

use crate::error::SessionError;

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

/// Snapshot of how far a playback attempt has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackProgress {
    pub total: usize,
    pub answered: usize,
    pub score: u32,
    pub is_complete: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Scored playback over a fixed snapshot of questions.
///
/// The snapshot is captured at construction; later repository edits do not
/// affect an in-progress attempt. Each question moves through answering
/// (tentative selection, freely overwritable) to revealed (correctness
/// visible, selection frozen) and on to the next question, until advancing
/// past the last one completes the attempt. Illegal calls are idempotent
/// no-ops rather than errors, mirroring buttons that are simply inert.
///
/// A zero-question snapshot yields an inert session: nothing to select,
/// submit, or advance through.
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<Question>,
    current: usize,
    selected: Option<usize>,
    revealed: bool,
    score: u32,
    answers: Vec<AnswerRecord>,
    completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    #[must_use]
    pub fn new(snapshot: Vec<Question>) -> Self {
        Self {
            questions: snapshot,
            current: 0,
            selected: None,
            revealed: false,
            score: 0,
            answers: Vec::new(),
            completed_at: None,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.is_complete() {
            return None;
        }
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn progress(&self) -> PlaybackProgress {
        PlaybackProgress {
            total: self.total(),
            answered: self.answers.len(),
            score: self.score,
            is_complete: self.is_complete(),
        }
    }

    /// Tentatively choose an option for the current question.
    ///
    /// Reselecting before submission overwrites the prior choice. Ignored
    /// while revealed or complete, and for out-of-range indexes.
    pub fn select_option(&mut self, index: usize) {
        if self.revealed || self.is_complete() {
            return;
        }
        let Some(question) = self.questions.get(self.current) else {
            return;
        };
        if index < question.options().len() {
            self.selected = Some(index);
        }
    }

    /// Evaluate the tentative selection and reveal the answer.
    ///
    /// Scores one point iff the selection is correct and appends exactly one
    /// answer record. A second submit for the same question, or a submit
    /// with no selection, is a no-op.
    pub fn submit(&mut self) {
        if self.revealed || self.is_complete() {
            return;
        }
        let Some(selected) = self.selected else {
            return;
        };
        let Some(question) = self.questions.get(self.current) else {
            return;
        };
        let Some(chosen) = question.option(selected) else {
            return;
        };

        let was_correct = question.is_correct(selected);
        self.answers.push(AnswerRecord {
            question_text: question.text().to_owned(),
            chosen_option_text: chosen.to_owned(),
            correct_option_text: question.correct_option().to_owned(),
            was_correct,
        });
        if was_correct {
            self.score += 1;
        }
        self.revealed = true;
    }

    /// Move past a revealed answer: on to the next question, or completion
    /// after the last one.
    ///
    /// `now` becomes the completion timestamp when this call finishes the
    /// attempt. A no-op outside the revealed state.
    pub fn advance(&mut self, now: DateTime<Utc>) {
        if !self.revealed || self.is_complete() {
            return;
        }
        self.selected = None;
        self.revealed = false;
        if self.current + 1 < self.questions.len() {
            self.current += 1;
        } else {
            self.completed_at = Some(now);
        }
    }

    /// Reset to the first question over the original snapshot, from any
    /// state.
    pub fn restart(&mut self) {
        self.current = 0;
        self.selected = None;
        self.revealed = false;
        self.score = 0;
        self.answers.clear();
        self.completed_at = None;
    }

    /// The completion report for a finished attempt.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotComplete` before the attempt finishes.
    pub fn report(&self) -> Result<QuizReport, SessionError> {
        let completed_at = self.completed_at.ok_or(SessionError::NotComplete)?;
        Ok(QuizReport::from_answers(
            self.answers.clone(),
            self.questions.len(),
            completed_at,
        )?)
    }
}

/// Serialize a completed report to the results interchange format.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn export_report(report: &QuizReport) -> Result<String, StorageError> {
    serde_json::to_string_pretty(&ReportRecord::from_report(report))
        .map_err(|err| StorageError::Serialization(err.to_string()))
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_now;

    fn question(text: &str, options: &[&str], correct: usize) -> Question {
        Question::new(
            text,
            options.iter().map(|o| (*o).to_owned()).collect(),
            correct,
        )
        .unwrap()
    }

    fn arithmetic_session() -> QuizSession {
        QuizSession::new(vec![question("2+2?", &["3", "4", "5"], 1)])
    }

    #[test]
    fn correct_answer_scores_and_completes() {
        let mut session = arithmetic_session();

        session.select_option(1);
        session.submit();
        assert!(session.is_revealed());
        assert_eq!(session.score(), 1);

        session.advance(fixed_now());
        assert!(session.is_complete());

        let report = session.report().unwrap();
        assert_eq!(report.score(), 1);
        assert_eq!(report.total(), 1);
        assert_eq!(report.percentage(), 100);
        assert_eq!(report.completed_at(), fixed_now());
    }

    #[test]
    fn submit_without_selection_is_a_noop() {
        let mut session = arithmetic_session();
        session.submit();
        assert!(!session.is_revealed());
        assert!(session.answers().is_empty());
    }

    #[test]
    fn double_submit_records_one_answer() {
        let mut session = arithmetic_session();
        session.select_option(1);
        session.submit();
        session.submit();

        assert_eq!(session.answers().len(), 1);
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn reselect_overwrites_until_revealed() {
        let mut session = arithmetic_session();
        session.select_option(0);
        session.select_option(2);
        assert_eq!(session.selected(), Some(2));

        session.submit();
        session.select_option(1);
        assert_eq!(session.selected(), Some(2));
    }

    #[test]
    fn out_of_range_selection_is_ignored() {
        let mut session = arithmetic_session();
        session.select_option(9);
        assert_eq!(session.selected(), None);
    }

    #[test]
    fn advance_outside_revealed_is_a_noop() {
        let mut session = arithmetic_session();
        session.advance(fixed_now());
        assert!(!session.is_complete());
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn advance_clears_selection_between_questions() {
        let mut session = QuizSession::new(vec![
            question("one", &["a", "b"], 0),
            question("two", &["c", "d"], 1),
        ]);

        session.select_option(0);
        session.submit();
        session.advance(fixed_now());

        assert_eq!(session.current_index(), 1);
        assert_eq!(session.selected(), None);
        assert!(!session.is_revealed());
        assert_eq!(session.current_question().unwrap().text(), "two");
    }

    #[test]
    fn wrong_answer_records_but_does_not_score() {
        let mut session = arithmetic_session();
        session.select_option(0);
        session.submit();

        assert_eq!(session.score(), 0);
        let record = &session.answers()[0];
        assert_eq!(record.chosen_option_text, "3");
        assert_eq!(record.correct_option_text, "4");
        assert!(!record.was_correct);
    }

    #[test]
    fn restart_resets_over_the_original_snapshot() {
        let mut session = arithmetic_session();
        session.select_option(1);
        session.submit();
        session.advance(fixed_now());
        assert!(session.is_complete());

        session.restart();
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.score(), 0);
        assert!(session.answers().is_empty());
        assert!(!session.is_complete());
        assert_eq!(session.total(), 1);
        assert_eq!(session.current_question().unwrap().text(), "2+2?");
    }

    #[test]
    fn empty_snapshot_is_inert() {
        let mut session = QuizSession::new(Vec::new());
        assert_eq!(session.current_question(), None);

        session.select_option(0);
        session.submit();
        session.advance(fixed_now());

        assert!(!session.is_complete());
        assert!(session.answers().is_empty());
        assert!(matches!(session.report(), Err(SessionError::NotComplete)));
    }

    #[test]
    fn exported_report_uses_interchange_field_names() {
        let mut session = arithmetic_session();
        session.select_option(1);
        session.submit();
        session.advance(fixed_now());

        let json = export_report(&session.report().unwrap()).unwrap();
        assert!(json.contains("\"userAnswer\""));
        assert!(json.contains("\"correctAnswer\""));
        assert!(json.contains("\"isCorrect\""));
        assert!(json.contains("\"completedAt\""));
    }
}
