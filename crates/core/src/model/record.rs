use serde::{Deserialize, Serialize};

use crate::model::question::{Question, ValidationError};
use crate::model::report::QuizReport;

//
// ─── QUESTION WIRE FORMAT ──────────────────────────────────────────────────────
//

/// Wire shape of one persisted, imported, or exported question.
///
/// This mirrors [`Question`] so codecs can serialize without leaking storage
/// concerns into the domain, and is the interchange shape shared with
/// external question generators. Carrying no invariants of its own, a record
/// only enters the domain through [`into_question`](Self::into_question).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub question: String,
    pub answers: Vec<String>,
    pub correct_answer_index: usize,
}

impl QuestionRecord {
    #[must_use]
    pub fn from_question(question: &Question) -> Self {
        Self {
            question: question.text().to_owned(),
            answers: question.options().to_vec(),
            correct_answer_index: question.correct_index(),
        }
    }

    /// Convert the record into a domain [`Question`].
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the record violates any structural
    /// invariant (blank text, fewer than two options, blank option, index
    /// out of range).
    pub fn into_question(self) -> Result<Question, ValidationError> {
        Question::new(self.question, self.answers, self.correct_answer_index)
    }
}

//
// ─── RESULTS WIRE FORMAT ───────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportAnswerRecord {
    pub question: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
}

/// Wire shape of a completed quiz report, with an ISO-8601 completion
/// timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub answers: Vec<ReportAnswerRecord>,
    pub completed_at: String,
}

impl ReportRecord {
    #[must_use]
    pub fn from_report(report: &QuizReport) -> Self {
        let answers = report
            .answers()
            .iter()
            .map(|answer| ReportAnswerRecord {
                question: answer.question_text.clone(),
                user_answer: answer.chosen_option_text.clone(),
                correct_answer: answer.correct_option_text.clone(),
                is_correct: answer.was_correct,
            })
            .collect();

        Self {
            score: report.score(),
            total: report.total(),
            percentage: report.percentage(),
            answers,
            completed_at: report.completed_at().to_rfc3339(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::report::AnswerRecord;
    use crate::time::fixed_now;

    fn question() -> Question {
        Question::new("2+2?", vec!["3".into(), "4".into(), "5".into()], 1).unwrap()
    }

    #[test]
    fn record_mirrors_question() {
        let record = QuestionRecord::from_question(&question());
        assert_eq!(record.question, "2+2?");
        assert_eq!(record.answers, vec!["3", "4", "5"]);
        assert_eq!(record.correct_answer_index, 1);
        assert_eq!(record.into_question().unwrap(), question());
    }

    #[test]
    fn record_rejects_out_of_range_index() {
        let record = QuestionRecord {
            question: "x".into(),
            answers: vec!["a".into(), "b".into()],
            correct_answer_index: 2,
        };
        assert!(record.into_question().is_err());
    }

    #[test]
    fn record_uses_camel_case_field_names() {
        let json = serde_json::to_string(&QuestionRecord::from_question(&question())).unwrap();
        assert!(json.contains("\"question\""));
        assert!(json.contains("\"answers\""));
        assert!(json.contains("\"correctAnswerIndex\""));
    }

    #[test]
    fn report_record_carries_iso_timestamp() {
        let report = QuizReport::from_answers(
            vec![AnswerRecord {
                question_text: "2+2?".into(),
                chosen_option_text: "4".into(),
                correct_option_text: "4".into(),
                was_correct: true,
            }],
            1,
            fixed_now(),
        )
        .unwrap();

        let record = ReportRecord::from_report(&report);
        assert_eq!(record.score, 1);
        assert_eq!(record.total, 1);
        assert_eq!(record.percentage, 100);
        assert_eq!(record.answers.len(), 1);
        assert_eq!(record.answers[0].user_answer, "4");
        assert!(record.answers[0].is_correct);
        assert_eq!(record.completed_at, fixed_now().to_rfc3339());
    }
}
