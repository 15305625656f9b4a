mod draft;
mod question;
mod record;
mod report;

pub use draft::QuestionDraft;
pub use question::{Question, ValidationError};
pub use record::{QuestionRecord, ReportAnswerRecord, ReportRecord};
pub use report::{AnswerRecord, QuizReport, ReportError};
