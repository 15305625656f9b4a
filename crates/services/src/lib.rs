#![forbid(unsafe_code)]

pub mod error;
pub mod generator;
pub mod repository;
pub mod session;

pub use quiz_core::Clock;

pub use error::{GeneratorError, ImportError, SessionError};
pub use generator::{Difficulty, GenerationParams, QuestionGenService};
pub use repository::{QUESTIONS_KEY, QuestionRepository};
pub use session::{PlaybackProgress, QuizSession, export_report};
