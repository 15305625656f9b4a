use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use quiz_core::model::{Question, QuestionDraft, QuestionRecord, ValidationError};
use storage::store::{KeyValueStore, StorageError, StoreEvent};

use crate::error::ImportError;

/// Well-known storage key shared by every instance of the app.
pub const QUESTIONS_KEY: &str = "quizapp:questions";

/// Mutations within this window coalesce into a single durable write.
const PERSIST_DEBOUNCE: Duration = Duration::from_millis(300);

//
// ─── REPOSITORY ────────────────────────────────────────────────────────────────
//

/// Owns the canonical question list: validation, mutation, durable
/// persistence, and cross-instance synchronization.
///
/// The in-memory list is the single source of truth within a process and is
/// mutated synchronously; durability is write-behind. Each mutation
/// serializes the current list and (re)starts a debounce timer, so a burst
/// of edits produces one write that reflects the latest state. The timer is
/// a cancelable task owned by the repository; construct and mutate the
/// repository inside a tokio runtime so it has somewhere to run.
pub struct QuestionRepository {
    store: Arc<dyn KeyValueStore>,
    key: String,
    questions: Vec<Question>,
    pending_flush: Option<JoinHandle<()>>,
}

impl QuestionRepository {
    /// A repository over the shared well-known key.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, QUESTIONS_KEY)
    }

    /// A repository over a custom key, for callers that scope their own.
    #[must_use]
    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            questions: Vec::new(),
            pending_flush: None,
        }
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Load the persisted list into memory.
    ///
    /// A missing key leaves the list empty; an unreadable payload is logged
    /// and discarded so a corrupt store never blocks startup.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only when the backend itself cannot be read.
    pub async fn hydrate(&mut self) -> Result<(), StorageError> {
        let Some(raw) = self.store.get(&self.key).await? else {
            return Ok(());
        };
        match decode_questions(&raw) {
            Ok(questions) => self.questions = questions,
            Err(err) => warn!(%err, "ignoring unreadable persisted question list"),
        }
        Ok(())
    }

    /// Validate a draft and append the resulting question.
    ///
    /// On failure the list is untouched and the error is surfaced to the
    /// caller for correction.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when the draft does not clean up into a
    /// valid question.
    pub fn commit(&mut self, draft: QuestionDraft) -> Result<&[Question], ValidationError> {
        let question = draft.validate()?;
        self.questions.push(question);
        self.schedule_persist();
        Ok(&self.questions)
    }

    /// Delete the question at `index`; out-of-bounds indexes are a silent
    /// no-op.
    pub fn remove(&mut self, index: usize) -> &[Question] {
        if index < self.questions.len() {
            self.questions.remove(index);
            self.schedule_persist();
        }
        &self.questions
    }

    /// Replace the whole list with externally supplied records,
    /// all-or-nothing.
    ///
    /// Every record must independently satisfy the structural invariants; no
    /// trimming or index clamping is applied. One malformed record rejects
    /// the entire operation and leaves the prior list untouched.
    ///
    /// # Errors
    ///
    /// Returns the first record's `ValidationError`.
    pub fn replace(
        &mut self,
        records: Vec<QuestionRecord>,
    ) -> Result<&[Question], ValidationError> {
        let mut next = Vec::with_capacity(records.len());
        for record in records {
            next.push(record.into_question()?);
        }
        self.questions = next;
        self.schedule_persist();
        Ok(&self.questions)
    }

    /// Parse JSON text and replace the list wholesale, reporting how many
    /// questions were imported.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::MalformedJson` when the text is not JSON,
    /// `ImportError::NotAnArray` when the top-level value is not an array,
    /// or `ImportError::InvalidQuestionShape` when any element is malformed;
    /// in every failure case the prior list is untouched.
    pub fn import(&mut self, text: &str) -> Result<usize, ImportError> {
        let questions = decode_questions(text)?;
        let count = questions.len();
        self.questions = questions;
        self.schedule_persist();
        Ok(count)
    }

    /// Serialize the list as pretty-printed JSON in the interchange shape.
    ///
    /// Export and [`import`](Self::import) round-trip: importing the
    /// exported text reproduces the same list.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if encoding fails.
    pub fn export(&self) -> Result<String, StorageError> {
        let records: Vec<QuestionRecord> = self
            .questions
            .iter()
            .map(QuestionRecord::from_question)
            .collect();
        serde_json::to_string_pretty(&records)
            .map_err(|err| StorageError::Serialization(err.to_string()))
    }

    /// Write the current list immediately, canceling any pending debounce.
    ///
    /// Call this on teardown so the final burst of edits is not lost to the
    /// timer.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if encoding or the write fails; the previous
    /// durable state is left intact in that case.
    pub async fn flush(&mut self) -> Result<(), StorageError> {
        if let Some(handle) = self.pending_flush.take() {
            handle.abort();
        }
        let payload = self.encode()?;
        self.store.set(&self.key, &payload).await?;
        debug!(count = self.questions.len(), "flushed question list");
        Ok(())
    }

    /// Receiver for change notifications on the shared store.
    ///
    /// Feed each received event to [`apply_external`](Self::apply_external).
    #[must_use]
    pub fn changes(&self) -> broadcast::Receiver<StoreEvent> {
        self.store.subscribe()
    }

    /// Apply one external change notification, last-writer-wins.
    ///
    /// Events for other keys are ignored. A well-formed payload replaces the
    /// in-memory list wholesale without re-persisting, so an echo of this
    /// instance's own write is a harmless redundant replace. Malformed
    /// payloads are logged and discarded, never propagated.
    pub fn apply_external(&mut self, event: &StoreEvent) {
        if event.key != self.key {
            return;
        }
        let raw = event.value.as_deref().unwrap_or("[]");
        match decode_questions(raw) {
            Ok(questions) => self.questions = questions,
            Err(err) => warn!(%err, "ignoring malformed cross-instance payload"),
        }
    }

    fn encode(&self) -> Result<String, StorageError> {
        let records: Vec<QuestionRecord> = self
            .questions
            .iter()
            .map(QuestionRecord::from_question)
            .collect();
        serde_json::to_string(&records).map_err(|err| StorageError::Serialization(err.to_string()))
    }

    /// Capture the current list and (re)start the debounce timer.
    fn schedule_persist(&mut self) {
        let payload = match self.encode() {
            Ok(payload) => payload,
            Err(err) => {
                warn!(%err, "failed to encode question list for persistence");
                return;
            }
        };
        if let Some(handle) = self.pending_flush.take() {
            handle.abort();
        }

        let store = Arc::clone(&self.store);
        let key = self.key.clone();
        self.pending_flush = Some(tokio::spawn(async move {
            tokio::time::sleep(PERSIST_DEBOUNCE).await;
            if let Err(err) = store.set(&key, &payload).await {
                warn!(%err, "failed to persist question list");
            }
        }));
    }
}

/// Parse JSON text into domain questions, all-or-nothing.
fn decode_questions(text: &str) -> Result<Vec<Question>, ImportError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(ImportError::MalformedJson)?;
    let serde_json::Value::Array(items) = value else {
        return Err(ImportError::NotAnArray);
    };

    let mut questions = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let record: QuestionRecord =
            serde_json::from_value(item).map_err(|err| ImportError::InvalidQuestionShape {
                index,
                reason: err.to_string(),
            })?;
        let question =
            record
                .into_question()
                .map_err(|err| ImportError::InvalidQuestionShape {
                    index,
                    reason: err.to_string(),
                })?;
        questions.push(question);
    }
    Ok(questions)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
