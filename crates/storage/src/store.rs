use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

/// How many change notifications a slow subscriber may lag behind.
const EVENT_BUFFER: usize = 16;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage quota exceeded")]
    QuotaExceeded,
}

/// Notification that a key in a shared store changed.
///
/// `value` is the new payload, or `None` when the key was cleared. Writers
/// receive echoes of their own writes; subscribers must treat a redundant
/// replace as harmless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    pub key: String,
    pub value: Option<String>,
}

/// Contract for a scoped key-value store holding whole-document payloads.
///
/// Writes are whole-value replaces, so a failed write leaves the previous
/// durable state intact. Every successful write notifies all subscribers of
/// the same store instance.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the payload stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the payload stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Subscribe to change notifications for every key in this store.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}

/// Simple in-memory store for testing and prototyping.
#[derive(Clone)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    events: broadcast::Sender<StoreEvent>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            events,
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        {
            let mut guard = self
                .entries
                .lock()
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            guard.insert(key.to_owned(), value.to_owned());
        }
        // No subscribers is fine; notifications are best-effort.
        let _ = self.events.send(StoreEvent {
            key: key.to_owned(),
            value: Some(value.to_owned()),
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_a_payload() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", "[1,2]").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("[1,2]".to_owned()));

        store.set("k", "[]").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("[]".to_owned()));
    }

    #[tokio::test]
    async fn writes_notify_subscribers_including_the_writer() {
        let store = InMemoryStore::new();
        let mut events = store.subscribe();

        store.set("quiz", "[]").await.unwrap();

        let event = events.recv().await.unwrap();
        assert_eq!(
            event,
            StoreEvent {
                key: "quiz".to_owned(),
                value: Some("[]".to_owned()),
            }
        );
    }

    #[tokio::test]
    async fn clones_share_entries_and_events() {
        let store = InMemoryStore::new();
        let peer = store.clone();
        let mut events = peer.subscribe();

        store.set("shared", "x").await.unwrap();

        assert_eq!(peer.get("shared").await.unwrap(), Some("x".to_owned()));
        assert_eq!(events.recv().await.unwrap().key, "shared");
    }
}
