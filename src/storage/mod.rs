//! Local chat-session store
//!
//! Sessions live in a [`KeyValueStore`] under three kinds of keys: the
//! current-session pointer, the session index, and one message list per
//! session. Every change that list views care about is published on a single
//! broadcast channel, whether the reader lives in the same component or not.

use crate::error::{MinichatError, Result};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::broadcast;
use ulid::Ulid;

pub mod backend;
pub mod buckets;
pub mod types;

pub use backend::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore, HISTORY_DB_ENV};
pub use buckets::{bucket_index, SidebarBuckets};
pub use types::{derive_title, IndexEntry, Message, Role, StoreEvent, TITLE_MAX_CHARS};

/// Key holding the current session id
pub const CURRENT_SESSION_KEY: &str = "current_chat_id";
/// Key holding the JSON session index
pub const INDEX_KEY: &str = "chat_history";
/// Key holding the last display name entered
pub const DISPLAY_NAME_KEY: &str = "chat_username";
/// Prefix of the per-session message keys
pub const MESSAGES_KEY_PREFIX: &str = "chat_messages/";

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Title used for a session whose message list is empty
const UNTITLED: &str = "New chat";

/// Session store over an injected key-value backend
///
/// Cloning is cheap; clones share the backend and the notification channel.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
    events: broadcast::Sender<StoreEvent>,
}

impl SessionStore {
    /// Wrap a backend
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { backend, events }
    }

    /// Store backed by the on-disk SQLite database
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Arc::new(SqliteKeyValueStore::new()?)))
    }

    /// Store that forgets everything when dropped
    ///
    /// # Examples
    ///
    /// ```
    /// use minichat::storage::SessionStore;
    ///
    /// let store = SessionStore::in_memory();
    /// assert!(store.list_index().unwrap().is_empty());
    /// ```
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKeyValueStore::new()))
    }

    /// Subscribe to store notifications
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Allocate a fresh session id and make it current
    ///
    /// No index entry is written until the first message is persisted.
    pub fn create_session(&self) -> Result<String> {
        let id = format!("chat_{}", Ulid::new());
        self.backend.set(CURRENT_SESSION_KEY, &id)?;
        tracing::debug!(session_id = %id, "Created session");
        Ok(id)
    }

    /// The current session id, if any
    pub fn current_session(&self) -> Result<Option<String>> {
        Ok(self
            .backend
            .get(CURRENT_SESSION_KEY)?
            .filter(|id| !id.is_empty()))
    }

    /// The display name saved by an earlier chat, if any
    pub fn display_name(&self) -> Result<Option<String>> {
        Ok(self
            .backend
            .get(DISPLAY_NAME_KEY)?
            .filter(|name| !name.trim().is_empty()))
    }

    /// Remember the display name for the next chat
    pub fn set_display_name(&self, name: &str) -> Result<()> {
        self.backend.set(DISPLAY_NAME_KEY, name)
    }

    /// Messages stored for `id`, or an empty list if there is no readable record
    pub fn load_session(&self, id: &str) -> Result<Vec<Message>> {
        let Some(raw) = self.backend.get(&messages_key(id))? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(messages) => Ok(messages),
            Err(e) => {
                tracing::warn!(session_id = %id, "Ignoring unreadable session record: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Replace the messages of `id` and refresh its index entry
    ///
    /// A new entry goes to the front of the index; an existing entry is
    /// updated where it stands. Emits [`StoreEvent::HistoryChanged`].
    pub fn append_and_persist(&self, id: &str, messages: &[Message]) -> Result<()> {
        let messages_json = serde_json::to_string(messages)
            .map_err(|e| MinichatError::Storage(format!("Failed to serialize messages: {}", e)))?;
        self.backend.set(&messages_key(id), &messages_json)?;

        let entry = IndexEntry {
            id: id.to_string(),
            title: messages
                .first()
                .map(|m| derive_title(&m.content))
                .unwrap_or_else(|| UNTITLED.to_string()),
            timestamp: Utc::now(),
        };

        let mut index = self.list_index()?;
        match index.iter_mut().find(|e| e.id == id) {
            Some(existing) => *existing = entry,
            None => index.insert(0, entry),
        }
        self.write_index(&index)?;

        tracing::debug!(
            session_id = %id,
            messages = messages.len(),
            "Persisted session"
        );
        self.publish(StoreEvent::HistoryChanged);
        Ok(())
    }

    /// The session index in stored order
    pub fn list_index(&self) -> Result<Vec<IndexEntry>> {
        let Some(raw) = self.backend.get(INDEX_KEY)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(index) => Ok(index),
            Err(e) => {
                tracing::warn!("Ignoring unreadable session index: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Resolve a full id or a unique id prefix against the index
    ///
    /// Matching is case-insensitive, since ULIDs are often typed in lowercase.
    pub fn resolve_id(&self, id_or_prefix: &str) -> Result<String> {
        let needle = id_or_prefix.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return Err(MinichatError::SessionNotFound(id_or_prefix.to_string()).into());
        }

        let index = self.list_index()?;
        if let Some(exact) = index.iter().find(|e| e.id.to_ascii_lowercase() == needle) {
            return Ok(exact.id.clone());
        }

        let mut matches = index
            .iter()
            .filter(|e| e.id.to_ascii_lowercase().starts_with(&needle));
        match (matches.next(), matches.next()) {
            (Some(only), None) => Ok(only.id.clone()),
            (Some(_), Some(_)) => Err(MinichatError::SessionNotFound(format!(
                "{} (ambiguous prefix)",
                id_or_prefix
            ))
            .into()),
            _ => Err(MinichatError::SessionNotFound(id_or_prefix.to_string()).into()),
        }
    }

    /// Make an indexed session current and announce the selection
    ///
    /// Returns the resolved id. Emits [`StoreEvent::SessionSelected`].
    pub fn select_session(&self, id_or_prefix: &str) -> Result<String> {
        let id = self.resolve_id(id_or_prefix)?;
        self.backend.set(CURRENT_SESSION_KEY, &id)?;
        tracing::debug!(session_id = %id, "Selected session");
        self.publish(StoreEvent::SessionSelected(id.clone()));
        Ok(id)
    }

    /// Remove a session and its index entry
    ///
    /// Returns the removed id, or `None` when nothing matched. The index entry
    /// goes first so the index never names a missing session.
    pub fn delete_session(&self, id_or_prefix: &str) -> Result<Option<String>> {
        let id = match self.resolve_id(id_or_prefix) {
            Ok(id) => id,
            Err(e) => match e.downcast_ref::<MinichatError>() {
                Some(MinichatError::SessionNotFound(_)) => return Ok(None),
                _ => return Err(e),
            },
        };

        let index: Vec<IndexEntry> = self
            .list_index()?
            .into_iter()
            .filter(|e| e.id != id)
            .collect();
        self.write_index(&index)?;
        self.backend.remove(&messages_key(&id))?;

        if self.current_session()?.as_deref() == Some(id.as_str()) {
            self.backend.remove(CURRENT_SESSION_KEY)?;
        }

        tracing::info!(session_id = %id, "Deleted session");
        self.publish(StoreEvent::HistoryChanged);
        Ok(Some(id))
    }

    fn write_index(&self, index: &[IndexEntry]) -> Result<()> {
        let json = serde_json::to_string(index)
            .map_err(|e| MinichatError::Storage(format!("Failed to serialize index: {}", e)))?;
        self.backend.set(INDEX_KEY, &json)
    }

    fn publish(&self, event: StoreEvent) {
        // No receivers is fine: nobody is listening yet.
        let _ = self.events.send(event);
    }
}

fn messages_key(id: &str) -> String {
    format!("{}{}", MESSAGES_KEY_PREFIX, id)
}
