use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of characters of the first message kept in a session title
pub const TITLE_MAX_CHARS: usize = 30;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Typed by the person at the keyboard
    User,
    /// Returned by the completion endpoint
    Assistant,
}

impl Role {
    /// Wire name of the role, as used by the completion API
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single chat message
///
/// Messages are never edited after creation; a session is an append-only
/// sequence of them and that order is both display order and the order sent
/// to the completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote the message
    pub role: Role,
    /// Message text
    pub content: String,
    /// Creation time, stored as epoch milliseconds
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Message {
    /// Creates a user message stamped with the current time
    ///
    /// # Examples
    ///
    /// ```
    /// use minichat::storage::{Message, Role};
    ///
    /// let msg = Message::user("Hello");
    /// assert_eq!(msg.role, Role::User);
    /// assert!(msg.timestamp.is_some());
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Some(now_millis()),
        }
    }

    /// Creates an assistant message stamped with the current time
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Some(now_millis()),
        }
    }
}

// Stored timestamps carry millisecond precision; stamp with the same so a
// message equals its persisted copy.
fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Summary of a stored session, used to render the session list without
/// loading message bodies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Session id
    pub id: String,
    /// Derived from the first message of the session
    pub title: String,
    /// Last time the session was persisted
    pub timestamp: DateTime<Utc>,
}

/// Notification published on the store channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// The session index changed; list views should reload it
    HistoryChanged,
    /// A session was chosen from the session list; the chat view should swap to it
    SessionSelected(String),
}

/// Derives a session title from the first message content
///
/// The content is cut to [`TITLE_MAX_CHARS`] characters and `...` is appended
/// only when something was cut.
///
/// # Examples
///
/// ```
/// use minichat::storage::derive_title;
///
/// assert_eq!(derive_title("Hello"), "Hello");
/// assert_eq!(
///     derive_title("abcdefghijklmnopqrstuvwxyz0123456789"),
///     "abcdefghijklmnopqrstuvwxyz0123..."
/// );
/// ```
pub fn derive_title(content: &str) -> String {
    if content.chars().count() > TITLE_MAX_CHARS {
        let mut title: String = content.chars().take(TITLE_MAX_CHARS).collect();
        title.push_str("...");
        title
    } else {
        content.to_string()
    }
}
