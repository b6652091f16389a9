//! Session list
//!
//! Keeps a snapshot of the session index, refreshes it when the store
//! announces a change, and hands session selections back to the store so the
//! chat view can pick them up.

use crate::error::Result;
use crate::storage::{bucket_index, IndexEntry, SessionStore, SidebarBuckets, StoreEvent};
use chrono::{DateTime, Local, TimeZone};
use colored::Colorize;
use tokio::sync::broadcast::{self, error::TryRecvError};

/// Observer of the session index
pub struct Sidebar {
    store: SessionStore,
    events: broadcast::Receiver<StoreEvent>,
    entries: Vec<IndexEntry>,
}

impl Sidebar {
    /// Subscribe to `store` and load the index
    pub fn new(store: SessionStore) -> Result<Self> {
        let events = store.subscribe();
        let entries = store.list_index()?;
        Ok(Self {
            store,
            events,
            entries,
        })
    }

    /// Snapshot of the index as of the last reload
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Re-read the index from the store
    ///
    /// This also picks up writes made by other processes sharing the store.
    pub fn reload(&mut self) -> Result<()> {
        self.entries = self.store.list_index()?;
        Ok(())
    }

    /// Apply pending store notifications
    ///
    /// Returns true when the index was reloaded.
    pub fn sync(&mut self) -> Result<bool> {
        let mut changed = false;
        loop {
            match self.events.try_recv() {
                Ok(StoreEvent::HistoryChanged) => changed = true,
                Ok(StoreEvent::SessionSelected(_)) => {}
                Err(TryRecvError::Lagged(_)) => changed = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        if changed {
            self.reload()?;
        }
        Ok(changed)
    }

    /// Group the snapshot relative to `now`
    pub fn buckets<Tz: TimeZone>(&self, now: DateTime<Tz>) -> SidebarBuckets {
        bucket_index(&self.entries, now)
    }

    /// Open a session by id or unique prefix
    ///
    /// The store makes it current and announces the selection to the chat view.
    pub fn select(&self, id_or_prefix: &str) -> Result<String> {
        self.store.select_session(id_or_prefix)
    }

    /// Render the grouped list for the terminal
    pub fn render(&self, current: Option<&str>) -> String {
        render_buckets(&self.buckets(Local::now()), current)
    }
}

/// Render grouped entries, marking the current session
///
/// Sessions older than the lookback window are summarized in a trailing count.
pub fn render_buckets(buckets: &SidebarBuckets, current: Option<&str>) -> String {
    let mut out = String::new();
    if buckets.is_empty() {
        out.push_str(&format!("{}\n", "No recent chats.".yellow()));
    }
    for (heading, entries) in [
        ("Today", &buckets.today),
        ("Yesterday", &buckets.yesterday),
        ("Previous 7 Days", &buckets.previous_seven_days),
    ] {
        if entries.is_empty() {
            continue;
        }
        out.push_str(&format!("{}\n", heading.bold()));
        for entry in entries {
            let marker = if current == Some(entry.id.as_str()) {
                "*"
            } else {
                " "
            };
            out.push_str(&format!(
                "{} {}  {}\n",
                marker,
                short_id(&entry.id).cyan(),
                entry.title
            ));
        }
    }
    if buckets.hidden > 0 {
        out.push_str(&format!(
            "{}\n",
            format!("{} older conversation(s) not shown", buckets.hidden).dimmed()
        ));
    }
    out
}

/// First characters of a session id, enough to pass to `/open`
pub fn short_id(id: &str) -> &str {
    let end = id
        .char_indices()
        .nth(SHORT_ID_LEN)
        .map(|(i, _)| i)
        .unwrap_or(id.len());
    &id[..end]
}

// "chat_" plus the 10 timestamp and first 3 random characters of the ULID.
const SHORT_ID_LEN: usize = 18;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Message;
    use chrono::Utc;

    #[test]
    fn test_sidebar_reloads_after_history_changed() {
        let store = SessionStore::in_memory();
        let mut sidebar = Sidebar::new(store.clone()).unwrap();
        assert!(sidebar.entries().is_empty());

        let id = store.create_session().unwrap();
        store
            .append_and_persist(&id, &[Message::user("Hello")])
            .unwrap();

        assert!(sidebar.sync().unwrap());
        assert_eq!(sidebar.entries().len(), 1);
        assert_eq!(sidebar.entries()[0].title, "Hello");
    }

    #[test]
    fn test_sidebar_sync_without_events_is_noop() {
        let store = SessionStore::in_memory();
        let mut sidebar = Sidebar::new(store).unwrap();
        assert!(!sidebar.sync().unwrap());
    }

    #[test]
    fn test_sidebar_select_publishes_selection() {
        let store = SessionStore::in_memory();
        let id = store.create_session().unwrap();
        store.append_and_persist(&id, &[Message::user("x")]).unwrap();

        let sidebar = Sidebar::new(store.clone()).unwrap();
        let mut rx = store.subscribe();
        sidebar.select(&id).unwrap();
        assert_eq!(rx.try_recv().unwrap(), StoreEvent::SessionSelected(id));
    }

    #[test]
    fn test_render_marks_current_session() {
        let entry = IndexEntry {
            id: "chat_01HZY3ABCDEFGHJKMNPQRSTVWX".to_string(),
            title: "Hello".to_string(),
            timestamp: Utc::now(),
        };
        let buckets = SidebarBuckets {
            today: vec![entry.clone()],
            ..Default::default()
        };
        let out = render_buckets(&buckets, Some(&entry.id));
        assert!(out.contains("Today"));
        assert!(out.contains("* "));
        assert!(out.contains("Hello"));
        assert!(!out.contains("Yesterday"));
    }

    #[test]
    fn test_render_empty() {
        let out = render_buckets(&SidebarBuckets::default(), None);
        assert!(out.contains("No recent chats."));
        assert!(!out.contains("not shown"));
    }

    #[test]
    fn test_render_counts_sessions_outside_lookback() {
        let only_old = SidebarBuckets {
            hidden: 2,
            ..Default::default()
        };
        let out = render_buckets(&only_old, None);
        assert!(out.contains("No recent chats."));
        assert!(out.contains("2 older conversation(s) not shown"));

        let mixed = SidebarBuckets {
            today: vec![IndexEntry {
                id: "chat_01HZY3ABCDEFGHJKMNPQRSTVWX".to_string(),
                title: "Hello".to_string(),
                timestamp: Utc::now(),
            }],
            hidden: 1,
            ..Default::default()
        };
        let out = render_buckets(&mixed, None);
        assert!(!out.contains("No recent chats."));
        assert!(out.contains("1 older conversation(s) not shown"));
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("chat_01HZY3ABCDEFGHJKMNPQRSTVWX"), "chat_01HZY3ABCDEFG");
        assert_eq!(short_id("tiny"), "tiny");
    }
}
