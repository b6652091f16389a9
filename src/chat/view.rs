//! Chat view controller
//!
//! Owns the transient state of the conversation pane: the visible message
//! list, the current session id and the single status indicator. It is the
//! boundary where gateway failures stop; callers only ever see a
//! [`SubmitOutcome`].

use crate::error::Result;
use crate::providers::CompletionGateway;
use crate::storage::{Message, SessionStore, StoreEvent};
use std::fmt;
use tokio::sync::broadcast::{self, error::TryRecvError};

/// The one active status indicator of the chat pane
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewStatus {
    /// Ready for input
    Idle,
    /// A completion request is in flight; submitting is disabled
    AwaitingReply,
    /// The last turn failed with this message
    ErrorShown(String),
}

impl fmt::Display for ViewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::AwaitingReply => write!(f, "awaiting reply"),
            Self::ErrorShown(msg) => write!(f, "error: {}", msg),
        }
    }
}

/// Result of a submit attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing happened: blank input or a reply is still pending
    Ignored,
    /// The assistant answered with this text
    Replied(String),
    /// The turn failed; the text is what the view shows
    Failed(String),
}

/// Controller for the conversation pane
pub struct ChatView {
    store: SessionStore,
    gateway: Box<dyn CompletionGateway>,
    events: broadcast::Receiver<StoreEvent>,
    session_id: String,
    messages: Vec<Message>,
    status: ViewStatus,
}

impl ChatView {
    /// Attach to the store
    ///
    /// Loads the current session, or creates one when there is none.
    pub fn mount(store: SessionStore, gateway: Box<dyn CompletionGateway>) -> Result<Self> {
        let events = store.subscribe();

        let (session_id, messages) = match store.current_session()? {
            Some(id) => {
                let messages = store.load_session(&id)?;
                (id, messages)
            }
            None => (store.create_session()?, Vec::new()),
        };

        tracing::debug!(
            session_id = %session_id,
            messages = messages.len(),
            "Mounted chat view"
        );

        Ok(Self {
            store,
            gateway,
            events,
            session_id,
            messages,
            status: ViewStatus::Idle,
        })
    }

    /// Id of the session on screen
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Visible messages, oldest first
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Current status indicator
    pub fn status(&self) -> &ViewStatus {
        &self.status
    }

    /// The gateway used for completions
    pub fn gateway(&self) -> &dyn CompletionGateway {
        self.gateway.as_ref()
    }

    /// Mutable access to the gateway, e.g. to change the persona
    pub fn gateway_mut(&mut self) -> &mut dyn CompletionGateway {
        self.gateway.as_mut()
    }

    /// Whether `input` would be accepted by [`ChatView::submit`]
    pub fn can_submit(&self, input: &str) -> bool {
        !input.trim().is_empty() && self.status != ViewStatus::AwaitingReply
    }

    /// Run one conversational turn
    ///
    /// Blank input is ignored without touching the gateway. Otherwise the user
    /// message is shown at once, the gateway is asked for a reply, and the
    /// session is persisted. A failed turn keeps the user message, shows the
    /// error in the status indicator and never appends an assistant message.
    pub async fn submit(&mut self, input: &str) -> SubmitOutcome {
        if !self.can_submit(input) {
            return SubmitOutcome::Ignored;
        }

        self.status = ViewStatus::AwaitingReply;
        let user_message = Message::user(input.trim());
        self.messages.push(user_message.clone());

        let history_len = self.messages.len() - 1;
        let result = self
            .gateway
            .complete(&self.messages[..history_len], &user_message)
            .await;

        let outcome = match result {
            Ok(reply) => {
                self.messages.push(Message::assistant(reply.clone()));
                self.status = ViewStatus::Idle;
                SubmitOutcome::Replied(reply)
            }
            Err(e) => {
                tracing::warn!(session_id = %self.session_id, "Completion failed: {:#}", e);
                let text = failure_text(&e);
                self.status = ViewStatus::ErrorShown(text.clone());
                SubmitOutcome::Failed(text)
            }
        };

        if let Err(e) = self.store.append_and_persist(&self.session_id, &self.messages) {
            tracing::error!(session_id = %self.session_id, "Failed to save chat: {:#}", e);
            self.status = ViewStatus::ErrorShown(format!("Failed to save chat: {}", e));
        }

        outcome
    }

    /// Start a fresh, empty session and make it current
    pub fn new_session(&mut self) -> Result<()> {
        self.session_id = self.store.create_session()?;
        self.messages.clear();
        self.status = ViewStatus::Idle;
        Ok(())
    }

    /// Apply pending store notifications
    ///
    /// Returns true when the visible session changed.
    pub fn sync(&mut self) -> Result<bool> {
        let mut swapped = false;
        loop {
            match self.events.try_recv() {
                Ok(event) => swapped |= self.handle_event(event)?,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!("Chat view missed {} store notifications", skipped);
                }
            }
        }
        Ok(swapped)
    }

    /// React to one store notification
    ///
    /// A session selection swaps in the persisted messages of that session;
    /// the gateway is not contacted.
    pub fn handle_event(&mut self, event: StoreEvent) -> Result<bool> {
        match event {
            StoreEvent::SessionSelected(id) => {
                self.messages = self.store.load_session(&id)?;
                tracing::debug!(
                    session_id = %id,
                    messages = self.messages.len(),
                    "Switched chat view"
                );
                self.session_id = id;
                self.status = ViewStatus::Idle;
                Ok(true)
            }
            StoreEvent::HistoryChanged => Ok(false),
        }
    }
}

fn failure_text(error: &anyhow::Error) -> String {
    let text = error.to_string();
    if text.trim().is_empty() {
        "Request failed".to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Role;
    use crate::test_utils::ScriptedGateway;

    fn mount_with(script: Vec<std::result::Result<String, String>>) -> (ChatView, ScriptedGateway, SessionStore) {
        let store = SessionStore::in_memory();
        let gateway = ScriptedGateway::new(script);
        let view = ChatView::mount(store.clone(), Box::new(gateway.clone())).unwrap();
        (view, gateway, store)
    }

    #[tokio::test]
    async fn test_mount_creates_session_when_none_is_current() {
        let (view, _, store) = mount_with(vec![]);
        assert!(view.session_id().starts_with("chat_"));
        assert!(view.messages().is_empty());
        assert_eq!(store.current_session().unwrap().as_deref(), Some(view.session_id()));
    }

    #[tokio::test]
    async fn test_mount_restores_current_session() {
        let store = SessionStore::in_memory();
        let id = store.create_session().unwrap();
        store
            .append_and_persist(&id, &[Message::user("Hi"), Message::assistant("Hello")])
            .unwrap();

        let view = ChatView::mount(store, Box::new(ScriptedGateway::default())).unwrap();
        assert_eq!(view.session_id(), id);
        assert_eq!(view.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_submit_appends_reply_and_persists() {
        let (mut view, gateway, store) = mount_with(vec![Ok("Hi there".to_string())]);

        let outcome = view.submit("Hello").await;
        assert_eq!(outcome, SubmitOutcome::Replied("Hi there".to_string()));
        assert_eq!(view.status(), &ViewStatus::Idle);

        let roles: Vec<Role> = view.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert_eq!(view.messages()[0].content, "Hello");
        assert_eq!(view.messages()[1].content, "Hi there");

        let persisted = store.load_session(view.session_id()).unwrap();
        assert_eq!(persisted, view.messages());

        let index = store.list_index().unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].title, "Hello");
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn test_submit_sends_prior_history() {
        let (mut view, gateway, _) =
            mount_with(vec![Ok("one".to_string()), Ok("two".to_string())]);
        view.submit("first").await;
        view.submit("second").await;

        let calls = gateway.calls();
        assert_eq!(calls.len(), 2);
        let contents: Vec<&str> = calls[1].iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "one", "second"]);
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let (mut view, gateway, store) = mount_with(vec![Ok("unused".to_string())]);

        assert_eq!(view.submit("   \n\t").await, SubmitOutcome::Ignored);
        assert!(view.messages().is_empty());
        assert_eq!(gateway.call_count(), 0);
        assert!(store.list_index().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_user_message_and_shows_error() {
        let (mut view, _, store) =
            mount_with(vec![Err("Mistral API error: Unauthorized".to_string())]);

        let outcome = view.submit("Hello").await;
        let text = match outcome {
            SubmitOutcome::Failed(text) => text,
            other => panic!("expected failure, got {:?}", other),
        };
        assert!(!text.is_empty());
        assert!(text.contains("Unauthorized"));
        assert_eq!(view.status(), &ViewStatus::ErrorShown(text));

        assert_eq!(view.messages().len(), 1);
        assert_eq!(view.messages()[0].role, Role::User);
        let persisted = store.load_session(view.session_id()).unwrap();
        assert!(persisted.iter().all(|m| m.role != Role::Assistant));
    }

    #[tokio::test]
    async fn test_submit_after_failure_recovers() {
        let (mut view, _, _) =
            mount_with(vec![Err("boom".to_string()), Ok("fine".to_string())]);
        view.submit("a").await;
        assert!(matches!(view.status(), ViewStatus::ErrorShown(_)));

        assert_eq!(view.submit("b").await, SubmitOutcome::Replied("fine".to_string()));
        assert_eq!(view.status(), &ViewStatus::Idle);
        assert_eq!(view.messages().len(), 3);
    }

    #[tokio::test]
    async fn test_selection_swaps_messages_without_gateway_call() {
        let (mut view, gateway, store) = mount_with(vec![]);

        let other = store.create_session().unwrap();
        store
            .append_and_persist(&other, &[Message::user("Old question"), Message::assistant("Old answer")])
            .unwrap();
        store.select_session(&other).unwrap();

        assert!(view.sync().unwrap());
        assert_eq!(view.session_id(), other);
        assert_eq!(view.messages().len(), 2);
        assert_eq!(view.messages()[0].content, "Old question");
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_history_changed_does_not_swap() {
        let (mut view, _, store) = mount_with(vec![]);
        let before = view.session_id().to_string();
        let other = store.create_session().unwrap();
        store.append_and_persist(&other, &[Message::user("x")]).unwrap();

        assert!(!view.sync().unwrap());
        assert_eq!(view.session_id(), before);
    }

    #[tokio::test]
    async fn test_new_session_clears_messages() {
        let (mut view, _, store) = mount_with(vec![Ok("r".to_string())]);
        view.submit("q").await;
        let first = view.session_id().to_string();

        view.new_session().unwrap();
        assert_ne!(view.session_id(), first);
        assert!(view.messages().is_empty());
        assert_eq!(store.current_session().unwrap().as_deref(), Some(view.session_id()));
    }

    #[test]
    fn test_can_submit() {
        let store = SessionStore::in_memory();
        let view = ChatView::mount(store, Box::new(ScriptedGateway::default())).unwrap();
        assert!(view.can_submit("hi"));
        assert!(!view.can_submit("  "));
    }

    #[tokio::test]
    async fn test_submit_while_awaiting_reply_is_ignored() {
        let (mut view, gateway, store) = mount_with(vec![Ok("unused".to_string())]);
        view.status = ViewStatus::AwaitingReply;

        assert!(!view.can_submit("hi"));
        assert_eq!(view.submit("hi").await, SubmitOutcome::Ignored);
        assert_eq!(view.status(), &ViewStatus::AwaitingReply);
        assert!(view.messages().is_empty());
        assert_eq!(gateway.call_count(), 0);
        assert!(store.list_index().unwrap().is_empty());
    }
}
