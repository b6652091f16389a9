//! Test utilities for minichat
//!
//! A scripted gateway that replays canned replies without any network.

use crate::error::MinichatError;
use crate::prompts::Persona;
use crate::providers::CompletionGateway;
use crate::storage::Message;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Gateway that answers from a script
///
/// `Ok` entries are returned as replies, `Err` entries become gateway errors.
/// When the script runs out every call fails. Clones share the script and
/// the call log.
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    script: Arc<Mutex<VecDeque<Result<String, String>>>>,
    calls: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl ScriptedGateway {
    /// Gateway replaying `script` in order
    pub fn new(script: Vec<Result<String, String>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of completed `complete` calls
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Full message list (history plus new message) of each call
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionGateway for ScriptedGateway {
    async fn complete(
        &self,
        history: &[Message],
        new_message: &Message,
    ) -> crate::error::Result<String> {
        let mut sent = history.to_vec();
        sent.push(new_message.clone());
        self.calls.lock().unwrap().push(sent);

        match self.script.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(MinichatError::Gateway(message).into()),
            None => Err(MinichatError::Gateway("script exhausted".to_string()).into()),
        }
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }

    fn set_persona(&mut self, _persona: Option<Persona>) {}
}
