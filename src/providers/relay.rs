//! Relayed completion gateway
//!
//! Sends `{ messages }` to a relay that holds the API credential and forwards
//! the call to the completion endpoint.

use crate::error::{MinichatError, Result};
use crate::prompts::Persona;
use crate::providers::base::{
    build_wire_messages, error_message_from_body, extract_reply, CompletionGateway, WireMessage,
};
use crate::storage::Message;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Body accepted by the relay chat endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayRequest {
    /// Conversation so far, newest last
    pub messages: Vec<WireMessage>,
}

/// Gateway that goes through the relay server
pub struct RelayGateway {
    client: Client,
    relay_url: String,
    persona: Option<Persona>,
}

impl RelayGateway {
    /// Create a gateway posting to `relay_url`
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(relay_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("minichat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MinichatError::Gateway(format!("Failed to create HTTP client: {}", e)))?;

        let relay_url = relay_url.into();
        tracing::info!("Initialized relay gateway: url={}", relay_url);

        Ok(Self {
            client,
            relay_url,
            persona: None,
        })
    }
}

#[async_trait]
impl CompletionGateway for RelayGateway {
    async fn complete(&self, history: &[Message], new_message: &Message) -> Result<String> {
        let request = RelayRequest {
            messages: build_wire_messages(self.persona, history, new_message),
        };

        tracing::debug!("Sending relay request: {} messages", request.messages.len());

        let response = self
            .client
            .post(&self.relay_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Relay request failed: {}", e);
                MinichatError::Gateway(format!("Relay request failed: {}", e))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MinichatError::Gateway(format!("Failed to read relay response: {}", e)))?;

        if !status.is_success() {
            tracing::error!("Relay returned {}: {}", status, body);
            return Err(MinichatError::Gateway(error_message_from_body(status, &body)).into());
        }

        extract_reply(&body)
    }

    fn describe(&self) -> String {
        format!("relay ({})", self.relay_url)
    }

    fn set_persona(&mut self, persona: Option<Persona>) {
        self.persona = persona;
    }
}
