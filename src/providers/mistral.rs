//! Direct completion gateway
//!
//! Calls the chat-completions endpoint of the hosted API with the bearer
//! credential held by this process.

use crate::config::GatewayConfig;
use crate::error::{MinichatError, Result};
use crate::prompts::Persona;
use crate::providers::base::{
    build_wire_messages, error_message_from_body, extract_reply, CompletionGateway, WireMessage,
};
use crate::storage::Message;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

/// Path appended to the configured API base
pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Request body for the chat-completions endpoint
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Gateway that talks to the completion API directly
///
/// # Examples
///
/// ```no_run
/// use minichat::config::GatewayConfig;
/// use minichat::providers::{CompletionGateway, MistralGateway};
/// use minichat::storage::Message;
///
/// # async fn example() -> minichat::error::Result<()> {
/// let config = GatewayConfig::default();
/// let gateway = MistralGateway::new(config.clone(), config.api_key())?;
/// let reply = gateway.complete(&[], &Message::user("Hello!")).await?;
/// # Ok(())
/// # }
/// ```
pub struct MistralGateway {
    client: Client,
    config: GatewayConfig,
    api_key: Option<String>,
    persona: Option<Persona>,
}

impl MistralGateway {
    /// Create a new direct gateway
    ///
    /// A missing `api_key` is accepted here; every `complete` call then fails
    /// with a configuration error.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: GatewayConfig, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("minichat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MinichatError::Gateway(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized direct gateway: api_base={}, model={}",
            config.api_base,
            config.model
        );
        if api_key.is_none() {
            tracing::warn!("{} is not set; completions will fail", config.api_key_env);
        }

        Ok(Self {
            client,
            config,
            api_key,
            persona: None,
        })
    }

    /// The configured model name
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Full URL of the chat-completions endpoint
    ///
    /// # Examples
    ///
    /// ```
    /// use minichat::config::GatewayConfig;
    /// use minichat::providers::MistralGateway;
    ///
    /// let config = GatewayConfig {
    ///     api_base: "http://localhost:9000/".to_string(),
    ///     ..Default::default()
    /// };
    /// let gateway = MistralGateway::new(config, None).unwrap();
    /// assert_eq!(gateway.endpoint(), "http://localhost:9000/v1/chat/completions");
    /// ```
    pub fn endpoint(&self) -> String {
        format!(
            "{}{}",
            self.config.api_base.trim_end_matches('/'),
            CHAT_COMPLETIONS_PATH
        )
    }
}

#[async_trait]
impl CompletionGateway for MistralGateway {
    async fn complete(&self, history: &[Message], new_message: &Message) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            MinichatError::Config(format!("{} is not set", self.config.api_key_env))
        })?;

        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: build_wire_messages(self.persona, history, new_message),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        tracing::debug!(
            "Sending completion request: {} messages, model={}",
            request.messages.len(),
            request.model
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Completion request failed: {}", e);
                MinichatError::Gateway(format!("Completion request failed: {}", e))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            MinichatError::Gateway(format!("Failed to read completion response: {}", e))
        })?;

        if !status.is_success() {
            tracing::error!("Completion endpoint returned {}: {}", status, body);
            return Err(MinichatError::Gateway(error_message_from_body(status, &body)).into());
        }

        extract_reply(&body)
    }

    fn describe(&self) -> String {
        format!("direct ({} via {})", self.model(), self.endpoint())
    }

    fn set_persona(&mut self, persona: Option<Persona>) {
        self.persona = persona;
    }
}
