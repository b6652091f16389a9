//! Completion gateway trait and the chat-completions wire format
//!
//! Both gateway variants speak the same request/response shape: an ordered
//! list of `{role, content}` messages in, `choices[0].message.content` out.

use crate::error::{MinichatError, Result};
use crate::prompts::Persona;
use crate::storage::Message;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Turns a conversation into a single completion request
///
/// Implementations make exactly one round trip per call: no retries, no
/// streaming.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Send `history` followed by `new_message` and return the reply text
    ///
    /// # Errors
    ///
    /// * [`MinichatError::Config`] when no credential is configured
    /// * [`MinichatError::Gateway`] on transport failure or a non-success status
    /// * [`MinichatError::MalformedResponse`] when the reply has no first choice content
    async fn complete(&self, history: &[Message], new_message: &Message) -> Result<String>;

    /// Short human-readable description for status output
    fn describe(&self) -> String;

    /// Replace the persona applied to subsequent requests
    fn set_persona(&mut self, persona: Option<Persona>);
}

/// Message as sent on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    /// `system`, `user` or `assistant`
    pub role: String,
    /// Message text
    pub content: String,
}

/// Build the wire message list for one turn
///
/// The persona prompt, when present, goes first as a `system` message;
/// timestamps are dropped.
///
/// # Examples
///
/// ```
/// use minichat::providers::build_wire_messages;
/// use minichat::storage::Message;
///
/// let history = vec![Message::user("Hi"), Message::assistant("Hello!")];
/// let wire = build_wire_messages(None, &history, &Message::user("How are you?"));
/// assert_eq!(wire.len(), 3);
/// assert_eq!(wire[2].role, "user");
/// ```
pub fn build_wire_messages(
    persona: Option<Persona>,
    history: &[Message],
    new_message: &Message,
) -> Vec<WireMessage> {
    let system = persona.map(|p| WireMessage {
        role: "system".to_string(),
        content: p.system_prompt().to_string(),
    });

    system
        .into_iter()
        .chain(
            history
                .iter()
                .chain(std::iter::once(new_message))
                .map(|m| WireMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                }),
        )
        .collect()
}

/// Success body of a chat-completions call
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Extract `choices[0].message.content` from a success body
pub fn extract_reply(body: &str) -> Result<String> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body).map_err(|e| {
        MinichatError::MalformedResponse(format!("Failed to parse completion response: {}", e))
    })?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| {
            MinichatError::MalformedResponse(
                "Completion response has no choices[0].message.content".to_string(),
            )
            .into()
        })
}

/// Error text for a non-success response
///
/// Prefers `error.message` (completion API shape), then a string `error`
/// (relay shape), then falls back to the status code.
///
/// # Examples
///
/// ```
/// use minichat::providers::error_message_from_body;
/// use reqwest::StatusCode;
///
/// let msg = error_message_from_body(
///     StatusCode::UNAUTHORIZED,
///     r#"{"error":{"message":"invalid key"}}"#,
/// );
/// assert_eq!(msg, "invalid key");
///
/// let msg = error_message_from_body(StatusCode::BAD_GATEWAY, "<html>");
/// assert_eq!(msg, "API request failed with status 502");
/// ```
pub fn error_message_from_body(status: StatusCode, body: &str) -> String {
    let value: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let from_body = value.as_ref().and_then(|v| {
        let error = v.get("error")?;
        error
            .get("message")
            .and_then(|m| m.as_str())
            .or_else(|| error.as_str())
            .map(str::to_string)
    });

    from_body
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("API request failed with status {}", status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_wire_messages_prepends_persona() {
        let wire = build_wire_messages(
            Some(Persona::Professional),
            &[Message::user("a")],
            &Message::user("b"),
        );
        assert_eq!(wire.len(), 3);
        assert_eq!(wire[0].role, "system");
        assert_eq!(wire[0].content, Persona::Professional.system_prompt());
        assert_eq!(wire[1].content, "a");
        assert_eq!(wire[2].content, "b");
    }

    #[test]
    fn test_wire_messages_omit_timestamp() {
        let wire = build_wire_messages(None, &[], &Message::user("hi"));
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json, serde_json::json!([{"role": "user", "content": "hi"}]));
    }

    #[test]
    fn test_extract_reply_takes_first_choice() {
        let body = r#"{"choices":[{"message":{"content":"first"}},{"message":{"content":"second"}}]}"#;
        assert_eq!(extract_reply(body).unwrap(), "first");
    }

    #[test]
    fn test_extract_reply_without_choices_is_malformed() {
        let err = extract_reply(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MinichatError>(),
            Some(MinichatError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_extract_reply_non_json_is_malformed() {
        let err = extract_reply("oops").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MinichatError>(),
            Some(MinichatError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_error_message_prefers_nested_message() {
        let msg = error_message_from_body(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"message":"slow down","type":"rate_limit"}}"#,
        );
        assert_eq!(msg, "slow down");
    }

    #[test]
    fn test_error_message_accepts_relay_string_error() {
        let msg = error_message_from_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":"MISTRAL_API_KEY is not set"}"#,
        );
        assert_eq!(msg, "MISTRAL_API_KEY is not set");
    }

    #[test]
    fn test_error_message_falls_back_to_status() {
        let msg = error_message_from_body(StatusCode::SERVICE_UNAVAILABLE, "{}");
        assert_eq!(msg, "API request failed with status 503");
    }
}
