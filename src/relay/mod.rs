//! Completion relay server
//!
//! A small HTTP service exposing `POST /api/chat`. Clients send the
//! conversation as `{ messages }`; the relay adds the model and the bearer
//! credential it holds, forwards `{ model, messages }` to the
//! chat-completions endpoint and returns the upstream JSON unchanged.
//! Failures are reported as `{ "error": "<text>" }`.

use crate::config::{Config, GatewayConfig};
use crate::error::{MinichatError, Result};
use crate::providers::mistral::CHAT_COMPLETIONS_PATH;
use crate::providers::{RelayRequest, WireMessage};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Route served by the relay
pub const CHAT_ROUTE: &str = "/api/chat";

/// Shared state of the relay handlers
#[derive(Clone)]
pub struct RelayState {
    inner: Arc<RelayInner>,
}

struct RelayInner {
    client: Client,
    upstream_url: String,
    model: String,
    api_key: Option<String>,
    api_key_env: String,
}

#[derive(Serialize)]
struct UpstreamRequest<'a> {
    model: &'a str,
    messages: &'a [WireMessage],
}

impl RelayState {
    /// Build relay state from the gateway settings
    ///
    /// The credential is passed explicitly so tests can run without touching
    /// the environment; [`run_relay`] reads it from `config.api_key_env`.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: &GatewayConfig, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("minichat-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MinichatError::Gateway(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            inner: Arc::new(RelayInner {
                client,
                upstream_url: format!(
                    "{}{}",
                    config.api_base.trim_end_matches('/'),
                    CHAT_COMPLETIONS_PATH
                ),
                model: config.model.clone(),
                api_key,
                api_key_env: config.api_key_env.clone(),
            }),
        })
    }

    /// Upstream endpoint the relay forwards to
    pub fn upstream_url(&self) -> &str {
        &self.inner.upstream_url
    }
}

/// Build the relay router
pub fn router(state: RelayState) -> Router {
    Router::new()
        .route(CHAT_ROUTE, post(chat_handler))
        .with_state(state)
}

/// Bind the configured address and serve until the process is stopped
///
/// # Errors
///
/// Returns error if the relay cannot be initialized or the address cannot be
/// bound
pub async fn run_relay(config: &Config) -> Result<()> {
    let api_key = config.gateway.api_key();
    if api_key.is_none() {
        tracing::warn!(
            "{} is not set; every relayed request will fail",
            config.gateway.api_key_env
        );
    }

    let state = RelayState::new(&config.gateway, api_key)?;
    let addr = format!("{}:{}", config.relay.bind, config.relay.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| MinichatError::Config(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!(
        address = %addr,
        upstream = %state.upstream_url(),
        "Relay listening on http://{}{}",
        addr,
        CHAT_ROUTE
    );

    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn chat_handler(State(state): State<RelayState>, body: Bytes) -> Response {
    let request: RelayRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("Rejected relay request: {}", e);
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid request body: {}", e),
            );
        }
    };

    match forward(&state, &request.messages).await {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err((status, message)) => error_response(status, message),
    }
}

async fn forward(
    state: &RelayState,
    messages: &[WireMessage],
) -> std::result::Result<Value, (StatusCode, String)> {
    let inner = &state.inner;
    let api_key = inner.api_key.as_deref().ok_or_else(|| {
        tracing::error!("{} is not set", inner.api_key_env);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{} is not set", inner.api_key_env),
        )
    })?;

    tracing::debug!(messages = messages.len(), "Forwarding relay request");

    let body = UpstreamRequest {
        model: &inner.model,
        messages,
    };

    let response = inner
        .client
        .post(&inner.upstream_url)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .map_err(|e| {
            tracing::error!("Upstream request failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    let upstream_status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let value: Option<Value> = serde_json::from_str(&text).ok();

    // reqwest and axum may be built on different `http` versions.
    let status = StatusCode::from_u16(upstream_status.as_u16())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if !upstream_status.is_success() {
        let message = value
            .as_ref()
            .and_then(|v| v.pointer("/error/message"))
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string)
            .or_else(|| upstream_status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| format!("status {}", upstream_status.as_u16()));
        tracing::warn!(status = status.as_u16(), "Mistral API error: {}", message);
        return Err((status, format!("Mistral API error: {}", message)));
    }

    value.ok_or_else(|| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Upstream returned a non-JSON body".to_string(),
        )
    })
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
