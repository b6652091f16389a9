//! Completion gateways
//!
//! This module contains the gateway abstraction and its two deployment
//! variants: direct calls with a local credential, and calls through the
//! relay server.

pub mod base;
pub mod mistral;
pub mod relay;

pub use base::{
    build_wire_messages, error_message_from_body, extract_reply, CompletionGateway, WireMessage,
};
pub use mistral::MistralGateway;
pub use relay::{RelayGateway, RelayRequest};

use crate::config::{GatewayConfig, GatewayMode};
use crate::error::Result;

/// Create the gateway selected by configuration
///
/// The direct variant picks the credential up from the environment variable
/// named in `config.api_key_env`.
///
/// # Errors
///
/// Returns error if HTTP client initialization fails
pub fn create_gateway(config: &GatewayConfig) -> Result<Box<dyn CompletionGateway>> {
    match config.mode {
        GatewayMode::Direct => Ok(Box::new(MistralGateway::new(
            config.clone(),
            config.api_key(),
        )?)),
        GatewayMode::Relay => Ok(Box::new(RelayGateway::new(config.relay_url.clone())?)),
    }
}
