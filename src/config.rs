//! Configuration management for minichat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::cli::{Cli, Commands};
use crate::error::{MinichatError, Result};
use crate::prompts::Persona;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for minichat
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Completion gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Interactive chat settings
    #[serde(default)]
    pub chat: ChatConfig,
    /// Relay server settings
    #[serde(default)]
    pub relay: RelayConfig,
}

/// How the client reaches the completion endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayMode {
    /// Call the completion endpoint with the local credential
    #[default]
    Direct,
    /// Call a relay that holds the credential
    Relay,
}

impl GatewayMode {
    /// Parse a gateway mode from a string
    pub fn parse_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "relay" => Ok(Self::Relay),
            other => Err(MinichatError::Config(format!(
                "Invalid gateway mode: {}. Must be one of: direct, relay",
                other
            ))
            .into()),
        }
    }
}

/// Completion gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Direct or relayed access
    #[serde(default)]
    pub mode: GatewayMode,

    /// Base URL of the completion API (`/v1/chat/completions` is appended)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model name sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// Full URL of the relay chat endpoint
    #[serde(default = "default_relay_url")]
    pub relay_url: String,

    /// Sampling temperature; omitted from the request when unset
    #[serde(default = "default_temperature")]
    pub temperature: Option<f32>,

    /// Reply length cap; omitted from the request when unset
    #[serde(default = "default_max_tokens")]
    pub max_tokens: Option<u32>,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_api_base() -> String {
    "https://api.mistral.ai".to_string()
}

fn default_model() -> String {
    "mistral-tiny".to_string()
}

fn default_relay_url() -> String {
    "http://127.0.0.1:3000/api/chat".to_string()
}

fn default_temperature() -> Option<f32> {
    Some(0.7)
}

fn default_max_tokens() -> Option<u32> {
    Some(1000)
}

fn default_api_key_env() -> String {
    "MISTRAL_API_KEY".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            mode: GatewayMode::default(),
            api_base: default_api_base(),
            model: default_model(),
            relay_url: default_relay_url(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl GatewayConfig {
    /// The API key from the configured environment variable
    ///
    /// Empty values count as missing.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

/// Interactive chat configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Persona id applied at start-up (casual, professional, educational)
    #[serde(default)]
    pub personality: Option<String>,

    /// Display name used instead of prompting for one
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Relay server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Address the relay listens on
    #[serde(default = "default_relay_bind")]
    pub bind: String,

    /// Port the relay listens on
    #[serde(default = "default_relay_port")]
    pub port: u16,
}

fn default_relay_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_relay_port() -> u16 {
    3000
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: default_relay_bind(),
            port: default_relay_port(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error; defaults are used instead.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::debug!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| MinichatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| MinichatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(mode) = std::env::var("MINICHAT_GATEWAY_MODE") {
            match GatewayMode::parse_str(&mode) {
                Ok(value) => self.gateway.mode = value,
                Err(_) => tracing::warn!("Invalid MINICHAT_GATEWAY_MODE: {}", mode),
            }
        }

        if let Ok(api_base) = std::env::var("MINICHAT_API_BASE") {
            self.gateway.api_base = api_base;
        }

        if let Ok(model) = std::env::var("MINICHAT_MODEL") {
            self.gateway.model = model;
        }

        if let Ok(relay_url) = std::env::var("MINICHAT_RELAY_URL") {
            self.gateway.relay_url = relay_url;
        }

        if let Ok(temperature) = std::env::var("MINICHAT_TEMPERATURE") {
            if let Ok(value) = temperature.parse() {
                self.gateway.temperature = Some(value);
            } else {
                tracing::warn!("Invalid MINICHAT_TEMPERATURE: {}", temperature);
            }
        }

        if let Ok(max_tokens) = std::env::var("MINICHAT_MAX_TOKENS") {
            if let Ok(value) = max_tokens.parse() {
                self.gateway.max_tokens = Some(value);
            } else {
                tracing::warn!("Invalid MINICHAT_MAX_TOKENS: {}", max_tokens);
            }
        }

        if let Ok(personality) = std::env::var("MINICHAT_PERSONALITY") {
            self.chat.personality = Some(personality);
        }

        if let Ok(port) = std::env::var("MINICHAT_RELAY_PORT") {
            match port.parse::<u16>() {
                Ok(value) => {
                    self.relay.port = value;
                    tracing::debug!(port = value, "Env override: MINICHAT_RELAY_PORT");
                }
                Err(_) => tracing::warn!("Invalid MINICHAT_RELAY_PORT: {}", port),
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Chat {
                name,
                relay,
                personality,
                ..
            } => {
                if *relay {
                    self.gateway.mode = GatewayMode::Relay;
                }
                if let Some(p) = personality {
                    self.chat.personality = Some(p.clone());
                }
                if let Some(n) = name {
                    self.chat.display_name = Some(n.clone());
                }
            }
            Commands::Serve { bind, port, .. } => {
                if let Some(b) = bind {
                    self.relay.bind = b.clone();
                }
                if let Some(p) = port {
                    self.relay.port = *p;
                }
            }
            Commands::History { .. } => {}
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.gateway.api_base).map_err(|e| {
            MinichatError::Config(format!(
                "gateway.api_base is not a valid URL ({}): {}",
                self.gateway.api_base, e
            ))
        })?;

        url::Url::parse(&self.gateway.relay_url).map_err(|e| {
            MinichatError::Config(format!(
                "gateway.relay_url is not a valid URL ({}): {}",
                self.gateway.relay_url, e
            ))
        })?;

        if self.gateway.model.trim().is_empty() {
            return Err(MinichatError::Config("gateway.model cannot be empty".to_string()).into());
        }

        if self.gateway.api_key_env.trim().is_empty() {
            return Err(
                MinichatError::Config("gateway.api_key_env cannot be empty".to_string()).into(),
            );
        }

        if let Some(temperature) = self.gateway.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(MinichatError::Config(
                    "gateway.temperature must be between 0.0 and 2.0".to_string(),
                )
                .into());
            }
        }

        if self.gateway.max_tokens == Some(0) {
            return Err(MinichatError::Config(
                "gateway.max_tokens must be greater than 0".to_string(),
            )
            .into());
        }

        if let Some(personality) = &self.chat.personality {
            Persona::parse_str(personality).map_err(MinichatError::Config)?;
        }

        if self.relay.port == 0 {
            return Err(
                MinichatError::Config("relay.port must be greater than 0".to_string()).into(),
            );
        }

        Ok(())
    }
}
