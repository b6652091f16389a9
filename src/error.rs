//! Error types for minichat
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for minichat operations
///
/// Domain failures only; library errors travel as `anyhow::Error` with
/// context attached.
#[derive(Error, Debug)]
pub enum MinichatError {
    /// Configuration-related errors, including a missing API credential
    #[error("Configuration error: {0}")]
    Config(String),

    /// Upstream non-success or transport failure from the completion endpoint
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// The completion endpoint answered with an unexpected body shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// No session (or more than one) matches the requested id
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Session storage errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type alias for minichat operations
///
/// Uses `anyhow::Error` so callers can attach context while still being able
/// to downcast to [`MinichatError`].
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = MinichatError::Config("MISTRAL_API_KEY is not set".to_string());
        assert_eq!(
            error.to_string(),
            "Configuration error: MISTRAL_API_KEY is not set"
        );
    }

    #[test]
    fn test_gateway_error_display() {
        let error = MinichatError::Gateway("invalid key".to_string());
        assert_eq!(error.to_string(), "Gateway error: invalid key");
    }

    #[test]
    fn test_malformed_response_display() {
        let error = MinichatError::MalformedResponse("missing choices".to_string());
        assert_eq!(error.to_string(), "Malformed response: missing choices");
    }

    #[test]
    fn test_session_not_found_display() {
        let error = MinichatError::SessionNotFound("chat_01".to_string());
        assert_eq!(error.to_string(), "Session not found: chat_01");
    }

    #[test]
    fn test_storage_error_display() {
        let error = MinichatError::Storage("database connection failed".to_string());
        assert_eq!(
            error.to_string(),
            "Storage error: database connection failed"
        );
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MinichatError>();
    }
}
