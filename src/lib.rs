//! minichat - terminal chat client for hosted language models
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `storage`: session store over a pluggable key-value backend
//! - `providers`: completion gateway abstraction (direct and relayed)
//! - `chat`: conversation view controller and session list
//! - `relay`: HTTP relay that keeps the API credential server-side
//! - `prompts`: persona presets
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli`: command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use minichat::chat::ChatView;
//! use minichat::providers::create_gateway;
//! use minichat::storage::SessionStore;
//! use minichat::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let store = SessionStore::open_default()?;
//!     let mut view = ChatView::mount(store, create_gateway(&config.gateway)?)?;
//!     view.submit("Hello!").await;
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod prompts;
pub mod providers;
pub mod relay;
pub mod storage;

// Re-export commonly used types
pub use chat::{ChatView, SubmitOutcome, ViewStatus};
pub use config::Config;
pub use error::{MinichatError, Result};
pub use storage::{Message, Role, SessionStore};

#[cfg(test)]
pub mod test_utils;
