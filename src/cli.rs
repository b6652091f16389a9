//! Command-line interface definition for minichat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for chatting, browsing saved history and running
//! the completion relay.

use clap::{Parser, Subcommand};

/// minichat - a small terminal chat client for hosted language models
///
/// Conversations are kept locally and can be resumed at any time.
#[derive(Parser, Debug, Clone)]
#[command(name = "minichat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to the chat history database
    #[arg(long, env = "MINICHAT_HISTORY_DB")]
    pub storage_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for minichat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Display name; prompted for when omitted
        #[arg(short, long)]
        name: Option<String>,

        /// Send completions through the relay instead of calling the API directly
        #[arg(short, long)]
        relay: bool,

        /// Assistant personality (casual, professional, educational)
        #[arg(short, long)]
        personality: Option<String>,

        /// Resume a saved session by id or unique id prefix
        #[arg(long)]
        resume: Option<String>,
    },

    /// Browse and manage saved conversations
    History {
        /// History subcommand
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// Run the completion relay that keeps the API key server-side
    Serve {
        /// Address to bind
        #[arg(short, long)]
        bind: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Emit logs as JSON lines
        #[arg(long)]
        json_logs: bool,
    },
}

/// History management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// List saved conversations grouped by recency
    List,

    /// Delete a saved conversation
    Delete {
        /// Session id or unique id prefix
        id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            storage_path: None,
            command: Commands::History {
                command: HistoryCommand::List,
            },
        }
    }
}
