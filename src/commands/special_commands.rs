//! Special commands parser for interactive chat mode
//!
//! Special commands are prefixed with `/` and are case-insensitive, except
//! for the bare `exit` and `quit` words. Anything else typed at the prompt is
//! a chat message.

use crate::prompts::Persona;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Start a fresh conversation
    NewChat,

    /// Show saved conversations grouped by recency
    ListSessions,

    /// Open a saved conversation by id or unique id prefix
    OpenSession(String),

    /// Change the assistant personality; `None` removes it
    SetPersonality(Option<Persona>),

    /// Show the current session, gateway and status
    ShowStatus,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command; send the input as a chat message
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` for unrecognized `/` input,
/// `CommandError::MissingArgument` when `/open` or `/personality` lack an
/// argument, and `CommandError::UnsupportedArgument` for an unknown persona.
///
/// # Examples
///
/// ```
/// use minichat::commands::special_commands::{parse_special_command, SpecialCommand};
/// use minichat::prompts::Persona;
///
/// assert_eq!(parse_special_command("/new").unwrap(), SpecialCommand::NewChat);
/// assert_eq!(
///     parse_special_command("/personality casual").unwrap(),
///     SpecialCommand::SetPersonality(Some(Persona::Casual))
/// );
/// assert_eq!(parse_special_command("hello").unwrap(), SpecialCommand::None);
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    // Session ids keep their original spelling; only the command word is folded.
    let (command, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };

    match command.as_str() {
        "exit" | "quit" | "/exit" | "/quit" => Ok(SpecialCommand::Exit),
        "/new" => Ok(SpecialCommand::NewChat),
        "/sessions" | "/history" => Ok(SpecialCommand::ListSessions),
        "/status" => Ok(SpecialCommand::ShowStatus),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/open" => {
            if arg.is_empty() {
                Err(CommandError::MissingArgument {
                    command: "/open".to_string(),
                    usage: "/open <session-id>".to_string(),
                })
            } else {
                Ok(SpecialCommand::OpenSession(arg.to_string()))
            }
        }
        "/personality" => match arg.to_lowercase().as_str() {
            "" => Err(CommandError::MissingArgument {
                command: "/personality".to_string(),
                usage: "/personality <casual|professional|educational|off>".to_string(),
            }),
            "off" | "none" => Ok(SpecialCommand::SetPersonality(None)),
            other => Persona::parse_str(other)
                .map(|p| SpecialCommand::SetPersonality(Some(p)))
                .map_err(|_| CommandError::UnsupportedArgument {
                    command: "/personality".to_string(),
                    arg: arg.to_string(),
                }),
        },
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Print help for the special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat
=====================================

CONVERSATIONS:
  /new                 - Start a new conversation
  /sessions            - List saved conversations (Today, Yesterday, Previous 7 Days)
  /open <id>           - Open a saved conversation; a unique id prefix is enough

ASSISTANT:
  /personality <name>  - Use a personality: casual, professional, educational
  /personality off     - Remove the personality

SESSION INFORMATION:
  /status              - Show the current conversation and gateway
  /help                - Show this help message

EXIT:
  exit, quit           - Leave the chat

Anything else you type is sent to the assistant.
"#
    );
}
