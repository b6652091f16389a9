/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `chat`    - Interactive chat session
- `history` - List and delete saved conversations
- `serve`   - Completion relay server
*/

use crate::chat::{ChatView, DisplayName, Sidebar, SubmitOutcome, ViewStatus};
use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
use crate::config::Config;
use crate::error::Result;
use crate::prompts::Persona;
use crate::providers::create_gateway;
use crate::storage::{Message, Role, SessionStore};

// Special commands parser for the chat prompt
pub mod special_commands;

// Saved conversation management
pub mod history;

// Chat command handler
pub mod chat {
    //! Interactive chat handler.
    //!
    //! Builds the gateway from configuration, mounts a [`ChatView`] and a
    //! [`Sidebar`] on the shared session store, and runs a readline loop that
    //! routes special commands and submits everything else as a message.

    use super::*;
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Start interactive chat
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `resume` - Optional session id or unique prefix to open first
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be opened, the resumed session does
    /// not exist, or the terminal cannot be initialized. Failed completions
    /// are shown in the chat and never end the loop.
    pub async fn run_chat(config: Config, resume: Option<String>) -> Result<()> {
        tracing::info!("Starting interactive chat");

        let store = SessionStore::open_default()?;
        if let Some(id) = &resume {
            let resolved = store.select_session(id)?;
            tracing::info!(session_id = %resolved, "Resuming conversation");
        }

        let mut persona = config
            .chat
            .personality
            .as_deref()
            .map(Persona::parse_str)
            .transpose()
            .map_err(crate::error::MinichatError::Config)?;

        let mut gateway = create_gateway(&config.gateway)?;
        gateway.set_persona(persona);

        let mut rl = DefaultEditor::new()?;

        let name = match known_display_name(config.chat.display_name.as_deref(), &store)? {
            Some(name) => name,
            None => match prompt_display_name(&mut rl)? {
                Some(name) => {
                    store.set_display_name(name.as_str())?;
                    name
                }
                None => {
                    println!("Goodbye!");
                    return Ok(());
                }
            },
        };

        let mut view = ChatView::mount(store.clone(), gateway)?;
        let mut sidebar = Sidebar::new(store)?;

        print_welcome_banner(&name, &view.gateway().describe(), persona);
        print_transcript(view.messages(), &name);

        loop {
            let prompt = format!("{} > ", name.as_str().green());
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    let command = match parse_special_command(trimmed) {
                        Ok(cmd) => cmd,
                        Err(e) => {
                            eprintln!("{}\n", e.to_string().red());
                            continue;
                        }
                    };

                    match command {
                        SpecialCommand::NewChat => {
                            view.new_session()?;
                            println!("{}\n", "Started a new conversation.".green());
                            continue;
                        }
                        SpecialCommand::ListSessions => {
                            sidebar.reload()?;
                            println!();
                            print!("{}", sidebar.render(Some(view.session_id())));
                            println!();
                            continue;
                        }
                        SpecialCommand::OpenSession(id) => {
                            match sidebar.select(&id) {
                                Ok(_) => {
                                    view.sync()?;
                                    println!(
                                        "{}\n",
                                        format!("Opened conversation {}", view.session_id())
                                            .green()
                                    );
                                    print_transcript(view.messages(), &name);
                                }
                                Err(e) => eprintln!("{}\n", e.to_string().red()),
                            }
                            continue;
                        }
                        SpecialCommand::SetPersonality(new_persona) => {
                            persona = new_persona;
                            view.gateway_mut().set_persona(persona);
                            match persona {
                                Some(p) => println!(
                                    "Personality set to {} ({})\n",
                                    p.id().cyan(),
                                    p.description()
                                ),
                                None => println!("Personality removed\n"),
                            }
                            continue;
                        }
                        SpecialCommand::ShowStatus => {
                            print_status_display(&view, persona);
                            continue;
                        }
                        SpecialCommand::Help => {
                            print_help();
                            continue;
                        }
                        SpecialCommand::Exit => break,
                        SpecialCommand::None => {}
                    }

                    rl.add_history_entry(trimmed)?;

                    println!("{}", "Thinking...".dimmed());
                    match view.submit(trimmed).await {
                        SubmitOutcome::Replied(reply) => {
                            println!("\n{}\n{}\n", "Assistant:".blue().bold(), reply);
                        }
                        SubmitOutcome::Failed(text) => {
                            eprintln!("\n{}\n", format!("Error: {}", text).red());
                        }
                        SubmitOutcome::Ignored => {}
                    }

                    // A reply can still be followed by a failed save.
                    if let ViewStatus::ErrorShown(text) = view.status() {
                        if text.starts_with("Failed to save chat") {
                            eprintln!("{}\n", text.yellow());
                        }
                    }

                    sidebar.sync()?;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Display name from configuration, else the one saved by an earlier chat
    ///
    /// Returns `None` when the user still has to be asked.
    pub fn known_display_name(
        configured: Option<&str>,
        store: &SessionStore,
    ) -> Result<Option<DisplayName>> {
        if let Some(raw) = configured {
            return DisplayName::parse(raw).map(Some);
        }
        match store.display_name()? {
            Some(saved) => Ok(DisplayName::parse(&saved).ok()),
            None => Ok(None),
        }
    }

    /// Ask for a display name until a non-blank one is entered
    ///
    /// Returns `None` when the user leaves with CTRL-C or CTRL-D.
    fn prompt_display_name(rl: &mut DefaultEditor) -> Result<Option<DisplayName>> {
        loop {
            match rl.readline("Enter your name: ") {
                Ok(line) => match DisplayName::parse(&line) {
                    Ok(name) => return Ok(Some(name)),
                    Err(e) => eprintln!("{}", e.to_string().yellow()),
                },
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(None),
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Display welcome banner at the start of interactive chat
    fn print_welcome_banner(name: &DisplayName, gateway: &str, persona: Option<Persona>) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                  minichat - Welcome!                         ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Hello, {}!", name.as_str().green().bold());
        println!("Gateway:     {}", gateway.cyan());
        println!("Personality: {}\n", persona_label(persona));
        println!("Type '/help' for available commands, 'exit' to quit\n");
    }

    /// Print the messages of the session on screen
    fn print_transcript(messages: &[Message], name: &DisplayName) {
        if messages.is_empty() {
            return;
        }
        for message in messages {
            let label = match message.role {
                Role::User => format!("{}:", name).green().bold(),
                Role::Assistant => "Assistant:".blue().bold(),
            };
            println!("{}\n{}\n", label, message.content);
        }
    }

    /// Display the current conversation, gateway and status
    fn print_status_display(view: &ChatView, persona: Option<Persona>) {
        println!("\n╔══════════════════════════════════════╗");
        println!("║          Session Status              ║");
        println!("╚══════════════════════════════════════╝\n");
        println!("Conversation: {}", view.session_id().cyan());
        println!("Messages:     {}", view.messages().len());
        println!("Gateway:      {}", view.gateway().describe());
        println!("Personality:  {}", persona_label(persona));
        let status = match view.status() {
            ViewStatus::ErrorShown(_) => view.status().to_string().red(),
            other => other.to_string().normal(),
        };
        println!("Status:       {}\n", status);
    }

    fn persona_label(persona: Option<Persona>) -> String {
        match persona {
            Some(p) => format!("{} ({})", p.id(), p.description()),
            None => "none".to_string(),
        }
    }

}

// Relay server handler
pub mod serve {
    //! Runs the completion relay in the foreground.

    use super::*;

    /// Serve the relay until the process is stopped
    ///
    /// # Errors
    ///
    /// Returns error if the listen address cannot be bound
    pub async fn run_serve(config: Config) -> Result<()> {
        tracing::info!(
            bind = %config.relay.bind,
            port = config.relay.port,
            "Starting completion relay"
        );
        crate::relay::run_relay(&config).await
    }
}
