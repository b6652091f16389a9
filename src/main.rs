//! minichat - terminal chat client for hosted language models
//!
#![doc = "Main entry point for the minichat application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use minichat::cli::{Cli, Commands};
use minichat::commands;
use minichat::config::Config;
use minichat::storage::HISTORY_DB_ENV;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    let json_logs = matches!(cli.command, Commands::Serve { json_logs: true, .. });
    init_tracing(cli.verbose, json_logs);

    // Mirror a CLI storage override into the environment so every
    // `SessionStore::open_default` call picks it up.
    if let Some(db_path) = &cli.storage_path {
        std::env::set_var(HISTORY_DB_ENV, db_path);
        tracing::debug!("Using history DB override: {}", db_path);
    }

    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    config.validate()?;

    match cli.command {
        Commands::Chat { resume, .. } => {
            if let Some(r) = &resume {
                tracing::debug!("Resuming conversation: {}", r);
            }
            commands::chat::run_chat(config, resume).await?;
            Ok(())
        }
        Commands::History { command } => {
            tracing::debug!("Starting history command");
            commands::history::handle_history(command)?;
            Ok(())
        }
        Commands::Serve { .. } => {
            commands::serve::run_serve(config).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins over `--verbose`. Logs go to stderr so they never mix with
/// the conversation on stdout.
fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose { "minichat=debug" } else { "minichat=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
