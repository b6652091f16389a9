use crate::cli::HistoryCommand;
use crate::error::Result;
use crate::storage::{bucket_index, SessionStore, SidebarBuckets};
use chrono::Local;
use colored::Colorize;
use prettytable::{format, Table};

/// Handle history commands
pub fn handle_history(command: HistoryCommand) -> Result<()> {
    let store = SessionStore::open_default()?;

    match command {
        HistoryCommand::List => {
            let entries = store.list_index()?;

            if entries.is_empty() {
                println!("{}", "No conversation history found.".yellow());
                return Ok(());
            }

            let buckets = bucket_index(&entries, Local::now());
            let current = store.current_session()?;

            println!("\nConversation History:");
            if buckets.is_empty() {
                println!("{}", "No recent chats.".yellow());
            } else {
                history_table(&buckets, current.as_deref()).printstd();
            }
            if buckets.hidden > 0 {
                println!(
                    "{}",
                    format!(
                        "{} older conversation(s) not shown",
                        buckets.hidden
                    )
                    .dimmed()
                );
            }
            println!();
            println!(
                "Use {} to resume a session.",
                "minichat chat --resume <ID>".cyan()
            );
            println!();
        }
        HistoryCommand::Delete { id } => match store.delete_session(&id)? {
            Some(deleted) => {
                println!("{}", format!("Deleted conversation {}", deleted).green());
            }
            None => {
                println!(
                    "{}",
                    format!("No conversation found matching {}", id).yellow()
                );
            }
        },
    }

    Ok(())
}

/// Build the grouped history table
///
/// One row per entry; the group name is only printed on the first row of
/// each group and the current session is marked with `*`.
pub fn history_table(buckets: &SidebarBuckets, current: Option<&str>) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "Group".bold(),
        "ID".bold(),
        "Title".bold(),
        "Last Updated".bold()
    ]);

    for (group, entries) in [
        ("Today", &buckets.today),
        ("Yesterday", &buckets.yesterday),
        ("Previous 7 Days", &buckets.previous_seven_days),
    ] {
        for (i, entry) in entries.iter().enumerate() {
            let label = if i == 0 { group } else { "" };
            let id = if current == Some(entry.id.as_str()) {
                format!("* {}", entry.id)
            } else {
                entry.id.clone()
            };
            let updated = entry
                .timestamp
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string();

            table.add_row(prettytable::row![label, id.cyan(), entry.title, updated]);
        }
    }

    table
}
