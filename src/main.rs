use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

mod chat;
mod config;
mod dialogue;
mod storage;
mod store;
mod ui;
mod upload;

use config::Config;

#[derive(Parser)]
#[command(name = "briefr")]
#[command(version = "0.1.0")]
#[command(about = "Terminal client for a threat-intelligence dialogue assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List saved conversations
    List,
}

fn list_conversations(config: &Config) {
    let store = storage::load_store(&config.store_path());
    let conversations = store.sorted();

    if conversations.is_empty() {
        println!("📭 No conversations yet. Run 'briefr' to start your first one!");
        return;
    }

    println!("📋 Your conversations:\n");
    for conversation in conversations {
        let updated = chrono::DateTime::from_timestamp_millis(conversation.updated_at)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let marker = if Some(&conversation.id) == store.active_conversation_id.as_ref() {
            "▸"
        } else {
            "•"
        };
        println!(
            "  {} {}  ({} messages, updated {})",
            marker,
            conversation.title,
            conversation.messages.len(),
            updated
        );
    }
}

/// Route tracing output to a file; stdout belongs to the TUI.
fn init_tracing(config: &Config) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_path())
        .context("Failed to open log file")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("briefr=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    init_tracing(&config)?;

    match cli.command {
        Some(Commands::List) => {
            list_conversations(&config);
            Ok(())
        }
        None => ui::app::run(config).await,
    }
}
