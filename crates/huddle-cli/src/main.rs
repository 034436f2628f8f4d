//! huddle: multi-agent chat in your terminal.
//!
//! Talks to a chat API (or an in-process stand-in) where every message can
//! `@mention` the agents that should answer.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("huddle=debug")
            .with_writer(std::io::stderr)
            .init();
    } else if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    let mut config = huddle_core::ConfigStore::new().load();
    config.apply_env();
    cli.apply_overrides(&mut config);
    tracing::debug!(backend = %config.backend, base_url = %config.base_url, "resolved config");

    let manager = commands::build_manager(&config)?;

    let result = match cli.command {
        None => commands::chat::run(&manager, None).await,
        Some(Commands::Chat { session }) => commands::chat::run(&manager, session).await,
        Some(Commands::Send { session, message }) => {
            commands::send::run(&manager, session, &message).await
        }
        Some(Commands::Agents) => commands::agents::run(&manager).await,
        Some(Commands::History { session, json }) => {
            commands::history::run(&manager, session, json).await
        }
    };

    manager.shutdown();
    result
}
