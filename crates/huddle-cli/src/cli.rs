//! CLI argument and command definitions.

use clap::{Parser, Subcommand};
use huddle_core::{BackendKind, Config};

#[derive(Parser)]
#[command(name = "huddle", version, about = "Chat with a room of AI agents")]
pub struct Cli {
    /// Chat backend to use (local or http).
    #[arg(long, global = true)]
    pub backend: Option<BackendKind>,

    /// Base URL of the chat API (http backend only).
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat session (default).
    Chat {
        /// Session to join; a new one is created when omitted.
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Send a single message and print the replies.
    Send {
        /// Session to post to; a new one is created when omitted.
        #[arg(short, long)]
        session: Option<String>,

        /// Message text. Mention agents with @Name.
        message: String,
    },

    /// List available agents.
    Agents,

    /// Print the messages of a session.
    History {
        /// Session to print.
        #[arg(short, long)]
        session: Option<String>,

        /// Print messages as JSON.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
            // Pointing at a server implies talking to it.
            if self.backend.is_none() {
                config.backend = BackendKind::Http;
            }
        }
    }
}
