//! Command implementations.

pub mod agents;
pub mod chat;
pub mod history;
pub mod send;

use huddle_client::Agent;
use huddle_core::{Config, SessionManager};
use huddle_session::{Author, Message};

/// Build a session manager for the configured backend.
pub fn build_manager(config: &Config) -> anyhow::Result<SessionManager> {
    let backend = config
        .build_backend()
        .map_err(|e| anyhow::anyhow!("Failed to set up {} backend: {e}", config.backend))?;
    Ok(SessionManager::new(backend, config.manager_options()))
}

/// The given session id, or a freshly generated one.
pub fn session_or_new(session: Option<String>) -> String {
    session.unwrap_or_else(|| ulid::Ulid::new().to_string().to_lowercase())
}

/// Display name of a message's author.
pub fn author_label(message: &Message, agents: &[Agent]) -> String {
    match message.author {
        Author::User => "You".to_string(),
        Author::Agent { agent_id } => agents
            .iter()
            .find(|agent| agent.id == agent_id)
            .map(|agent| agent.label().to_string())
            .unwrap_or_else(|| format!("Agent #{agent_id}")),
    }
}

/// One line per message: `[HH:MM] Author: content`.
pub fn format_message(message: &Message, agents: &[Agent]) -> String {
    let pending = if message.is_provisional() { " (sending)" } else { "" };
    format!(
        "[{}] {}{}: {}",
        message.timestamp.format("%H:%M"),
        author_label(message, agents),
        pending,
        message.content
    )
}

pub fn print_messages(messages: &[Message], agents: &[Agent]) {
    for message in messages {
        println!("{}", format_message(message, agents));
    }
}
