//! Interactive chat loop.

use super::{format_message, print_messages, session_or_new};
use huddle_core::{SendOutcome, SessionManager};
use tokio::io::{AsyncBufReadExt, BufReader};

/// One line of REPL input.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Empty,
    Quit,
    Agents,
    History,
    Session(String),
    Unknown(String),
    Message(String),
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Input::Message(line.to_string());
    };
    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("quit" | "exit"), _) => Input::Quit,
        (Some("agents"), _) => Input::Agents,
        (Some("history"), _) => Input::History,
        (Some("session"), Some(id)) => Input::Session(id.to_string()),
        _ => Input::Unknown(line.to_string()),
    }
}

/// Run interactive chat mode.
pub async fn run(manager: &SessionManager, session: Option<String>) -> anyhow::Result<()> {
    let session_id = session_or_new(session);
    if let Err(e) = manager.agents().await {
        eprintln!("Could not load agents: {e}");
    }
    open(manager, &session_id, false).await;
    println!("Type a message, mention agents with @Name. /agents, /session ID, /history, /quit");

    let mut typing = manager.typing();
    let indicator = tokio::spawn(async move {
        while typing.changed().await.is_ok() {
            let current = typing.borrow_and_update().clone();
            if let Some(agent) = current {
                eprintln!("{} is typing…", agent.label());
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_input(&line) {
            Input::Empty => {}
            Input::Quit => break,
            Input::Agents => super::agents::print_agents(manager).await,
            Input::History => print_messages(&manager.messages(), &manager.cached_agents()),
            Input::Session(id) => open(manager, &id, true).await,
            Input::Unknown(command) => eprintln!("Unknown command: {command}"),
            Input::Message(text) => match manager.send(&text).await {
                Ok(SendOutcome::Reconciled { responses, .. }) => {
                    let agents = manager.cached_agents();
                    for reply in &responses {
                        println!("{}", format_message(reply, &agents));
                    }
                }
                Ok(SendOutcome::Skipped | SendOutcome::Discarded) => {}
                Err(e) => eprintln!("Failed to send message: {e}"),
            },
        }
    }

    indicator.abort();
    Ok(())
}

async fn open(manager: &SessionManager, session_id: &str, switch: bool) {
    let result = if switch {
        manager.switch_session(session_id).await
    } else {
        manager.open_session(session_id).await
    };
    println!("Session {session_id}");
    match result {
        Ok(history) => print_messages(&history, &manager.cached_agents()),
        Err(e) => eprintln!("Failed to load messages: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("   "), Input::Empty);
        assert_eq!(parse_input("/quit"), Input::Quit);
        assert_eq!(parse_input("/agents"), Input::Agents);
        assert_eq!(parse_input("/history"), Input::History);
        assert_eq!(parse_input("/session room-2"), Input::Session("room-2".to_string()));
        assert_eq!(parse_input("/session"), Input::Unknown("/session".to_string()));
        assert_eq!(parse_input("/dance"), Input::Unknown("/dance".to_string()));
        assert_eq!(
            parse_input("  hi @Coder  "),
            Input::Message("hi @Coder".to_string())
        );
    }
}
