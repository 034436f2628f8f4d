//! Session history printing.

use super::{print_messages, session_or_new};
use huddle_core::SessionManager;

pub async fn run(manager: &SessionManager, session: Option<String>, json: bool) -> anyhow::Result<()> {
    let session_id = session_or_new(session);
    let messages = manager
        .open_session(&session_id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load session {session_id}: {e}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!("No messages in session {session_id}.");
        return Ok(());
    }
    // Names are best effort; ids are printed when agents can't be fetched.
    let agents = manager.agents().await.unwrap_or_default();
    print_messages(&messages, &agents);
    Ok(())
}
