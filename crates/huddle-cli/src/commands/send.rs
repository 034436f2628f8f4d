//! One-shot send.

use super::{format_message, session_or_new};
use huddle_core::{SendOutcome, SessionManager};

/// Post `message` to a session and print the confirmed exchange.
pub async fn run(
    manager: &SessionManager,
    session: Option<String>,
    message: &str,
) -> anyhow::Result<()> {
    let session_id = session_or_new(session);
    manager
        .open_session(&session_id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load session {session_id}: {e}"))?;

    let outcome = manager
        .send(message)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to send message: {e}"))?;

    match outcome {
        SendOutcome::Reconciled {
            user_message,
            responses,
        } => {
            let agents = manager.cached_agents();
            println!("Session {session_id}");
            println!("{}", format_message(&user_message, &agents));
            for reply in &responses {
                println!("{}", format_message(reply, &agents));
            }
        }
        SendOutcome::Skipped => eprintln!("Nothing to send."),
        SendOutcome::Discarded => eprintln!("Session closed before the reply arrived."),
    }
    Ok(())
}
