//! Agent listing.

use huddle_core::SessionManager;

pub async fn run(manager: &SessionManager) -> anyhow::Result<()> {
    let agents = manager
        .agents()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to fetch agents: {e}"))?;
    if agents.is_empty() {
        println!("No agents available.");
    }
    for agent in &agents {
        println!("@{:<12} {}", agent.name, agent.description);
    }
    Ok(())
}

/// Print agents inside the chat loop, reporting errors instead of failing.
pub async fn print_agents(manager: &SessionManager) {
    if let Err(e) = run(manager).await {
        eprintln!("{e}");
    }
}
