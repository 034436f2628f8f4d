//! "Agent is typing" signal for pending sends.

use huddle_client::Agent;
use tokio::sync::watch;

/// First mention, in order, that names a known agent.
pub fn resolve_typing_agent(mentions: &[String], agents: &[Agent]) -> Option<Agent> {
    mentions
        .iter()
        .find_map(|mention| agents.iter().find(|agent| agent.matches_name(mention)))
        .cloned()
}

/// Best-effort indicator of which agent is about to reply.
///
/// Backed by a watch channel so front ends can await changes.
#[derive(Debug)]
pub struct TypingIndicator {
    tx: watch::Sender<Option<Agent>>,
}

impl TypingIndicator {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Set the indicator from a send's mentions. Leaves it untouched when no
    /// mention resolves.
    pub fn start(&self, mentions: &[String], agents: &[Agent]) -> Option<Agent> {
        let agent = resolve_typing_agent(mentions, agents)?;
        tracing::debug!(agent = %agent.name, "agent typing");
        self.tx.send_replace(Some(agent.clone()));
        Some(agent)
    }

    /// Unset the indicator.
    pub fn clear(&self) {
        self.tx.send_if_modified(|current| current.take().is_some());
    }

    pub fn current(&self) -> Option<Agent> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Agent>> {
        self.tx.subscribe()
    }
}

impl Default for TypingIndicator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huddle_client::roster::Roster;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_resolvable_mention_wins() {
        let agents = Roster::agents();
        let agent = resolve_typing_agent(&names(&["Nobody", "writer", "Coder"]), &agents);
        assert_eq!(agent.map(|a| a.name), Some("Writer".to_string()));
    }

    #[test]
    fn test_no_fallback_agent() {
        let agents = Roster::agents();
        assert!(resolve_typing_agent(&names(&["Nobody"]), &agents).is_none());
        assert!(resolve_typing_agent(&[], &agents).is_none());
    }

    #[test]
    fn test_start_and_clear() {
        let indicator = TypingIndicator::new();
        let agents = Roster::agents();

        assert!(indicator.start(&names(&["Coder"]), &agents).is_some());
        assert_eq!(indicator.current().map(|a| a.id), Some(2));

        indicator.clear();
        assert!(indicator.current().is_none());
    }

    #[test]
    fn test_unresolved_start_leaves_indicator_unset() {
        let indicator = TypingIndicator::new();
        assert!(indicator.start(&names(&["Coder"]), &[]).is_none());
        assert!(indicator.current().is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let indicator = TypingIndicator::new();
        let mut rx = indicator.subscribe();

        indicator.start(&names(&["Researcher"]), &Roster::agents());
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref().map(|a| a.id), Some(4));

        indicator.clear();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }
}
