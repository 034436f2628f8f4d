//! Session manager: the context object that owns all client-side chat state.

use crate::coordinator::{SendCoordinator, SendOutcome};
use crate::directory::{AgentDirectory, DEFAULT_AGENT_TTL};
use crate::error::HuddleError;
use crate::mention::{parse_mentions, MentionComposer};
use crate::typing::TypingIndicator;
use huddle_client::types::into_messages;
use huddle_client::{Agent, ChatBackend};
use huddle_session::{Message, SessionCache};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::watch;

/// Tunables for a [`SessionManager`].
#[derive(Debug, Clone)]
pub struct ManagerOptions {
    /// Freshness window of the agent list.
    pub agent_ttl: Duration,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            agent_ttl: DEFAULT_AGENT_TTL,
        }
    }
}

/// Owns the message cache, agent directory, typing indicator and send
/// coordinator for one client.
pub struct SessionManager {
    backend: Arc<dyn ChatBackend>,
    cache: Arc<SessionCache>,
    directory: Arc<AgentDirectory>,
    typing: Arc<TypingIndicator>,
    coordinator: SendCoordinator,
    active: RwLock<Option<String>>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn ChatBackend>, options: ManagerOptions) -> Self {
        let cache = Arc::new(SessionCache::new());
        let directory = Arc::new(AgentDirectory::new(backend.clone(), options.agent_ttl));
        let typing = Arc::new(TypingIndicator::new());
        let coordinator = SendCoordinator::new(
            backend.clone(),
            cache.clone(),
            directory.clone(),
            typing.clone(),
        );
        Self {
            backend,
            cache,
            directory,
            typing,
            coordinator,
            active: RwLock::new(None),
        }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Make `session_id` active and load its history.
    ///
    /// On failure the session stays active with an empty cache and the error
    /// is returned. Nothing is retried.
    pub async fn open_session(&self, session_id: &str) -> Result<Vec<Message>, HuddleError> {
        self.set_active(Some(session_id.to_string()));
        tracing::info!(session = %session_id, backend = self.backend.name(), "opening session");

        let history = self
            .backend
            .fetch_messages(session_id)
            .await
            .map_err(HuddleError::from)
            .and_then(|wire| into_messages(wire).map_err(HuddleError::from));
        let history = match history {
            Ok(history) => history,
            Err(err) => {
                tracing::warn!(session = %session_id, error = %err, "failed to load history");
                return Err(err);
            }
        };

        // A switch while the fetch was running wins over this result.
        if self.active_session().as_deref() != Some(session_id) {
            tracing::debug!(session = %session_id, "session switched during load; dropping history");
            return Ok(history);
        }
        self.cache.seed(session_id, history.clone());
        Ok(history)
    }

    /// Close the active session's cache entry and open `session_id`.
    ///
    /// Sends still in flight for the old session are discarded when they
    /// complete.
    pub async fn switch_session(&self, session_id: &str) -> Result<Vec<Message>, HuddleError> {
        if let Some(previous) = self.active_session() {
            if previous != session_id {
                self.cache.close(&previous);
            }
        }
        self.open_session(session_id).await
    }

    pub fn active_session(&self) -> Option<String> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_active(&self, session_id: Option<String>) {
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = session_id;
    }

    fn require_active(&self) -> Result<String, HuddleError> {
        self.active_session().ok_or(HuddleError::NoActiveSession)
    }

    /// Messages of the active session; empty when none is open.
    pub fn messages(&self) -> Vec<Message> {
        self.active_session()
            .map(|id| self.cache.get(&id))
            .unwrap_or_default()
    }

    pub fn messages_for(&self, session_id: &str) -> Vec<Message> {
        self.cache.get(session_id)
    }

    /// Send to the active session, mentioning the agents named in `content`.
    pub async fn send(&self, content: &str) -> Result<SendOutcome, HuddleError> {
        let session_id = self.require_active()?;
        if content.trim().is_empty() {
            return Ok(SendOutcome::Skipped);
        }
        let mentions = parse_mentions(content, &self.mention_agents().await);
        self.coordinator.send(&session_id, content, mentions).await
    }

    /// Agents to resolve mentions against.
    ///
    /// Only the very first send waits for a fetch. Later sends use the cached
    /// list and refresh a stale one in the background.
    async fn mention_agents(&self) -> Vec<Agent> {
        if !self.directory.is_loaded() {
            if let Err(err) = self.directory.agents().await {
                tracing::debug!(error = %err, "no agents for mention parsing");
            }
        } else if !self.directory.is_fresh() {
            let directory = self.directory.clone();
            tokio::spawn(async move {
                // Failures are logged by the directory.
                let _ = directory.agents().await;
            });
        }
        self.directory.cached()
    }

    /// Send to the active session with caller-supplied mentions.
    pub async fn send_with_mentions(
        &self,
        content: &str,
        mentions: Vec<String>,
    ) -> Result<SendOutcome, HuddleError> {
        let session_id = self.require_active()?;
        self.coordinator.send(&session_id, content, mentions).await
    }

    /// Agent list, refetched when stale.
    pub async fn agents(&self) -> Result<Vec<Agent>, HuddleError> {
        Ok(self.directory.agents().await?)
    }

    /// Agent list, always refetched.
    pub async fn refresh_agents(&self) -> Result<Vec<Agent>, HuddleError> {
        self.directory.invalidate();
        self.agents().await
    }

    pub fn cached_agents(&self) -> Vec<Agent> {
        self.directory.cached()
    }

    /// Watch the agent expected to reply next.
    pub fn typing(&self) -> watch::Receiver<Option<Agent>> {
        self.typing.subscribe()
    }

    pub fn typing_agent(&self) -> Option<Agent> {
        self.typing.current()
    }

    pub fn is_sending(&self) -> bool {
        self.coordinator.is_sending()
    }

    /// A fresh draft editor for this client.
    pub fn composer(&self) -> MentionComposer {
        MentionComposer::new()
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    /// Drop every cached session and forget the active one.
    pub fn shutdown(&self) {
        self.set_active(None);
        self.cache.clear();
        self.typing.clear();
        tracing::debug!("session manager shut down");
    }
}
