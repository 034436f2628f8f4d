//! Cached agent list with a freshness window.

use huddle_client::{Agent, ChatBackend, ClientError};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// How long a fetched agent list stays fresh by default.
pub const DEFAULT_AGENT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Default)]
struct Cached {
    agents: Vec<Agent>,
    fetched_at: Option<Instant>,
    loaded: bool,
}

/// Agent reference data fetched from a backend and reused while fresh.
pub struct AgentDirectory {
    backend: Arc<dyn ChatBackend>,
    ttl: Duration,
    cached: RwLock<Cached>,
    refresh: Mutex<()>,
}

impl AgentDirectory {
    pub fn new(backend: Arc<dyn ChatBackend>, ttl: Duration) -> Self {
        Self {
            backend,
            ttl,
            cached: RwLock::new(Cached::default()),
            refresh: Mutex::new(()),
        }
    }

    /// Whether the cached list is younger than the freshness window.
    pub fn is_fresh(&self) -> bool {
        let cached = self.cached.read().unwrap_or_else(PoisonError::into_inner);
        cached
            .fetched_at
            .is_some_and(|at| at.elapsed() < self.ttl)
    }

    /// Whether any fetch has succeeded yet, fresh or not.
    pub fn is_loaded(&self) -> bool {
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .loaded
    }

    /// The agent list, fetched from the backend when stale.
    ///
    /// A failed fetch leaves the previous list in place.
    pub async fn agents(&self) -> Result<Vec<Agent>, ClientError> {
        if self.is_fresh() {
            return Ok(self.cached());
        }

        // One fetch at a time; later callers reuse its result.
        let _guard = self.refresh.lock().await;
        if self.is_fresh() {
            return Ok(self.cached());
        }

        let agents = self.backend.fetch_agents().await.map_err(|err| {
            tracing::warn!(backend = self.backend.name(), error = %err, "agent fetch failed");
            err
        })?;
        tracing::debug!(count = agents.len(), "refreshed agent directory");

        let mut cached = self.cached.write().unwrap_or_else(PoisonError::into_inner);
        cached.agents = agents.clone();
        cached.fetched_at = Some(Instant::now());
        cached.loaded = true;
        Ok(agents)
    }

    /// The last fetched list, without contacting the backend.
    pub fn cached(&self) -> Vec<Agent> {
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .agents
            .clone()
    }

    /// Case-insensitive lookup in the cached list.
    pub fn find(&self, name: &str) -> Option<Agent> {
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .agents
            .iter()
            .find(|agent| agent.matches_name(name))
            .cloned()
    }

    /// Make the next [`AgentDirectory::agents`] call refetch.
    pub fn invalidate(&self) {
        self.cached
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fetched_at = None;
    }
}
