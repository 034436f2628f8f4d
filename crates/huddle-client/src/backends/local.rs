//! In-process backend with canned agent replies.
//!
//! Stores messages per session in memory and answers each user message with
//! one reply per mentioned agent, or with the default agent when nothing is
//! mentioned.

use crate::error::ClientError;
use crate::roster::{Roster, DEFAULT_AGENT};
use crate::traits::ChatBackend;
use crate::types::{Agent, SendMessageRequest, SendMessageResponse, WireMessage};
use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

static MENTION_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([A-Za-z0-9_]+)").expect("mention pattern is valid"));

/// Configuration for the local backend.
#[derive(Debug, Clone, Default)]
pub struct LocalBackendConfig {
    /// Simulated thinking time before each agent reply.
    pub reply_delay: Duration,
}

#[derive(Debug)]
struct LocalState {
    agents: Vec<Agent>,
    sessions: HashMap<String, Vec<WireMessage>>,
    next_agent_id: i64,
    next_message_id: i64,
}

impl LocalState {
    fn store(&mut self, session_id: &str, mut message: WireMessage) -> WireMessage {
        message.id = self.next_message_id;
        self.next_message_id += 1;
        self.sessions
            .entry(session_id.to_string())
            .or_default()
            .push(message.clone());
        message
    }

    fn agent_by_name(&self, name: &str) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.matches_name(name))
    }
}

/// A backend that lives inside the process.
pub struct LocalBackend {
    config: LocalBackendConfig,
    state: Mutex<LocalState>,
}

impl LocalBackend {
    /// Create a backend seeded with the built-in roster.
    pub fn new(config: LocalBackendConfig) -> Self {
        let agents = Roster::agents();
        let next_agent_id = agents.len() as i64 + 1;
        Self {
            config,
            state: Mutex::new(LocalState {
                agents,
                sessions: HashMap::new(),
                next_agent_id,
                next_message_id: 1,
            }),
        }
    }

    /// Register an extra agent. The id is assigned by the backend.
    pub async fn insert_agent(&self, mut agent: Agent) -> Agent {
        let mut state = self.state.lock().await;
        agent.id = state.next_agent_id;
        state.next_agent_id += 1;
        state.agents.push(agent.clone());
        agent
    }
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new(LocalBackendConfig::default())
    }
}

/// Distinct `@word` tokens in first-seen order, as typed.
fn extract_mentions(content: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for capture in MENTION_TOKEN.captures_iter(content) {
        let name = &capture[1];
        if !names.iter().any(|seen| seen == name) {
            names.push(name.to_string());
        }
    }
    names
}

#[async_trait]
impl ChatBackend for LocalBackend {
    fn name(&self) -> &str {
        "local"
    }

    async fn fetch_agents(&self) -> Result<Vec<Agent>, ClientError> {
        let state = self.state.lock().await;
        Ok(state
            .agents
            .iter()
            .filter(|agent| agent.is_active)
            .cloned()
            .collect())
    }

    async fn fetch_messages(&self, session_id: &str) -> Result<Vec<WireMessage>, ClientError> {
        let state = self.state.lock().await;
        Ok(state.sessions.get(session_id).cloned().unwrap_or_default())
    }

    async fn send_message(
        &self,
        request: SendMessageRequest,
    ) -> Result<SendMessageResponse, ClientError> {
        if request.content.trim().is_empty() {
            return Err(ClientError::Api {
                status: 400,
                message: "Invalid message data".to_string(),
            });
        }

        let (user_message, responders) = {
            let mut state = self.state.lock().await;
            let user_message = state.store(
                &request.session_id,
                WireMessage {
                    id: 0,
                    content: request.content.clone(),
                    is_user: Some(true),
                    agent_id: None,
                    timestamp: Utc::now(),
                    mentions: request.mentions.clone(),
                },
            );

            let mentions = extract_mentions(&request.content);
            let mut responders: Vec<Agent> = Vec::new();
            if mentions.is_empty() {
                responders.extend(state.agent_by_name(DEFAULT_AGENT).cloned());
            } else {
                for name in &mentions {
                    if let Some(agent) = state.agent_by_name(name) {
                        if !responders.iter().any(|r| r.id == agent.id) {
                            responders.push(agent.clone());
                        }
                    }
                }
            }
            (user_message, responders)
        };

        tracing::debug!(
            session = %request.session_id,
            message_id = user_message.id,
            responders = responders.len(),
            "stored user message"
        );

        let mut responses = Vec::with_capacity(responders.len());
        for agent in responders {
            if !self.config.reply_delay.is_zero() {
                tokio::time::sleep(self.config.reply_delay).await;
            }
            let content = Roster::reply(&agent.name, user_message.id);
            let mut state = self.state.lock().await;
            let reply = state.store(
                &request.session_id,
                WireMessage {
                    id: 0,
                    content: content.to_string(),
                    is_user: Some(false),
                    agent_id: Some(agent.id),
                    timestamp: Utc::now(),
                    mentions: Vec::new(),
                },
            );
            responses.push(reply);
        }

        Ok(SendMessageResponse {
            user_message,
            responses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(session: &str, content: &str) -> SendMessageRequest {
        SendMessageRequest::new(session, content, Vec::new())
    }

    #[test]
    fn test_extract_mentions_dedupes_in_order() {
        assert_eq!(
            extract_mentions("@Writer then @Coder and @Writer"),
            vec!["Writer".to_string(), "Coder".to_string()]
        );
        assert!(extract_mentions("no mentions").is_empty());
    }

    #[tokio::test]
    async fn test_lists_builtin_agents() {
        let backend = LocalBackend::default();
        let agents = backend.fetch_agents().await.unwrap();
        assert_eq!(agents.len(), 4);
        assert_eq!(agents[1].name, "Coder");
    }

    #[tokio::test]
    async fn test_inactive_agents_are_not_listed() {
        let backend = LocalBackend::default();
        let hidden = backend
            .insert_agent(Agent {
                id: 0,
                name: "Archivist".to_string(),
                display_name: "Archivist".to_string(),
                description: "Retired".to_string(),
                color: String::new(),
                avatar: "Z".to_string(),
                is_active: false,
            })
            .await;
        assert_eq!(hidden.id, 5);

        let agents = backend.fetch_agents().await.unwrap();
        assert!(agents.iter().all(|a| a.name != "Archivist"));
    }

    #[tokio::test]
    async fn test_unmentioned_message_gets_default_reply() {
        let backend = LocalBackend::default();
        let response = backend.send_message(request("s", "hello")).await.unwrap();
        assert_eq!(response.user_message.id, 1);
        assert!(response.user_message.from_user());
        assert_eq!(response.responses.len(), 1);
        assert_eq!(response.responses[0].agent_id, Some(1));
    }

    #[tokio::test]
    async fn test_one_reply_per_mentioned_agent() {
        let backend = LocalBackend::default();
        let response = backend
            .send_message(request("s", "@coder and @Writer, also @Coder"))
            .await
            .unwrap();
        let agent_ids: Vec<_> = response.responses.iter().map(|m| m.agent_id).collect();
        assert_eq!(agent_ids, vec![Some(2), Some(3)]);
    }

    #[tokio::test]
    async fn test_unknown_mentions_get_no_reply() {
        let backend = LocalBackend::default();
        let response = backend.send_message(request("s", "@Nobody hi")).await.unwrap();
        assert!(response.responses.is_empty());
    }

    #[tokio::test]
    async fn test_blank_content_is_rejected() {
        let backend = LocalBackend::default();
        let err = backend.send_message(request("s", "   ")).await.unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 400, .. }));
        assert!(backend.fetch_messages("s").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_is_scoped_per_session() {
        let backend = LocalBackend::default();
        backend.send_message(request("a", "first")).await.unwrap();
        backend.send_message(request("b", "second")).await.unwrap();

        let a = backend.fetch_messages("a").await.unwrap();
        let b = backend.fetch_messages("b").await.unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(b.len(), 2);
        assert_eq!(a[0].content, "first");
        assert_eq!(b[0].content, "second");
        assert!(b[0].id > a[1].id);
    }
}
