//! Backend trait definition.

use crate::error::ClientError;
use crate::types::{Agent, SendMessageRequest, SendMessageResponse, WireMessage};
use async_trait::async_trait;

/// Trait for chat backend implementations.
///
/// A backend stores messages per session, knows the agent roster and produces
/// agent replies for each user message it accepts.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Backend name (e.g., "http", "local").
    fn name(&self) -> &str;

    /// List the agents available for conversation.
    async fn fetch_agents(&self) -> Result<Vec<Agent>, ClientError>;

    /// Fetch the stored history of a session.
    async fn fetch_messages(&self, session_id: &str) -> Result<Vec<WireMessage>, ClientError>;

    /// Submit a user message and wait for the confirmed message plus replies.
    async fn send_message(
        &self,
        request: SendMessageRequest,
    ) -> Result<SendMessageResponse, ClientError>;
}

// Compile-time check: ChatBackend must be object-safe
const _: () = {
    fn _assert_object_safe(_: &dyn ChatBackend) {}
};
