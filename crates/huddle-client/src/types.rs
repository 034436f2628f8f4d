//! Wire types exchanged with chat backends.

use crate::error::ClientError;
use chrono::{DateTime, Utc};
use huddle_session::{Author, Message};
use serde::{Deserialize, Deserializer, Serialize};

/// A named responder personality with display metadata.
///
/// Accepts both the camelCase and the snake_case field spellings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    /// Backend-assigned identifier.
    pub id: i64,
    /// Unique name used in `@mentions`, matched case-insensitively.
    pub name: String,
    /// Human-readable label.
    #[serde(default, alias = "display_name")]
    pub display_name: String,
    /// Short description for selection lists.
    #[serde(default)]
    pub description: String,
    /// Colour token for rendering.
    #[serde(default)]
    pub color: String,
    /// Avatar token for rendering.
    #[serde(default)]
    pub avatar: String,
    /// Whether the agent is offered for selection.
    #[serde(default = "default_active", alias = "is_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Agent {
    /// Whether `name` refers to this agent.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Display name, falling back to the canonical name.
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }
}

/// A stored message as the backend reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    /// Server-issued id.
    pub id: i64,
    /// Message text.
    pub content: String,
    /// Set by backends that report attribution explicitly.
    #[serde(default, alias = "is_user", skip_serializing_if = "Option::is_none")]
    pub is_user: Option<bool>,
    /// Replying agent, for agent messages.
    #[serde(default, alias = "agent_id", skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<i64>,
    /// Creation instant (RFC 3339).
    #[serde(default = "Utc::now", alias = "created_at")]
    pub timestamp: DateTime<Utc>,
    /// Mentioned agent names. `null` decodes as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub mentions: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl WireMessage {
    /// Whether the user wrote this message. Without an explicit flag, a
    /// message with no agent is the user's.
    pub fn from_user(&self) -> bool {
        self.is_user.unwrap_or(self.agent_id.is_none())
    }
}

impl TryFrom<WireMessage> for Message {
    type Error = ClientError;

    fn try_from(wire: WireMessage) -> Result<Self, Self::Error> {
        let author = match (wire.from_user(), wire.agent_id) {
            (true, _) => Author::User,
            (false, Some(agent_id)) => Author::Agent { agent_id },
            (false, None) => {
                return Err(ClientError::InvalidMessage(format!(
                    "message {} is neither from the user nor from an agent",
                    wire.id
                )))
            }
        };
        Ok(Message::confirmed(
            wire.id,
            wire.content,
            author,
            wire.timestamp,
            wire.mentions,
        ))
    }
}

/// Convert a batch of wire messages, failing on the first invalid one.
pub fn into_messages(wire: Vec<WireMessage>) -> Result<Vec<Message>, ClientError> {
    wire.into_iter().map(Message::try_from).collect()
}

/// Body of a send request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    /// Trimmed message text.
    pub content: String,
    /// Always true for messages sent by this client.
    pub is_user: bool,
    /// Canonical names of mentioned agents.
    pub mentions: Vec<String>,
    /// Target session.
    pub session_id: String,
}

impl SendMessageRequest {
    /// Build a user message request.
    pub fn new(
        session_id: impl Into<String>,
        content: impl Into<String>,
        mentions: Vec<String>,
    ) -> Self {
        Self {
            content: content.into(),
            is_user: true,
            mentions,
            session_id: session_id.into(),
        }
    }
}

/// Backend answer to a send: the stored user message and the agent replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    /// The user's message as stored.
    pub user_message: WireMessage,
    /// Agent replies in order.
    #[serde(default)]
    pub responses: Vec<WireMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_accepts_both_spellings() {
        let camel: Agent = serde_json::from_str(
            r#"{"id":2,"name":"Coder","displayName":"Coder","description":"Programming",
                "color":"from-green-500","avatar":"C","isActive":true}"#,
        )
        .unwrap();
        let snake: Agent = serde_json::from_str(
            r#"{"id":2,"name":"Coder","display_name":"Coder","description":"Programming",
                "color":"from-green-500","avatar":"C","is_active":true}"#,
        )
        .unwrap();
        assert_eq!(camel, snake);
    }

    #[test]
    fn test_agent_minimal_defaults() {
        let agent: Agent = serde_json::from_str(r#"{"id":1,"name":"Assistant"}"#).unwrap();
        assert!(agent.is_active);
        assert_eq!(agent.label(), "Assistant");
        assert!(agent.matches_name("assistant"));
        assert!(!agent.matches_name("assist"));
    }

    #[test]
    fn test_wire_message_null_mentions() {
        let msg: WireMessage = serde_json::from_str(
            r#"{"id":1,"content":"hi","isUser":true,"timestamp":"2024-05-01T10:00:00Z","mentions":null}"#,
        )
        .unwrap();
        assert!(msg.mentions.is_empty());
        assert!(msg.from_user());
    }

    #[test]
    fn test_wire_message_infers_user_without_flag() {
        let msg: WireMessage =
            serde_json::from_str(r#"{"id":1,"content":"hi","timestamp":"2024-05-01T10:00:00Z"}"#)
                .unwrap();
        assert!(msg.from_user());

        let reply: WireMessage = serde_json::from_str(
            r#"{"id":2,"content":"hello","agent_id":3,"timestamp":"2024-05-01T10:00:01Z"}"#,
        )
        .unwrap();
        assert!(!reply.from_user());
    }

    #[test]
    fn test_conversion_to_cache_message() {
        let wire: WireMessage = serde_json::from_str(
            r#"{"id":8,"content":"answer","isUser":false,"agentId":2,"timestamp":"2024-05-01T10:00:00Z","mentions":[]}"#,
        )
        .unwrap();
        let msg = Message::try_from(wire).unwrap();
        assert_eq!(msg.id, huddle_session::MessageId::Confirmed(8));
        assert_eq!(msg.agent_id(), Some(2));
    }

    #[test]
    fn test_conversion_rejects_unattributed_agent_message() {
        let wire = WireMessage {
            id: 5,
            content: "orphan".to_string(),
            is_user: Some(false),
            agent_id: None,
            timestamp: Utc::now(),
            mentions: Vec::new(),
        };
        let err = Message::try_from(wire).unwrap_err();
        assert!(matches!(err, ClientError::InvalidMessage(_)));
    }

    #[test]
    fn test_send_request_wire_shape() {
        let request = SendMessageRequest::new("s1", "Hi @Coder", vec!["Coder".to_string()]);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "content": "Hi @Coder",
                "isUser": true,
                "mentions": ["Coder"],
                "sessionId": "s1",
            })
        );
    }

    #[test]
    fn test_send_response_defaults_responses() {
        let response: SendMessageResponse = serde_json::from_str(
            r#"{"userMessage":{"id":1,"content":"hi","isUser":true,"timestamp":"2024-05-01T10:00:00Z"}}"#,
        )
        .unwrap();
        assert!(response.responses.is_empty());
        assert_eq!(response.user_message.id, 1);
    }
}
