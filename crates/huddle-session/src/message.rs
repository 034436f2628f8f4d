//! Chat message types held in the session cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a cached message.
///
/// A message is `Provisional` while its send is in flight and becomes
/// `Confirmed` once the server has assigned it an id. Ids from the two
/// spaces never compare equal, even when their numbers match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MessageId {
    /// Locally allocated placeholder awaiting confirmation.
    Provisional(u64),
    /// Server-issued identifier.
    Confirmed(i64),
}

impl MessageId {
    /// Whether this id belongs to a not-yet-confirmed message.
    pub fn is_provisional(&self) -> bool {
        matches!(self, MessageId::Provisional(_))
    }

    /// The server id, if confirmed.
    pub fn server_id(&self) -> Option<i64> {
        match self {
            MessageId::Confirmed(id) => Some(*id),
            MessageId::Provisional(_) => None,
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Provisional(id) => write!(f, "tmp-{id}"),
            MessageId::Confirmed(id) => write!(f, "{id}"),
        }
    }
}

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Author {
    /// The local user.
    User,
    /// An agent reply.
    Agent { agent_id: i64 },
}

/// A single message in a chat session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Provisional or confirmed identity.
    pub id: MessageId,
    /// Message text.
    pub content: String,
    /// Attribution.
    pub author: Author,
    /// Creation instant.
    pub timestamp: DateTime<Utc>,
    /// Canonical agent names mentioned in the text.
    #[serde(default)]
    pub mentions: Vec<String>,
}

impl Message {
    /// Create a provisional user message stamped with the current time.
    pub fn provisional(local_id: u64, content: impl Into<String>, mentions: Vec<String>) -> Self {
        Self {
            id: MessageId::Provisional(local_id),
            content: content.into(),
            author: Author::User,
            timestamp: Utc::now(),
            mentions,
        }
    }

    /// Create a server-confirmed message.
    pub fn confirmed(
        id: i64,
        content: impl Into<String>,
        author: Author,
        timestamp: DateTime<Utc>,
        mentions: Vec<String>,
    ) -> Self {
        Self {
            id: MessageId::Confirmed(id),
            content: content.into(),
            author,
            timestamp,
            mentions,
        }
    }

    /// Whether the user wrote this message.
    pub fn is_user(&self) -> bool {
        self.author == Author::User
    }

    /// The replying agent's id, for agent messages.
    pub fn agent_id(&self) -> Option<i64> {
        match self.author {
            Author::Agent { agent_id } => Some(agent_id),
            Author::User => None,
        }
    }

    /// Whether this message is still awaiting server confirmation.
    pub fn is_provisional(&self) -> bool {
        self.id.is_provisional()
    }
}
