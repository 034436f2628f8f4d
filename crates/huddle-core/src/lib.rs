//! huddle-core: session manager, optimistic sends, mentions and configuration.

pub mod config;
pub mod coordinator;
pub mod directory;
mod error;
pub mod manager;
pub mod mention;
pub mod typing;

pub use config::{BackendKind, Config, ConfigStore, BASE_URL_ENV};
pub use coordinator::{SendCoordinator, SendOutcome, SendPhase};
pub use directory::{AgentDirectory, DEFAULT_AGENT_TTL};
pub use error::HuddleError;
pub use manager::{ManagerOptions, SessionManager};
pub use mention::{
    filter_agents, find_mention_matches, insert_mention, parse_mentions, resolve_mention_context,
    MentionComposer, MentionContext, MentionEdit, MentionMatch,
};
pub use typing::{resolve_typing_agent, TypingIndicator};
