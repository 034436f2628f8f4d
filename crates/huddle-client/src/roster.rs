//! Built-in agent roster and canned replies for the local backend.

use crate::types::Agent;

/// Name of the agent that answers messages without any mention.
pub const DEFAULT_AGENT: &str = "Assistant";

/// Static description of a built-in agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentSeed {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub color: &'static str,
    pub avatar: &'static str,
    pub replies: &'static [&'static str],
}

const ASSISTANT_REPLIES: &[&str] = &[
    "I'd be happy to help you with that! Let me provide you with a comprehensive response.",
    "That's an interesting question. Here's what I think about it...",
    "I can definitely assist you with this. Let me break it down for you.",
];

const BUILTIN_AGENTS: &[AgentSeed] = &[
    AgentSeed {
        name: "Assistant",
        display_name: "Assistant",
        description: "General purpose AI helper",
        color: "from-purple-500 to-blue-600",
        avatar: "A",
        replies: ASSISTANT_REPLIES,
    },
    AgentSeed {
        name: "Coder",
        display_name: "Coder",
        description: "Programming and development",
        color: "from-green-500 to-emerald-600",
        avatar: "C",
        replies: &[
            "Here's a technical solution for your problem:\n\n```rust\n\
fn solution() -> &'static str {\n    \"This would be actual code\"\n}\n```\n\n\
Would you like me to explain any part of this implementation?",
            "I can help you with that programming challenge. Let me write some code for you.",
            "That's a great coding question! Here's how I would approach it with clean, efficient code.",
        ],
    },
    AgentSeed {
        name: "Writer",
        display_name: "Writer",
        description: "Creative writing and content",
        color: "from-orange-500 to-red-600",
        avatar: "W",
        replies: &[
            "I'll craft some compelling content for you. Here's a well-structured response that addresses your needs.",
            "Let me help you with that writing task. I'll focus on clarity, engagement, and proper structure.",
            "That's a great topic for creative writing! Let me develop that idea for you.",
        ],
    },
    AgentSeed {
        name: "Researcher",
        display_name: "Researcher",
        description: "Data analysis and research",
        color: "from-indigo-500 to-purple-600",
        avatar: "R",
        replies: &[
            "I've analyzed this topic thoroughly. Here are the key findings and insights based on current data.",
            "Let me provide you with comprehensive research on this subject, including relevant statistics and sources.",
            "Based on my analysis, here are the most important points you should consider.",
        ],
    },
];

/// Registry over the built-in agents.
pub struct Roster;

impl Roster {
    /// Returns the seed with the given name, ignoring case.
    pub fn get(name: &str) -> Option<&'static AgentSeed> {
        BUILTIN_AGENTS
            .iter()
            .find(|seed| seed.name.eq_ignore_ascii_case(name))
    }

    /// Materialize the built-ins as agents with ids starting at 1.
    pub fn agents() -> Vec<Agent> {
        BUILTIN_AGENTS
            .iter()
            .zip(1..)
            .map(|(seed, id)| seed.to_agent(id))
            .collect()
    }

    /// Pick a canned reply for `agent_name`.
    ///
    /// Unknown agents answer with the default agent's replies. `turn` rotates
    /// through the available templates.
    pub fn reply(agent_name: &str, turn: i64) -> &'static str {
        let replies = Self::get(agent_name)
            .map(|seed| seed.replies)
            .unwrap_or(ASSISTANT_REPLIES);
        let index = turn.rem_euclid(replies.len() as i64) as usize;
        replies[index]
    }
}

impl AgentSeed {
    /// Build an active agent with the given id.
    pub fn to_agent(&self, id: i64) -> Agent {
        Agent {
            id,
            name: self.name.to_string(),
            display_name: self.display_name.to_string(),
            description: self.description.to_string(),
            color: self.color.to_string(),
            avatar: self.avatar.to_string(),
            is_active: true,
        }
    }
}
