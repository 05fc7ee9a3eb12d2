//! Conversation history: append-only log of every message exchanged in a
//! game, plus the per-agent projection sent to the inference endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::inference::{ChatMessage, Role};
use crate::roster::AgentId;

/// A recorded message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: Role,
    /// Authoring agent, `None` for system notices.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<AgentId>,
    /// Raw content; deliberation replies hold a JSON decision.
    pub content: String,
    /// Set on replies that failed evaluation.
    pub penalty: bool,
    /// Insertion index, never reused.
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn is_system(&self) -> bool {
        self.role == Role::System
    }
}

/// Append-only message log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    messages: Vec<Message>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a reply authored by an agent.
    pub fn push_agent(&mut self, author: &str, content: &str, penalty: bool) -> &Message {
        self.push(Role::Assistant, Some(author.to_string()), content, penalty)
    }

    /// Append a system notice.
    pub fn push_system(&mut self, content: &str) -> &Message {
        self.push(Role::System, None, content, false)
    }

    fn push(
        &mut self,
        role: Role,
        author: Option<AgentId>,
        content: &str,
        penalty: bool,
    ) -> &Message {
        let sequence = self.messages.len() as u64;
        self.messages.push(Message {
            role,
            author,
            content: content.to_string(),
            penalty,
            sequence,
            timestamp: Utc::now(),
        });
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// History as seen by `agent`.
    ///
    /// System notices pass through verbatim, other agents' messages become
    /// third-person ("X says: …") user messages, and the agent's own messages
    /// become first-person ("You, X, said: …") assistant messages.
    pub fn project_for(&self, agent: &str) -> Vec<ChatMessage> {
        self.messages
            .iter()
            .map(|message| match message.author.as_deref() {
                None => ChatMessage {
                    role: message.role,
                    content: message.content.clone(),
                },
                Some(author) if author == agent => {
                    ChatMessage::assistant(format!("You, {}, said: {}", author, message.content))
                }
                Some(author) => ChatMessage::user(format!("{} says: {}", author, message.content)),
            })
            .collect()
    }
}
