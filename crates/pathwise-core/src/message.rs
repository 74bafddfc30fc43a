use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The role of the participant that authored a [`ChatMessage`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Workflow notices emitted by the engine itself.
    System,
    /// The learner.
    User,
    /// The chat agent.
    Assistant,
}

/// A single message of a session's conversation.
///
/// `knowledge_index` records which knowledge point was active when the
/// message was produced; it is what scopes the chat agent's context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub knowledge_index: usize,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Creates a message stamped with the current time.
    pub fn new(role: Role, content: impl Into<String>, knowledge_index: usize) -> Self {
        Self {
            role,
            content: content.into(),
            knowledge_index,
            timestamp: Utc::now(),
        }
    }

    /// Creates a message with [`Role::User`].
    pub fn user(content: impl Into<String>, knowledge_index: usize) -> Self {
        Self::new(Role::User, content, knowledge_index)
    }

    /// Creates a message with [`Role::Assistant`].
    pub fn assistant(content: impl Into<String>, knowledge_index: usize) -> Self {
        Self::new(Role::Assistant, content, knowledge_index)
    }

    /// Creates a message with [`Role::System`].
    pub fn system(content: impl Into<String>, knowledge_index: usize) -> Self {
        Self::new(Role::System, content, knowledge_index)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = ChatMessage::user("What is Q?", 2);
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "What is Q?");
        assert_eq!(msg.knowledge_index, 2);
    }

    #[test]
    fn test_message_serialization() {
        let msg = ChatMessage::assistant("Q is the query projection.", 0);
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"assistant\""));
        let deserialized: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, msg);
    }
}
