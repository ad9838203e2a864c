//! Conversation turns.

use serde::{Deserialize, Serialize};

use crate::ports::{Message, MessageRole};

/// Who spoke a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Speaker name used when rendering a transcript.
    pub fn speaker(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// One message in an interview conversation.
///
/// Turns are never edited after being appended to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Converts to a provider message.
    pub fn to_message(&self) -> Message {
        let role = match self.role {
            Role::User => MessageRole::User,
            Role::Assistant => MessageRole::Assistant,
        };
        Message::new(role, &self.content)
    }
}

/// Renders turns as a plain `Speaker: text` transcript, one turn per block.
pub fn render_transcript(conversation: &[Turn]) -> String {
    conversation
        .iter()
        .map(|turn| format!("{}: {}", turn.role.speaker(), turn.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}
