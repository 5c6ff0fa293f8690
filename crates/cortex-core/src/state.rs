//! UI-agnostic conversation types
//!
//! These are shared by every front end and by the turn executor. Nothing in
//! here knows about terminals or HTTP.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, per-conversation message identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(u64);

impl MessageId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A chat message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn label(&self) -> &'static str {
        match self {
            ChatRole::User => "You",
            ChatRole::Assistant => "Cortex",
        }
    }
}

/// Role names understood by the chat completion service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptRole {
    User,
    Model,
}

impl From<ChatRole> for TranscriptRole {
    fn from(role: ChatRole) -> Self {
        match role {
            ChatRole::User => TranscriptRole::User,
            ChatRole::Assistant => TranscriptRole::Model,
        }
    }
}

/// One prior message as sent to the chat completion service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub role: TranscriptRole,
    pub text: String,
}

impl From<&ChatMessage> for TranscriptEntry {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.into(),
            text: msg.content.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assistant_maps_to_model() {
        assert_eq!(TranscriptRole::from(ChatRole::Assistant), TranscriptRole::Model);
        assert_eq!(TranscriptRole::from(ChatRole::User), TranscriptRole::User);
    }

    #[test]
    fn test_transcript_role_serializes_lowercase() {
        let json = serde_json::to_string(&TranscriptRole::Model).unwrap();
        assert_eq!(json, "\"model\"");
    }
}
