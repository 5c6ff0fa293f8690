//! In-memory conversation store
//!
//! Holds the ordered message list and the single "request in flight" flag.
//! The store never fails and performs no I/O; admission rules live in the
//! turn executor.

use chrono::Utc;
use crate::state::{ChatMessage, ChatRole, MessageId};

pub const GREETING: &str = "Hello! I'm Cortex. I'm here to help you with your daily tasks and coding projects. What can I do for you today?";

pub const RESET_GREETING: &str = "Chat cleared. I'm Cortex, how can I help you now?";

#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    pending: bool,
    next_id: u64,
}

impl Conversation {
    /// Start a conversation seeded with the assistant greeting
    pub fn new() -> Self {
        let mut conversation = Self {
            messages: Vec::new(),
            pending: false,
            next_id: 1,
        };
        conversation.push_assistant(GREETING);
        conversation
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false: the sequence is seeded on creation and on reset.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn set_pending(&mut self, pending: bool) {
        self.pending = pending;
    }

    /// Append a message to the end of the sequence. Content is not validated.
    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn push_user(&mut self, content: &str) -> MessageId {
        self.push(ChatRole::User, content)
    }

    pub fn push_assistant(&mut self, content: &str) -> MessageId {
        self.push(ChatRole::Assistant, content)
    }

    /// Discard every message and start over from a single greeting.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.pending = false;
        self.push_assistant(RESET_GREETING);
    }

    fn push(&mut self, role: ChatRole, content: &str) -> MessageId {
        let id = MessageId::new(self.next_id);
        self.next_id += 1;
        self.append(ChatMessage {
            id,
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
        });
        id
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_conversation_has_single_greeting() {
        let conversation = Conversation::new();
        assert_eq!(conversation.len(), 1);
        assert!(!conversation.is_pending());

        let seed = conversation.last().unwrap();
        assert_eq!(seed.role, ChatRole::Assistant);
        assert_eq!(seed.content, GREETING);
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let mut conversation = Conversation::new();
        let a = conversation.push_user("one");
        let b = conversation.push_assistant("two");
        assert!(b > a);

        conversation.reset();
        let c = conversation.messages()[0].id;
        assert!(c > b);
    }

    #[test]
    fn test_append_preserves_order() {
        let mut conversation = Conversation::new();
        conversation.push_user("first");
        conversation.push_assistant("second");
        conversation.push_user("third");

        let contents: Vec<&str> = conversation
            .messages()
            .iter()
            .skip(1)
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_reset_clears_history_and_pending() {
        let mut conversation = Conversation::new();
        conversation.push_user("hello");
        conversation.push_assistant("hi");
        conversation.set_pending(true);

        conversation.reset();

        assert_eq!(conversation.len(), 1);
        assert!(!conversation.is_pending());
        assert_eq!(conversation.messages()[0].content, RESET_GREETING);
        assert_eq!(conversation.messages()[0].role, ChatRole::Assistant);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut conversation = Conversation::new();
        for i in 0..5 {
            conversation.push_user(&format!("message {}", i));
        }

        conversation.reset();
        let first: Vec<(ChatRole, String)> = conversation
            .messages()
            .iter()
            .map(|m| (m.role, m.content.clone()))
            .collect();

        conversation.reset();
        conversation.reset();
        let again: Vec<(ChatRole, String)> = conversation
            .messages()
            .iter()
            .map(|m| (m.role, m.content.clone()))
            .collect();

        assert_eq!(first, again);
        assert!(!conversation.is_pending());
    }
}
