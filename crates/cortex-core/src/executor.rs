//! Turn execution: one user submission, one assistant reply.
//!
//! `submit` runs a whole turn. Hosts that need to keep drawing while the
//! request is in flight use `begin` and `settle` around their own task.

use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::ai::{ChatError, ChatService};
use crate::conversation::Conversation;
use crate::state::TranscriptEntry;

pub const FALLBACK_REPLY: &str = "I'm sorry, I couldn't generate a response.";

pub const ERROR_REPLY: &str = "I encountered an error. Please check your connection or try again later.";

/// Where a conversation is in its per-turn lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Sending,
}

impl TurnState {
    pub fn of(conversation: &Conversation) -> Self {
        if conversation.is_pending() {
            TurnState::Sending
        } else {
            TurnState::Idle
        }
    }
}

/// An admitted turn waiting for the chat service
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub message: String,
    pub history: Vec<TranscriptEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Empty text or a turn already in flight; nothing changed
    Rejected,
    Answered,
    /// The service answered without text
    Fallback,
    Failed,
}

pub struct TurnExecutor {
    service: Arc<dyn ChatService>,
}

impl TurnExecutor {
    pub fn new(service: Arc<dyn ChatService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> Arc<dyn ChatService> {
        Arc::clone(&self.service)
    }

    /// Run one complete turn against the chat service.
    pub async fn submit(&self, conversation: &mut Conversation, text: &str) -> TurnOutcome {
        let Some(turn) = Self::begin(conversation, text) else {
            return TurnOutcome::Rejected;
        };
        let result = self.service.send_turn(&turn.message, &turn.history).await;
        Self::settle(conversation, result)
    }

    /// Admission check plus the state changes that precede the service call.
    ///
    /// Returns `None`, leaving the conversation untouched, when `text` is blank
    /// or a turn is already in flight.
    pub fn begin(conversation: &mut Conversation, text: &str) -> Option<PendingTurn> {
        if text.trim().is_empty() || conversation.is_pending() {
            debug!(pending = conversation.is_pending(), "submission dropped");
            return None;
        }

        let history = build_transcript(conversation);
        conversation.push_user(text);
        conversation.set_pending(true);

        Some(PendingTurn {
            message: text.to_string(),
            history,
        })
    }

    /// Record the service's answer (or failure) and return to idle.
    pub fn settle(
        conversation: &mut Conversation,
        result: Result<Option<String>, ChatError>,
    ) -> TurnOutcome {
        let outcome = match result {
            Ok(Some(text)) if !text.is_empty() => {
                conversation.push_assistant(&text);
                TurnOutcome::Answered
            }
            Ok(_) => {
                warn!("chat service returned no text, using fallback reply");
                conversation.push_assistant(FALLBACK_REPLY);
                TurnOutcome::Fallback
            }
            Err(err) => {
                error!(kind = err.kind(), error = %err, "error fetching response");
                conversation.push_assistant(ERROR_REPLY);
                TurnOutcome::Failed
            }
        };
        conversation.set_pending(false);
        outcome
    }
}

/// Collaborator-facing view of every message currently in the conversation
pub fn build_transcript(conversation: &Conversation) -> Vec<TranscriptEntry> {
    conversation
        .messages()
        .iter()
        .map(TranscriptEntry::from)
        .collect()
}
