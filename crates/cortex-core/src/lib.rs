pub mod ai;
pub mod config;
pub mod conversation;
pub mod executor;
pub mod state;

// Re-export main types for convenience
pub use ai::{ChatError, ChatService, GeminiClient};
pub use config::Config;
pub use conversation::Conversation;
pub use executor::{PendingTurn, TurnExecutor, TurnOutcome, TurnState};
pub use state::{ChatMessage, ChatRole, MessageId, TranscriptEntry, TranscriptRole};
