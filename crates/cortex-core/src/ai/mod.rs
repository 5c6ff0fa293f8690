pub mod error;
pub mod gemini;

pub use error::ChatError;
pub use gemini::GeminiClient;

use async_trait::async_trait;
use crate::state::TranscriptEntry;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

pub const SYSTEM_INSTRUCTION: &str = "You are Cortex, a highly efficient AI assistant developed by Kushal.
Your primary goal is to help users with daily tasks and basic coding.
When helping with code:
- Provide clean, well-commented code snippets.
- Explain the logic briefly.
- Focus on modern, best-practice implementations.
- Be concise but thorough.

When helping with daily tasks:
- Be polite and professional.
- Provide actionable advice.
- Use formatting (bullet points, bold text) to make information scannable.

Always identify yourself as Cortex and mention you were developed by Kushal if asked about your origin.";

/// A hosted chat completion backend.
///
/// `history` is everything said before `message`, oldest first. The system
/// instruction and model are fixed by the implementation. `Ok(None)` means
/// the service answered but produced no text.
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn send_turn(
        &self,
        message: &str,
        history: &[TranscriptEntry],
    ) -> Result<Option<String>, ChatError>;
}
