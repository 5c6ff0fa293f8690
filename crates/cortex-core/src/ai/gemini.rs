use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChatError, ChatService};
use crate::state::{TranscriptEntry, TranscriptRole};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<TranscriptRole>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorBody,
}

#[derive(Deserialize)]
struct GeminiErrorBody {
    message: String,
}

impl GeminiContent {
    fn text(role: TranscriptRole, text: &str) -> Self {
        Self {
            role: Some(role),
            parts: vec![GeminiPart { text: Some(text.to_string()) }],
        }
    }
}

/// Client for the Gemini `generateContent` endpoint.
///
/// The API key is optional so the client can be built before a credential
/// exists; calls made without one fail with [`ChatError::Auth`].
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    system_instruction: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, model: &str, system_instruction: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            system_instruction: system_instruction.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_request(&self, message: &str, history: &[TranscriptEntry]) -> GenerateRequest {
        let mut contents: Vec<GeminiContent> = history
            .iter()
            .map(|entry| GeminiContent::text(entry.role, &entry.text))
            .collect();
        contents.push(GeminiContent::text(TranscriptRole::User, message));

        GenerateRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: Some(self.system_instruction.clone()) }],
            },
            contents,
        }
    }
}

#[async_trait]
impl ChatService for GeminiClient {
    async fn send_turn(
        &self,
        message: &str,
        history: &[TranscriptEntry],
    ) -> Result<Option<String>, ChatError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ChatError::Auth("GEMINI_API_KEY is not set".to_string()))?;

        let request = self.build_request(message, history);
        debug!(model = %self.model, history = history.len(), "sending generateContent request");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<GeminiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(match status.as_u16() {
                401 | 403 => ChatError::Auth(message),
                code => ChatError::Service { status: code, message },
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| ChatError::Malformed(e.to_string()))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect()
            })
            .unwrap_or_default();

        Ok(if text.is_empty() { None } else { Some(text) })
    }
}
