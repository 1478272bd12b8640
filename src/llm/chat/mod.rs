pub mod gemini;

use async_trait::async_trait;
use serde::{ Deserialize, Serialize };

use super::error::ChatError;
use super::transport::HttpResponse;

pub use self::gemini::GeminiChatClient;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub contents: Vec<GenerateContent>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerateContent {
    #[serde(default)]
    pub parts: Vec<GeneratePart>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct GeneratePart {
    #[serde(default)]
    pub text: String,
}

impl GenerateRequest {
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![GenerateContent {
                parts: vec![GeneratePart { text: prompt.to_string() }],
            }],
        }
    }
}

#[derive(Deserialize, Debug, Default)]
struct GenerateResponseBody {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug, Default)]
struct Candidate {
    #[serde(default)]
    content: GenerateContent,
}

#[derive(Deserialize, Debug)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize, Debug)]
struct ErrorDetail {
    message: Option<String>,
}

/// Raw outcome of a paced call. A response whose status is still 429/503
/// after the retry budget is spent comes back here as well, so the caller
/// decides how to present it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResponse {
    pub status: u16,
    pub body: String,
}

impl From<HttpResponse> for GenerationResponse {
    fn from(resp: HttpResponse) -> Self {
        Self { status: resp.status, body: resp.body }
    }
}

impl GenerationResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_throttled(&self) -> bool {
        is_throttling_status(self.status)
    }

    /// Text of the first part of the first candidate. An empty string when
    /// the body is JSON but carries no candidate; `Payload` when the body is
    /// not JSON at all.
    pub fn candidate_text(&self) -> Result<String, ChatError> {
        let parsed: GenerateResponseBody = serde_json
            ::from_str(&self.body)
            .map_err(|e| ChatError::Payload(e.to_string()))?;
        Ok(
            parsed.candidates
                .into_iter()
                .next()
                .and_then(|c| c.content.parts.into_iter().next())
                .map(|p| p.text)
                .unwrap_or_default()
        )
    }

    /// `error.message` from a JSON error body, if there is one.
    pub fn error_message(&self) -> Option<String> {
        serde_json
            ::from_str::<ErrorEnvelope>(&self.body)
            .ok()
            .and_then(|env| env.error.message)
            .filter(|m| !m.is_empty())
    }

    /// Maps a non-2xx response to the error the caller should surface.
    pub fn into_error(self) -> ChatError {
        let message = self.error_message().unwrap_or_else(|| "Unknown error".to_string());
        if self.is_throttled() {
            ChatError::Throttled { status: self.status, message }
        } else {
            ChatError::Api { status: self.status, message }
        }
    }
}

pub fn is_throttling_status(status: u16) -> bool {
    status == 429 || status == 503
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends one fully composed prompt and returns the final response.
    async fn generate(&self, prompt: &str) -> Result<GenerationResponse, ChatError>;

    fn get_model(&self) -> String;
}
