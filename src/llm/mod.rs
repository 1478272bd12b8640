pub mod chat;
pub mod error;
pub mod mock;
pub mod pacing;
pub mod transport;

use url::Url;

use self::error::ChatError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl LlmConfig {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// `{base_url}/models/{model}:generateContent?key={api_key}`
    ///
    /// Fails with `ChatError::Configuration` when no non-blank key is set.
    pub fn generate_url(&self) -> Result<Url, ChatError> {
        let api_key = self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ChatError::Configuration("Gemini API key is not set".to_string()))?;
        let mut url = Url::parse(
            &format!(
                "{}/models/{}:generateContent",
                self.base_url.trim_end_matches('/'),
                self.model
            )
        )?;
        url.query_pairs_mut().append_pair("key", api_key);
        Ok(url)
    }
}
