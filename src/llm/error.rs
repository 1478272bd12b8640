use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// Missing credential or unusable endpoint. Never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 429/503 that survived every retry.
    #[error("Request throttled by the generation service ({status}): {message}")]
    Throttled { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("API Error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Unreadable response payload: {0}")]
    Payload(String),

    #[error("Message '{0}' not found")]
    MessageNotFound(String),

    #[error("Message '{0}' has not failed and cannot be retried")]
    NotRetryable(String),
}

impl ChatError {
    pub fn is_throttled(&self) -> bool {
        matches!(self, ChatError::Throttled { .. })
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Transport(err.to_string())
    }
}

impl From<url::ParseError> for ChatError {
    fn from(err: url::ParseError) -> Self {
        ChatError::Configuration(format!("Invalid generation endpoint: {}", err))
    }
}
