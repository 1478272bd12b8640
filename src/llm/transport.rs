use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use super::chat::GenerateRequest;
use super::error::ChatError;

/// Status and body of a finished HTTP exchange. Non-2xx statuses are data,
/// not errors; only a failure to complete the exchange is an `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_json(
        &self,
        url: &Url,
        payload: &GenerateRequest
    ) -> Result<HttpResponse, ChatError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self, ChatError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ChatError::Transport(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(
        &self,
        url: &Url,
        payload: &GenerateRequest
    ) -> Result<HttpResponse, ChatError> {
        let resp = self.client
            .post(url.clone())
            .header("Content-Type", "application/json")
            .json(payload)
            .send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(HttpResponse { status, body })
    }
}
