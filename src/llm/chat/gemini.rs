use async_trait::async_trait;
use log::{ debug, info, warn };
use std::sync::Arc;

use super::{ ChatClient, GenerateRequest, GenerationResponse };
use crate::llm::error::ChatError;
use crate::llm::pacing::{ PacingGate, RetryPolicy };
use crate::llm::transport::HttpTransport;
use crate::llm::LlmConfig;

/// `generateContent` client that paces every dispatch through a shared
/// [`PacingGate`] and retries throttled responses with exponential backoff.
pub struct GeminiChatClient {
    config: LlmConfig,
    transport: Arc<dyn HttpTransport>,
    gate: Arc<PacingGate>,
    policy: RetryPolicy,
}

impl GeminiChatClient {
    pub fn new(
        config: LlmConfig,
        transport: Arc<dyn HttpTransport>,
        gate: Arc<PacingGate>,
        policy: RetryPolicy
    ) -> Self {
        info!(
            "GeminiChatClient configured → model={} base_url={} interval={}ms max_retries={}",
            config.model,
            config.base_url,
            gate.interval().as_millis(),
            policy.max_retries
        );
        Self { config, transport, gate, policy }
    }

    pub fn gate(&self) -> &Arc<PacingGate> {
        &self.gate
    }
}

#[async_trait]
impl ChatClient for GeminiChatClient {
    async fn generate(&self, prompt: &str) -> Result<GenerationResponse, ChatError> {
        let url = self.config.generate_url()?;
        let payload = GenerateRequest::from_prompt(prompt);

        let mut attempt: u32 = 0;
        let mut backoff = self.policy.initial_backoff;
        loop {
            let permit = self.gate.acquire().await;
            permit.wait_turn().await;

            let response: GenerationResponse = self.transport
                .post_json(&url, &payload).await?
                .into();

            if response.is_throttled() {
                drop(permit);
                attempt += 1;
                if attempt > self.policy.max_retries {
                    warn!(
                        "Generation still throttled ({}) after {} retries, giving up",
                        response.status,
                        self.policy.max_retries
                    );
                    return Ok(response);
                }
                warn!(
                    "Generation throttled ({}), retry {}/{} in {} ms",
                    response.status,
                    attempt,
                    self.policy.max_retries,
                    backoff.as_millis()
                );
                self.gate.clock().sleep(backoff).await;
                backoff = self.policy.next_backoff(backoff);
                continue;
            }

            permit.stamp();
            debug!("Generation finished with status {}", response.status);
            return Ok(response);
        }
    }

    fn get_model(&self) -> String {
        self.config.model.clone()
    }
}
