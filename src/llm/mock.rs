//! Deterministic stand-ins for the clock and the HTTP transport.
//!
//! `ManualClock` never really sleeps: a sleep moves virtual time forward and
//! is recorded, so pacing and backoff can be asserted exactly.
//! `ScriptedTransport` replays queued outcomes in order and records every
//! request it receives.
//!
//! ```ignore
//! let clock = Arc::new(ManualClock::new());
//! let transport = Arc::new(ScriptedTransport::new(vec![Ok(HttpResponse {
//!     status: 429,
//!     body: String::new(),
//! })]).with_clock(clock.clone()));
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{ Arc, Mutex };
use std::time::{ Duration, Instant };
use url::Url;

use super::chat::GenerateRequest;
use super::error::ChatError;
use super::pacing::Clock;
use super::transport::{ HttpResponse, HttpTransport };

#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }

    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every duration passed to `sleep`, in call order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(duration);
        self.advance(duration);
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: Url,
    pub payload: GenerateRequest,
    /// Virtual instant of dispatch, when the transport has a clock.
    pub at: Option<Instant>,
}

pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<HttpResponse, ChatError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    clock: Option<Arc<ManualClock>>,
    latency: Duration,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<HttpResponse, ChatError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            clock: None,
            latency: Duration::ZERO,
        }
    }

    pub fn with_clock(mut self, clock: Arc<ManualClock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Virtual time each exchange takes. Only meaningful with a clock.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn push(&self, outcome: Result<HttpResponse, ChatError>) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(outcome);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn dispatch_times(&self) -> Vec<Instant> {
        self.requests()
            .into_iter()
            .filter_map(|r| r.at)
            .collect()
    }

    pub fn remaining(&self) -> usize {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn post_json(
        &self,
        url: &Url,
        payload: &GenerateRequest
    ) -> Result<HttpResponse, ChatError> {
        let at = self.clock.as_ref().map(|c| c.now());
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedRequest { url: url.clone(), payload: payload.clone(), at });

        if let Some(clock) = &self.clock {
            clock.advance(self.latency);
        }

        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| Err(ChatError::Transport("scripted transport exhausted".to_string())))
    }
}
