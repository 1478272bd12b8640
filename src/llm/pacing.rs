//! Pacing and retry timing for calls to the generation service.
//!
//! Every outbound request goes through one [`PacingGate`]. The gate remembers
//! when the last non-throttled call completed and makes the next caller wait
//! until `interval` has passed. The gate's timestamp lives behind an async
//! mutex and the [`PacingPermit`] is held from the spacing check until the
//! outcome is known, so concurrent callers queue instead of racing.

use async_trait::async_trait;
use log::debug;
use std::sync::Arc;
use std::time::{ Duration, Instant };
use tokio::sync::{ Mutex, MutexGuard };

pub const REQUEST_INTERVAL_MS: u64 = 5000;
pub const MAX_RETRIES: u32 = 3;
pub const INITIAL_BACKOFF_MS: u64 = 1500;
pub const MAX_BACKOFF_MS: u64 = 10_000;

#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(MAX_BACKOFF_MS),
        }
    }
}

impl RetryPolicy {
    pub fn next_backoff(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max_backoff)
    }
}

pub struct PacingGate {
    clock: Arc<dyn Clock>,
    interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl PacingGate {
    pub fn new(clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            clock,
            interval,
            last_call: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Waits for exclusive use of the gate. The permit must be held across
    /// the dispatch it paces.
    pub async fn acquire(&self) -> PacingPermit<'_> {
        PacingPermit {
            gate: self,
            last_call: self.last_call.lock().await,
        }
    }

    pub async fn last_call(&self) -> Option<Instant> {
        *self.last_call.lock().await
    }
}

pub struct PacingPermit<'a> {
    gate: &'a PacingGate,
    last_call: MutexGuard<'a, Option<Instant>>,
}

impl PacingPermit<'_> {
    /// Sleeps out whatever is left of the interval since the last stamp and
    /// returns how long it waited.
    pub async fn wait_turn(&self) -> Duration {
        let Some(last) = *self.last_call else {
            return Duration::ZERO;
        };
        let elapsed = self.gate.clock.now().saturating_duration_since(last);
        if elapsed >= self.gate.interval {
            return Duration::ZERO;
        }
        let remaining = self.gate.interval - elapsed;
        debug!("Pacing gate: waiting {} ms before dispatch", remaining.as_millis());
        self.gate.clock.sleep(remaining).await;
        remaining
    }

    /// Records the current instant as the last completed call.
    pub fn stamp(mut self) {
        *self.last_call = Some(self.gate.clock.now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::ManualClock;

    fn gate(clock: &Arc<ManualClock>) -> PacingGate {
        PacingGate::new(clock.clone(), Duration::from_millis(REQUEST_INTERVAL_MS))
    }

    #[tokio::test]
    async fn first_call_does_not_wait() {
        let clock = Arc::new(ManualClock::new());
        let gate = gate(&clock);
        let permit = gate.acquire().await;
        assert_eq!(permit.wait_turn().await, Duration::ZERO);
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn waits_out_remaining_interval_after_stamp() {
        let clock = Arc::new(ManualClock::new());
        let gate = gate(&clock);
        gate.acquire().await.stamp();

        clock.advance(Duration::from_millis(1200));
        let waited = gate.acquire().await.wait_turn().await;
        assert_eq!(waited, Duration::from_millis(3800));
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(3800)]);
    }

    #[tokio::test]
    async fn no_wait_once_interval_has_passed() {
        let clock = Arc::new(ManualClock::new());
        let gate = gate(&clock);
        gate.acquire().await.stamp();

        clock.advance(Duration::from_millis(7000));
        assert_eq!(gate.acquire().await.wait_turn().await, Duration::ZERO);
    }

    #[tokio::test]
    async fn unstamped_permit_leaves_timestamp_untouched() {
        let clock = Arc::new(ManualClock::new());
        let gate = gate(&clock);
        {
            let permit = gate.acquire().await;
            permit.wait_turn().await;
        }
        assert!(gate.last_call().await.is_none());
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        let mut backoff = policy.initial_backoff;
        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push(backoff.as_millis());
            backoff = policy.next_backoff(backoff);
        }
        assert_eq!(seen, vec![1500, 3000, 6000, 10_000, 10_000]);
    }
}
