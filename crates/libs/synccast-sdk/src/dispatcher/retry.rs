use std::time::Duration;

/// Statuses worth another attempt; everything else non-2xx is terminal.
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

const MAX_BACKOFF_MS: u64 = 120_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    retries: u32,
    backoff_factor: f64,
    max_delay_ms: u64,
}

impl RetryPolicy {
    /// `max_delay` is clamped to 120 s.
    pub fn new(retries: u32, backoff_factor: f64, max_delay: Duration) -> Self {
        let max_delay_ms = u64::try_from(max_delay.as_millis()).unwrap_or(u64::MAX);
        Self {
            retries,
            backoff_factor: if backoff_factor.is_finite() { backoff_factor.max(0.0) } else { 0.0 },
            max_delay_ms: max_delay_ms.min(MAX_BACKOFF_MS),
        }
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn max_delay_ms(&self) -> u64 {
        self.max_delay_ms
    }

    pub fn allows_retry(&self, attempt: u32) -> bool {
        attempt < self.retries
    }

    pub fn retries_status(&self, status: u16) -> bool {
        RETRYABLE_STATUSES.contains(&status)
    }

    /// Delay before retrying after failed attempt `attempt` (0-based):
    /// `backoff_factor * 2^attempt` seconds, raised to the server hint, then capped.
    pub fn delay_for_attempt(&self, attempt: u32, retry_after_hint_ms: Option<u64>) -> Duration {
        let shift = attempt.min(20);
        let multiplier = f64::from(1_u32 << shift);
        let calculated = (self.backoff_factor * 1_000.0 * multiplier).round();
        let calculated = if calculated >= self.max_delay_ms as f64 {
            self.max_delay_ms
        } else {
            calculated as u64
        };
        let hinted = retry_after_hint_ms.unwrap_or(0);
        Duration::from_millis(calculated.max(hinted).min(self.max_delay_ms))
    }

    /// Like [`delay_for_attempt`](Self::delay_for_attempt), but never shorter than
    /// `previous`, so an earlier `Retry-After` keeps holding on later attempts.
    pub fn next_delay(
        &self,
        attempt: u32,
        retry_after_hint_ms: Option<u64>,
        previous: Duration,
    ) -> Duration {
        let cap = Duration::from_millis(self.max_delay_ms);
        self.delay_for_attempt(attempt, retry_after_hint_ms).max(previous).min(cap)
    }
}
