//! Retry policies for schema transports.

use crate::transport::FetchError;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;

/// Decides whether, and after how long, a failed request is repeated.
pub trait RetryPolicy: Send + Sync + Debug {
    /// Delay before retry number `attempt + 1`, or `None` to give up.
    ///
    /// `attempt` counts the retries already made, so the first failure is
    /// reported with `attempt == 0`.
    fn next_delay(&self, attempt: u32, error: &FetchError) -> Option<Duration>;
}

/// Never retries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn next_delay(&self, _attempt: u32, _error: &FetchError) -> Option<Duration> {
        None
    }
}

/// Exponential backoff over retryable errors only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExponentialBackoff {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 200,
            max_delay_ms: 5_000,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn next_delay(&self, attempt: u32, error: &FetchError) -> Option<Duration> {
        if attempt >= self.max_retries || !error.is_retryable() {
            return None;
        }
        let factor = self.multiplier.max(1.0).powi(attempt.min(i32::MAX as u32) as i32);
        let millis = (self.initial_delay_ms as f64 * factor).min(self.max_delay_ms as f64);
        Some(Duration::from_millis(millis as u64))
    }
}
