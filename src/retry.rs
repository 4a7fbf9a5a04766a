//! Upstream retry policy
//!
//! The image source is fetched exactly once per request unless a policy with
//! `max_attempts > 1` is configured. When enabled, only 5xx responses from the
//! serving endpoint are retried, with exponential backoff between attempts:
//! - Attempt 1: No delay (immediate)
//! - Attempt 2: `initial_backoff_ms`
//! - Attempt 3: 2x that, and so on
//! - Capped at `max_backoff_ms`
//!
//! 404 and other 4xx responses are final: the blob is gone or the request is
//! malformed, and asking again gives the same answer.
//!
//! ## Configuration Example
//!
//! ```yaml
//! image_source:
//!   type: serving_url
//!   base_url: https://images.example.com
//!   retry:
//!     max_attempts: 3
//!     initial_backoff_ms: 100
//!     max_backoff_ms: 1000
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Cap for exponential growth in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    1
}

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    1000
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms,
            max_backoff_ms,
        }
    }

    /// Single attempt, no retries
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_retriable_status(&self, status_code: u16) -> bool {
        matches!(status_code, 500 | 502 | 503 | 504)
    }

    /// Delay before attempt number `attempt` (0-indexed; attempt 0 never waits)
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(0);
        }

        let backoff_ms = self
            .initial_backoff_ms
            .saturating_mul(2u64.saturating_pow(attempt - 1))
            .min(self.max_backoff_ms);

        Duration::from_millis(backoff_ms)
    }

    /// Whether attempt `attempt` (0-indexed) that ended with `status_code`
    /// should be followed by another attempt
    pub fn should_retry(&self, attempt: u32, status_code: u16) -> bool {
        if attempt >= self.max_attempts.saturating_sub(1) {
            return false;
        }
        self.is_retriable_status(status_code)
    }
}
