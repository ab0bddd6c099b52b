//! Retry backoff policies
//!
//! When a connect attempt fails or an open connection drops, the session
//! consults its policy for how long to wait before the next attempt:
//! - `Some(duration)`: sleep, then try again
//! - `None`: give up (the session surfaces exhaustion and goes quiet)
//!
//! # Built-in policies
//!
//! - **ExponentialBackoff**: `base * 2^attempt` capped at a maximum, with
//!   uniform jitter in `[0, base)` (recommended, the default)
//! - **FixedDelay**: constant delay between attempts
//! - **NoRetry**: fail on first disconnect
//!
//! Implement `BackoffPolicy` for custom behavior.
//!
//! # Examples
//!
//! ```rust
//! use wsession_client::ExponentialBackoff;
//! use std::time::Duration;
//!
//! // Default: 500ms to 30s, unlimited attempts, jittered
//! let default = ExponentialBackoff::default();
//!
//! // Custom: 100ms to 1s, at most 5 attempts
//! let custom = ExponentialBackoff::new(
//!     Duration::from_millis(100),
//!     Duration::from_secs(1),
//! )
//! .with_max_attempts(5);
//! ```

use std::time::Duration;

/// Trait for retry backoff policies
///
/// The policy is consulted once per failed attempt with a 0-indexed attempt
/// counter. `reset()` is called when a connection reaches Open so the next
/// disconnect starts from a clean slate.
pub trait BackoffPolicy: Send + Sync {
    /// Returns the delay before the next attempt, or `None` to give up
    fn next_delay(&mut self, attempt: u32) -> Option<Duration>;

    /// Reset accumulated state after a successful connection
    fn reset(&mut self);
}

/// Exponential backoff with uniform jitter
pub struct ExponentialBackoff {
    base_delay: Duration,
    max_delay: Duration,
    max_attempts: Option<u32>,
    jitter: bool,
}

impl ExponentialBackoff {
    /// Create a jittered exponential backoff between `base_delay` and `max_delay`
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay,
            max_attempts: None,
            jitter: true,
        }
    }

    /// Set the maximum number of attempts before giving up
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Disable jitter (deterministic delays, mainly for tests)
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_secs(30))
    }
}

impl BackoffPolicy for ExponentialBackoff {
    fn next_delay(&mut self, attempt: u32) -> Option<Duration> {
        if let Some(max) = self.max_attempts {
            if attempt >= max {
                return None;
            }
        }

        // base * 2^attempt, saturating, capped at max_delay
        let base_ms = self.base_delay.as_millis() as u64;
        let exp = base_ms.saturating_mul(2u64.saturating_pow(attempt));
        let capped = std::cmp::min(exp, self.max_delay.as_millis() as u64);

        // Uniform jitter in [0, base)
        let jitter_ms = if self.jitter && base_ms > 0 {
            use rand::Rng;
            rand::thread_rng().gen_range(0..base_ms)
        } else {
            0
        };

        Some(Duration::from_millis(capped + jitter_ms))
    }

    fn reset(&mut self) {
        // Attempt counting lives in the state tracker; nothing to reset here
    }
}

/// Fixed delay between attempts
pub struct FixedDelay {
    delay: Duration,
    max_attempts: Option<u32>,
}

impl FixedDelay {
    /// Create a new fixed delay policy
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    /// Set the maximum number of attempts before giving up
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

impl BackoffPolicy for FixedDelay {
    fn next_delay(&mut self, attempt: u32) -> Option<Duration> {
        if let Some(max) = self.max_attempts {
            if attempt >= max {
                return None;
            }
        }
        Some(self.delay)
    }

    fn reset(&mut self) {}
}

/// Policy that never retries
pub struct NoRetry;

impl BackoffPolicy for NoRetry {
    fn next_delay(&mut self, _attempt: u32) -> Option<Duration> {
        None
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff_doubles() {
        let mut policy = ExponentialBackoff::new(
            Duration::from_millis(100),
            Duration::from_secs(10),
        )
        .without_jitter();

        assert_eq!(policy.next_delay(0).unwrap(), Duration::from_millis(100));
        assert_eq!(policy.next_delay(1).unwrap(), Duration::from_millis(200));
        assert_eq!(policy.next_delay(2).unwrap(), Duration::from_millis(400));
    }

    #[test]
    fn test_exponential_backoff_caps_at_max() {
        let mut policy = ExponentialBackoff::new(
            Duration::from_millis(100),
            Duration::from_secs(1),
        )
        .without_jitter();

        assert_eq!(policy.next_delay(10).unwrap(), Duration::from_millis(1000));
        // Large attempt numbers must not overflow
        assert_eq!(policy.next_delay(63).unwrap(), Duration::from_millis(1000));
    }

    #[test]
    fn test_exponential_backoff_monotone_until_cap() {
        let mut policy = ExponentialBackoff::new(
            Duration::from_millis(100),
            Duration::from_secs(1),
        )
        .without_jitter();

        let mut prev = Duration::ZERO;
        for attempt in 0..8 {
            let delay = policy.next_delay(attempt).unwrap();
            assert!(delay >= prev, "delay decreased at attempt {}", attempt);
            prev = delay;
        }
    }

    #[test]
    fn test_exponential_backoff_max_attempts() {
        let mut policy = ExponentialBackoff::new(
            Duration::from_millis(100),
            Duration::from_secs(10),
        )
        .with_max_attempts(3);

        assert!(policy.next_delay(0).is_some());
        assert!(policy.next_delay(1).is_some());
        assert!(policy.next_delay(2).is_some());
        assert!(policy.next_delay(3).is_none());
    }

    #[test]
    fn test_exponential_backoff_jitter_bounds() {
        let mut policy = ExponentialBackoff::new(
            Duration::from_millis(100),
            Duration::from_secs(10),
        );

        // Jitter is uniform in [0, base), so attempt 0 lands in [100, 200)
        for _ in 0..50 {
            let delay = policy.next_delay(0).unwrap();
            assert!(delay >= Duration::from_millis(100));
            assert!(delay < Duration::from_millis(200));
        }
    }

    #[test]
    fn test_fixed_delay() {
        let mut policy = FixedDelay::new(Duration::from_secs(1)).with_max_attempts(2);

        assert_eq!(policy.next_delay(0).unwrap(), Duration::from_secs(1));
        assert_eq!(policy.next_delay(1).unwrap(), Duration::from_secs(1));
        assert!(policy.next_delay(2).is_none());
    }

    #[test]
    fn test_no_retry() {
        let mut policy = NoRetry;
        assert!(policy.next_delay(0).is_none());
    }
}
