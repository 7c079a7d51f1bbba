//! Retry policy - Exponential backoff for idempotent tools.

use std::time::Duration;

/// Backoff schedule for retrying idempotent tools.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Ceiling for the doubled delays.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Returns the delay before the given retry, doubling from the initial
    /// delay and capped at the ceiling. `attempt` is the attempt that just
    /// failed, starting at 1.
    pub fn delay_before_retry(&self, attempt: u32) -> Duration {
        let doublings = attempt.saturating_sub(1).min(32);
        let delay = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(doublings));
        delay.min(self.max_delay)
    }

    /// True if another attempt is allowed after `attempt` attempts.
    pub fn allows_another(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_double_from_the_initial_delay() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
        };
        assert_eq!(policy.delay_before_retry(1), Duration::from_millis(100));
        assert_eq!(policy.delay_before_retry(2), Duration::from_millis(200));
        assert_eq!(policy.delay_before_retry(3), Duration::from_millis(400));
    }

    #[test]
    fn delays_are_capped_at_the_ceiling() {
        let policy = RetryPolicy {
            max_attempts: 20,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        };
        assert_eq!(policy.delay_before_retry(10), Duration::from_secs(30));
    }

    #[test]
    fn allows_another_respects_max_attempts() {
        let policy = RetryPolicy {
            max_attempts: 2,
            ..RetryPolicy::default()
        };
        assert!(policy.allows_another(1));
        assert!(!policy.allows_another(2));
    }

    #[test]
    fn none_never_allows_a_retry() {
        assert!(!RetryPolicy::none().allows_another(1));
    }
}
