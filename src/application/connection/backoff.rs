//! Bounded exponential backoff for feed reconnection.

use std::time::Duration;

use crate::infrastructure::config::reconnection::ReconnectionConfig;

/// Reconnect schedule: attempt `k` waits `min(base * 2^k, cap)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    base: Duration,
    cap: Duration,
    max_attempts: u32,
}

impl ReconnectPolicy {
    #[must_use]
    pub const fn new(base: Duration, cap: Duration, max_attempts: u32) -> Self {
        Self {
            base,
            cap,
            max_attempts,
        }
    }

    #[must_use]
    pub const fn from_config(config: &ReconnectionConfig) -> Self {
        Self::new(
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            config.max_attempts,
        )
    }

    /// Delay before reconnect attempt `attempt` (zero-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.cap)
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// True once `attempts` consecutive reconnects have been scheduled.
    #[must_use]
    pub const fn is_exhausted(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from_config(&ReconnectionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_doubles_then_caps() {
        let policy = ReconnectPolicy::default();
        let delays: Vec<u64> = (0..10).map(|k| policy.delay(k).as_secs()).collect();
        assert_eq!(delays, vec![5, 10, 20, 40, 80, 160, 300, 300, 300, 300]);
    }

    #[test]
    fn delay_is_monotonic_and_bounded() {
        let policy = ReconnectPolicy::new(Duration::from_millis(250), Duration::from_secs(7), 64);
        let mut previous = Duration::ZERO;
        for k in 0..64 {
            let delay = policy.delay(k);
            assert!(delay >= previous);
            assert!(delay <= Duration::from_secs(7));
            previous = delay;
        }
    }

    #[test]
    fn huge_attempt_does_not_overflow() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay(u32::MAX), Duration::from_secs(300));
    }

    #[test]
    fn exhaustion_at_max_attempts() {
        let policy = ReconnectPolicy::new(Duration::from_secs(1), Duration::from_secs(2), 3);
        assert!(!policy.is_exhausted(2));
        assert!(policy.is_exhausted(3));
    }
}
