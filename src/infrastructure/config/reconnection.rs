//! Reconnection policy configuration.

use serde::Deserialize;

/// Bounded exponential backoff for feed reconnection.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconnectionConfig {
    /// Base delay; attempt `k` waits `base * 2^k` (milliseconds).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Upper bound on any single delay (milliseconds).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Consecutive attempts before the connection is given up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Terminate the process once the attempt budget is spent.
    #[serde(default = "default_exit_on_exhausted")]
    pub exit_on_exhausted: bool,
}

const fn default_base_delay_ms() -> u64 {
    5_000
}

const fn default_max_delay_ms() -> u64 {
    300_000
}

const fn default_max_attempts() -> u32 {
    10
}

const fn default_exit_on_exhausted() -> bool {
    true
}

impl Default for ReconnectionConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_attempts: default_max_attempts(),
            exit_on_exhausted: default_exit_on_exhausted(),
        }
    }
}
