//! ShowDoc push channel configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

/// ShowDoc delivery settings.
///
/// Recipients (name to push URL) come from `SHOWDOC_RECIPIENTS` as a JSON
/// object.
#[derive(Clone, Deserialize)]
pub struct ShowDocConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Recipients pushed concurrently per batch.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Attempts per recipient, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Pushed content is cut to this many characters.
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
    #[serde(skip)]
    pub recipients: BTreeMap<String, String>,
}

const fn default_max_concurrent() -> usize {
    3
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_retry_delay_ms() -> u64 {
    1_000
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_max_message_chars() -> usize {
    1_000
}

impl ShowDocConfig {
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ShowDocConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_concurrent: default_max_concurrent(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout_secs: default_timeout_secs(),
            max_message_chars: default_max_message_chars(),
            recipients: BTreeMap::new(),
        }
    }
}

impl std::fmt::Debug for ShowDocConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShowDocConfig")
            .field("enabled", &self.enabled)
            .field("max_concurrent", &self.max_concurrent)
            .field("max_attempts", &self.max_attempts)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_message_chars", &self.max_message_chars)
            .field("recipients", &self.recipients.keys().collect::<Vec<_>>())
            .finish()
    }
}
