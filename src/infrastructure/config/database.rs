//! Storage configuration.

use serde::Deserialize;

/// SQLite storage settings. When disabled an in-memory store is used.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Days to keep announcements and outcomes; 0 keeps them forever.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

const fn default_enabled() -> bool {
    true
}

fn default_path() -> String {
    "bulletin.db".into()
}

const fn default_pool_size() -> u32 {
    5
}

const fn default_busy_timeout_ms() -> u64 {
    5_000
}

const fn default_retention_days() -> u32 {
    30
}

impl DatabaseConfig {
    /// Retention window, or `None` when pruning is off.
    #[must_use]
    pub fn retention(&self) -> Option<chrono::Duration> {
        (self.retention_days > 0).then(|| chrono::Duration::days(i64::from(self.retention_days)))
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            path: default_path(),
            pool_size: default_pool_size(),
            busy_timeout_ms: default_busy_timeout_ms(),
            retention_days: default_retention_days(),
        }
    }
}
