//! Feed connection configuration.

use std::time::Duration;

use serde::Deserialize;

/// Signed websocket feed settings.
///
/// `api_key` and `api_secret` are never read from the file; they are filled
/// from `BINANCE_API_KEY` / `BINANCE_API_SECRET`.
#[derive(Clone, Deserialize)]
pub struct FeedConfig {
    /// Websocket endpoint without query string.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// Subscription topic.
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Receive window sent with every signed request (milliseconds).
    #[serde(default = "default_recv_window_ms")]
    pub recv_window_ms: u64,
    /// Bound on transport open plus subscribe acknowledgment (seconds).
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Interval between liveness probes while open (seconds).
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,
    /// Maximum silence after the last probe acknowledgment (seconds).
    #[serde(default = "default_liveness_timeout_secs")]
    pub liveness_timeout_secs: u64,
    /// Forced re-establishment after this long open (seconds).
    #[serde(default = "default_lifetime_secs")]
    pub lifetime_secs: u64,
    /// Delay before reopening after a manual reconnect or lifetime cycle.
    #[serde(default = "default_manual_reconnect_delay_ms")]
    pub manual_reconnect_delay_ms: u64,
    #[serde(skip)]
    pub api_key: String,
    #[serde(skip)]
    pub api_secret: String,
}

fn default_ws_url() -> String {
    "wss://api.binance.com/sapi/wss".into()
}

fn default_topic() -> String {
    "com_announcement_en".into()
}

const fn default_recv_window_ms() -> u64 {
    30_000
}

const fn default_connect_timeout_secs() -> u64 {
    15
}

const fn default_probe_interval_secs() -> u64 {
    30
}

const fn default_liveness_timeout_secs() -> u64 {
    90
}

const fn default_lifetime_secs() -> u64 {
    24 * 60 * 60 - 60
}

const fn default_manual_reconnect_delay_ms() -> u64 {
    1_000
}

impl FeedConfig {
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub const fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }

    #[must_use]
    pub const fn liveness_timeout(&self) -> Duration {
        Duration::from_secs(self.liveness_timeout_secs)
    }

    #[must_use]
    pub const fn lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime_secs)
    }

    #[must_use]
    pub const fn manual_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.manual_reconnect_delay_ms)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            topic: default_topic(),
            recv_window_ms: default_recv_window_ms(),
            connect_timeout_secs: default_connect_timeout_secs(),
            probe_interval_secs: default_probe_interval_secs(),
            liveness_timeout_secs: default_liveness_timeout_secs(),
            lifetime_secs: default_lifetime_secs(),
            manual_reconnect_delay_ms: default_manual_reconnect_delay_ms(),
            api_key: String::new(),
            api_secret: String::new(),
        }
    }
}

impl std::fmt::Debug for FeedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedConfig")
            .field("ws_url", &self.ws_url)
            .field("topic", &self.topic)
            .field("recv_window_ms", &self.recv_window_ms)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("probe_interval_secs", &self.probe_interval_secs)
            .field("liveness_timeout_secs", &self.liveness_timeout_secs)
            .field("lifetime_secs", &self.lifetime_secs)
            .field("manual_reconnect_delay_ms", &self.manual_reconnect_delay_ms)
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .finish()
    }
}
