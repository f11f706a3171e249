//! Administration HTTP surface configuration.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

const fn default_enabled() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".into()
}

const fn default_port() -> u16 {
    3000
}

impl AdminConfig {
    /// `host:port` suitable for binding a listener.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            host: default_host(),
            port: default_port(),
        }
    }
}
