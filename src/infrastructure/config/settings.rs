//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file; credentials are always taken
//! from the environment (after `.env` has been loaded by the binary).
//!
//! # Example
//!
//! ```no_run
//! use bulletin::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use reqwest::header::{HeaderName, HeaderValue};
use serde::Deserialize;

use super::admin::AdminConfig;
use super::database::DatabaseConfig;
use super::feed::FeedConfig;
use super::filter::FilterConfig;
use super::logging::LoggingConfig;
use super::reconnection::ReconnectionConfig;
use super::showdoc::ShowDocConfig;
use super::telegram::TelegramAppConfig;
use super::translation::{TranslationConfig, TranslationProvider};
use crate::error::{ConfigError, Result};

/// Main application configuration.
///
/// Built once at startup and handed to every constructor. Load from a TOML
/// file using [`Config::load`] or parse directly with [`Config::parse_toml`].
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Signed feed endpoint, topic and connection timings.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Backoff and attempt budget for reconnection.
    #[serde(default)]
    pub reconnection: ReconnectionConfig,

    /// Record inclusion and exclusion rules.
    #[serde(default)]
    pub filters: FilterConfig,

    #[serde(default)]
    pub telegram: TelegramAppConfig,

    #[serde(default)]
    pub showdoc: ShowDocConfig,

    /// Optional translation step applied before fan-out.
    #[serde(default)]
    pub translation: TranslationConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    /// Administration HTTP surface.
    #[serde(default)]
    pub admin: AdminConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse configuration from TOML content, reading credentials from the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed, an environment value is
    /// malformed, or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        Self::parse_toml_with(content, |key| std::env::var(key).ok())
    }

    /// Parse configuration from TOML content with an explicit credential
    /// source.
    ///
    /// # Errors
    ///
    /// Same as [`Config::parse_toml`].
    #[allow(clippy::result_large_err)]
    pub fn parse_toml_with<F>(content: &str, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.apply_env(&env)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML content is
    /// malformed, or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Initialize logging using this configuration.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    /// Names of the channels that will receive records.
    #[must_use]
    pub fn enabled_channels(&self) -> Vec<&'static str> {
        let mut channels = Vec::new();
        if self.telegram.enabled {
            channels.push("telegram");
        }
        if self.showdoc.enabled {
            channels.push("showdoc");
        }
        channels
    }

    #[allow(clippy::result_large_err)]
    fn apply_env<F>(&mut self, env: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        self.feed.api_key = non_empty("BINANCE_API_KEY").unwrap_or_default();
        self.feed.api_secret = non_empty("BINANCE_API_SECRET").unwrap_or_default();

        self.telegram.bot_token = non_empty("TELEGRAM_BOT_TOKEN");
        self.telegram.chat_id = match non_empty("TELEGRAM_CHAT_ID") {
            Some(raw) => Some(raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: "TELEGRAM_CHAT_ID",
                reason: "must be an integer chat id".to_string(),
            })?),
            None => None,
        };

        if let Some(raw) = non_empty("SHOWDOC_RECIPIENTS") {
            self.showdoc.recipients = serde_json::from_str::<BTreeMap<String, String>>(&raw)
                .map_err(|e| ConfigError::InvalidValue {
                    field: "SHOWDOC_RECIPIENTS",
                    reason: format!("expected a JSON object of name to URL: {e}"),
                })?;
        }

        self.translation.api_key = non_empty("TRANSLATION_API_KEY").or_else(|| {
            if self.translation.provider == TranslationProvider::Anthropic {
                non_empty("ANTHROPIC_API_KEY")
            } else {
                None
            }
        });

        Ok(())
    }

    /// Validate configuration values.
    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        let feed = &self.feed;
        if feed.ws_url.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "ws_url" }.into());
        }
        url::Url::parse(&feed.ws_url).map_err(|e| ConfigError::InvalidValue {
            field: "ws_url",
            reason: e.to_string(),
        })?;
        if feed.topic.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "topic" }.into());
        }
        if feed.api_key.is_empty() {
            return Err(ConfigError::MissingField {
                field: "BINANCE_API_KEY",
            }
            .into());
        }
        if feed.api_secret.is_empty() {
            return Err(ConfigError::MissingField {
                field: "BINANCE_API_SECRET",
            }
            .into());
        }
        for (field, value) in [
            ("recv_window_ms", feed.recv_window_ms),
            ("connect_timeout_secs", feed.connect_timeout_secs),
            ("probe_interval_secs", feed.probe_interval_secs),
            ("liveness_timeout_secs", feed.liveness_timeout_secs),
            ("lifetime_secs", feed.lifetime_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be greater than 0".to_string(),
                }
                .into());
            }
        }
        if feed.liveness_timeout_secs <= feed.probe_interval_secs {
            return Err(ConfigError::InvalidValue {
                field: "liveness_timeout_secs",
                reason: "must be greater than probe_interval_secs".to_string(),
            }
            .into());
        }

        let reconnection = &self.reconnection;
        if reconnection.base_delay_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "base_delay_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if reconnection.max_delay_ms < reconnection.base_delay_ms {
            return Err(ConfigError::InvalidValue {
                field: "max_delay_ms",
                reason: "must be >= base_delay_ms".to_string(),
            }
            .into());
        }
        if reconnection.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_attempts",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.telegram.enabled {
            if self.telegram.bot_token.is_none() {
                return Err(ConfigError::MissingField {
                    field: "TELEGRAM_BOT_TOKEN",
                }
                .into());
            }
            if self.telegram.chat_id.is_none() {
                return Err(ConfigError::MissingField {
                    field: "TELEGRAM_CHAT_ID",
                }
                .into());
            }
            if self.telegram.max_attempts == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "telegram.max_attempts",
                    reason: "must be greater than 0".to_string(),
                }
                .into());
            }
        }

        if self.showdoc.enabled {
            if self.showdoc.recipients.is_empty() {
                return Err(ConfigError::MissingField {
                    field: "SHOWDOC_RECIPIENTS",
                }
                .into());
            }
            if self.showdoc.max_concurrent == 0 || self.showdoc.max_attempts == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "showdoc",
                    reason: "max_concurrent and max_attempts must be greater than 0".to_string(),
                }
                .into());
            }
            if self.showdoc.timeout_secs == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "showdoc.timeout_secs",
                    reason: "must be greater than 0".to_string(),
                }
                .into());
            }
        }

        if self.translation.enabled {
            if self.translation.api_key.is_none() {
                return Err(ConfigError::MissingField {
                    field: "TRANSLATION_API_KEY",
                }
                .into());
            }
            if self.translation.provider.requires_base_url()
                && self.translation.base_url.as_deref().map_or(true, str::is_empty)
            {
                return Err(ConfigError::InvalidValue {
                    field: "translation.base_url",
                    reason: format!(
                        "required for provider {}",
                        self.translation.provider.as_str()
                    ),
                }
                .into());
            }
            if self.translation.timeout_ms == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "translation.timeout_ms",
                    reason: "must be greater than 0".to_string(),
                }
                .into());
            }
            for (name, value) in &self.translation.headers {
                if HeaderName::from_bytes(name.as_bytes()).is_err()
                    || HeaderValue::from_str(value).is_err()
                {
                    return Err(ConfigError::InvalidValue {
                        field: "translation.headers",
                        reason: format!("invalid header {name:?}"),
                    }
                    .into());
                }
            }
        }

        if self.database.enabled && self.database.path.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "database.path",
            }
            .into());
        }

        Ok(())
    }
}
