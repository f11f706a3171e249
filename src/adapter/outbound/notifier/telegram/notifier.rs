//! Telegram channel that posts each record to a single chat.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{LinkPreviewOptions, ParseMode};
use tracing::{info, warn};

use crate::domain::{ChannelReport, Record};
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::telegram::TelegramAppConfig;
use crate::infrastructure::config::translation::TranslationMode;
use crate::port::Channel;

use super::super::RetryPolicy;
use super::format::format_record;

/// Sends records to one Telegram chat as HTML messages.
pub struct TelegramChannel {
    bot: Bot,
    chat_id: ChatId,
    mode: TranslationMode,
    retry: RetryPolicy,
}

impl TelegramChannel {
    /// Build the channel from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a config error if the bot token or chat id is missing.
    #[allow(clippy::result_large_err)]
    pub fn new(config: &TelegramAppConfig, mode: TranslationMode) -> Result<Self> {
        let token = config.bot_token.as_deref().ok_or(ConfigError::MissingField {
            field: "TELEGRAM_BOT_TOKEN",
        })?;
        let chat_id = config.chat_id.ok_or(ConfigError::MissingField {
            field: "TELEGRAM_CHAT_ID",
        })?;

        info!(chat_id, ?mode, "Telegram channel configured");

        Ok(Self {
            bot: Bot::new(token),
            chat_id: ChatId(chat_id),
            mode,
            retry: RetryPolicy::new(config.max_attempts, config.retry_delay()),
        })
    }

    /// Point the bot at a different Bot API server.
    #[must_use]
    pub fn with_api_url(mut self, url: url::Url) -> Self {
        self.bot = self.bot.set_api_url(url);
        self
    }

    async fn send(&self, text: &str) -> std::result::Result<(), String> {
        self.bot
            .send_message(self.chat_id, text)
            .parse_mode(ParseMode::Html)
            .link_preview_options(disabled_preview())
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

fn disabled_preview() -> LinkPreviewOptions {
    LinkPreviewOptions {
        is_disabled: true,
        url: None,
        prefer_small_media: false,
        prefer_large_media: false,
        show_above_text: false,
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn deliver(&self, record: &Record) -> ChannelReport {
        let text = format_record(record, self.mode);

        match self.retry.run(|_| self.send(&text)).await {
            Ok(()) => ChannelReport::ok(),
            Err(e) => {
                warn!(
                    chat_id = self.chat_id.0,
                    attempts = self.retry.max_attempts,
                    error = %e,
                    "Telegram delivery failed"
                );
                ChannelReport::failed(e)
            }
        }
    }
}
