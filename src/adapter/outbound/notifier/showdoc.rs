//! ShowDoc push channel.
//!
//! Each configured recipient has its own push URL. Recipients are pushed in
//! batches of `max_concurrent`, and every recipient gets an independent
//! retry series. The channel succeeds if any recipient accepted the push.

use async_trait::async_trait;
use futures_util::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{ChannelReport, RecipientResult, Record};
use crate::error::Result;
use crate::infrastructure::config::showdoc::ShowDocConfig;
use crate::infrastructure::config::translation::TranslationMode;
use crate::port::Channel;

use super::format::{cap, publish_time, truncate};
use super::RetryPolicy;

const DEFAULT_TITLE: &str = "币安公告";

const SINGLE_BODY_CHARS: usize = 500;
const BOTH_BODY_CHARS: usize = 400;

/// Reply body of the push endpoint.
#[derive(Debug, Deserialize)]
struct PushReply {
    error_code: Option<i64>,
    error_message: Option<String>,
}

/// Pushes plain-text announcements to ShowDoc recipients.
pub struct ShowDocChannel {
    client: Client,
    recipients: Vec<(String, String)>,
    max_concurrent: usize,
    max_message_chars: usize,
    mode: TranslationMode,
    retry: RetryPolicy,
}

impl ShowDocChannel {
    /// Build the channel from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ShowDocConfig, mode: TranslationMode) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            recipients: config
                .recipients
                .iter()
                .map(|(name, url)| (name.clone(), url.clone()))
                .collect(),
            max_concurrent: config.max_concurrent.max(1),
            max_message_chars: config.max_message_chars,
            mode,
            retry: RetryPolicy::new(config.max_attempts, config.retry_delay()),
        })
    }

    /// Names of the configured recipients.
    #[must_use]
    pub fn recipients(&self) -> Vec<&str> {
        self.recipients.iter().map(|(name, _)| name.as_str()).collect()
    }

    async fn push_once(&self, url: &str, title: &str, content: &str) -> std::result::Result<(), String> {
        let response = self
            .client
            .post(url)
            .form(&[("title", title), ("content", content)])
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        let body = response.text().await.map_err(|e| e.to_string())?;

        match serde_json::from_str::<PushReply>(&body) {
            Ok(PushReply {
                error_code: Some(0),
                ..
            }) => Ok(()),
            Ok(reply) => Err(reply.error_message.unwrap_or_else(|| {
                reply.error_code.map_or_else(
                    || "error code unknown".to_string(),
                    |code| format!("error code {code}"),
                )
            })),
            Err(_) if status == reqwest::StatusCode::OK => Ok(()),
            Err(_) => Err(format!("HTTP {}", status.as_u16())),
        }
    }

    async fn push(&self, name: &str, url: &str, title: &str, content: &str) -> RecipientResult {
        match self.retry.run(|_| self.push_once(url, title, content)).await {
            Ok(()) => {
                debug!(recipient = name, "ShowDoc push accepted");
                RecipientResult::ok(name)
            }
            Err(e) => {
                warn!(recipient = name, error = %e, "ShowDoc push failed");
                RecipientResult::failed(name, e)
            }
        }
    }

    fn format(&self, record: &Record) -> String {
        match self.mode {
            TranslationMode::Translated if record.has_translation() => {
                let title = record.translated_title.as_deref().unwrap_or(&record.title);
                let body = record.translated_body.as_deref().unwrap_or(&record.body);
                cap(single(title, body, record), self.max_message_chars)
            }
            TranslationMode::Both if record.has_translation() => {
                cap(both(record), self.max_message_chars * 3 / 2)
            }
            _ => cap(
                single(&record.title, &record.body, record),
                self.max_message_chars,
            ),
        }
    }
}

fn single(title: &str, body: &str, record: &Record) -> String {
    format!(
        "【币安公告】{}: {}\n\n发布时间: {}",
        title,
        truncate(body, SINGLE_BODY_CHARS),
        publish_time(record.publish_date)
    )
}

fn both(record: &Record) -> String {
    let title = record.translated_title.as_deref().unwrap_or(&record.title);
    let body = record.translated_body.as_deref().unwrap_or(&record.body);

    let mut msg = format!(
        "【币安公告-中文】\n{}\n\n{}\n\n",
        title,
        truncate(body, BOTH_BODY_CHARS)
    );
    msg.push_str(&format!(
        "【原文】\n{}\n\n{}",
        record.title,
        truncate(&record.body, BOTH_BODY_CHARS)
    ));
    if !record.catalog_name.is_empty() {
        msg.push_str(&format!("\n\n分类: {}", record.catalog_name));
    }
    msg.push_str(&format!("\n发布时间: {}", publish_time(record.publish_date)));
    msg
}

#[async_trait]
impl Channel for ShowDocChannel {
    fn name(&self) -> &str {
        "showdoc"
    }

    async fn deliver(&self, record: &Record) -> ChannelReport {
        let title = if record.title.is_empty() {
            DEFAULT_TITLE
        } else {
            record.title.as_str()
        };
        let content = self.format(record);

        let mut results = Vec::with_capacity(self.recipients.len());
        for batch in self.recipients.chunks(self.max_concurrent) {
            let pushes = batch
                .iter()
                .map(|(name, url)| self.push(name, url, title, &content));
            results.extend(join_all(pushes).await);
        }

        ChannelReport::from_recipients(results)
    }
}
