//! Translation enricher backed by an [`Llm`].
//!
//! Translates the title and body of a record into Simplified Chinese. Any
//! failed request fails the whole enrichment; the router then delivers the
//! record untranslated.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::domain::{EnricherStats, Record};
use crate::error::{Error, Result};
use crate::infrastructure::config::translation::TranslationConfig;
use crate::port::{Enricher, Llm};

use super::notifier::format::truncate;

/// Reply prefixes models tend to add despite instructions.
const REPLY_PREFIXES: [&str; 5] = ["中文翻译：", "翻译：", "翻译结果：", "以下是翻译：", "中文："];

#[derive(Debug, Default)]
struct Latency {
    total_ms: f64,
    samples: u64,
}

pub struct TranslationEnricher {
    llm: Arc<dyn Llm>,
    timeout: Duration,
    max_body_chars: usize,
    requests: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    latency: Mutex<Latency>,
}

impl TranslationEnricher {
    #[must_use]
    pub fn new(llm: Arc<dyn Llm>, config: &TranslationConfig) -> Self {
        Self {
            llm,
            timeout: config.timeout(),
            max_body_chars: config.max_body_chars,
            requests: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            latency: Mutex::new(Latency::default()),
        }
    }

    /// Translate one piece of text, updating the counters.
    async fn translate(&self, text: &str) -> Result<String> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let started = Instant::now();

        let result = match tokio::time::timeout(self.timeout, self.llm.complete(&prompt(text))).await
        {
            Ok(Ok(reply)) => match clean_reply(&reply) {
                cleaned if cleaned.is_empty() => {
                    Err(Error::Enrichment("empty translation".to_string()))
                }
                cleaned => Ok(cleaned),
            },
            Ok(Err(e)) => Err(e),
            Err(_) => Err(Error::Enrichment(format!(
                "translation timed out after {}ms",
                self.timeout.as_millis()
            ))),
        };

        match &result {
            Ok(_) => {
                self.successes.fetch_add(1, Ordering::Relaxed);
                let mut latency = self.latency.lock();
                latency.total_ms += started.elapsed().as_secs_f64() * 1_000.0;
                latency.samples += 1;
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(provider = self.llm.name(), error = %e, "Translation request failed");
            }
        }
        result
    }
}

fn prompt(text: &str) -> String {
    format!(
        "请将以下英文币安交易所公告准确翻译成简体中文。请保持：\n\
         1. 金融术语的专业性和准确性\n\
         2. 时间格式和数字格式不变\n\
         3. 公司名称、代币名称等专有名词保持原文\n\
         4. 保持原文的语气和正式程度\n\
         5. 确保翻译通顺易懂\n\
         \n\
         原文：\n\
         {text}\n\
         \n\
         请直接返回中文翻译，不要包含任何解释或其他内容："
    )
}

/// Trim the reply and strip the known prefixes, in order.
fn clean_reply(reply: &str) -> String {
    let mut cleaned = reply.trim();
    for prefix in REPLY_PREFIXES {
        if let Some(rest) = cleaned.strip_prefix(prefix) {
            cleaned = rest.trim();
        }
    }
    cleaned.to_string()
}

#[async_trait]
impl Enricher for TranslationEnricher {
    async fn enrich(&self, record: &Record) -> Result<Record> {
        let mut enriched = record.clone();

        if !record.title.trim().is_empty() {
            enriched.translated_title = Some(self.translate(&record.title).await?);
        }
        if !record.body.trim().is_empty() {
            let body = truncate(&record.body, self.max_body_chars);
            enriched.translated_body = Some(self.translate(&body).await?);
        }

        debug!(
            title = %record.title,
            translated = enriched.translated_title.as_deref().unwrap_or_default(),
            "Record translated"
        );
        Ok(enriched)
    }

    fn stats(&self) -> EnricherStats {
        let latency = self.latency.lock();
        EnricherStats {
            enabled: true,
            provider: Some(self.llm.name().to_string()),
            requests: self.requests.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            average_latency_ms: if latency.samples == 0 {
                0.0
            } else {
                latency.total_ms / latency.samples as f64
            },
        }
    }
}
