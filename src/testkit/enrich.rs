//! Scripted [`Enricher`] for router tests.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::domain::{EnricherStats, Record};
use crate::error::{Error, Result};
use crate::port::Enricher;

/// An enricher that either attaches a fixed translated title or fails.
pub struct ScriptedEnricher {
    translated_title: Option<String>,
    requests: AtomicU64,
}

impl ScriptedEnricher {
    pub fn translating(title: &str) -> Self {
        Self {
            translated_title: Some(title.to_string()),
            requests: AtomicU64::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            translated_title: None,
            requests: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl Enricher for ScriptedEnricher {
    async fn enrich(&self, record: &Record) -> Result<Record> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match &self.translated_title {
            Some(title) => Ok(Record {
                translated_title: Some(title.clone()),
                ..record.clone()
            }),
            None => Err(Error::Enrichment("provider unavailable".to_string())),
        }
    }

    fn stats(&self) -> EnricherStats {
        let requests = self.requests.load(Ordering::SeqCst);
        let ok = self.translated_title.is_some();
        EnricherStats {
            enabled: true,
            provider: Some("scripted".to_string()),
            requests,
            successes: if ok { requests } else { 0 },
            failures: if ok { 0 } else { requests },
            average_latency_ms: 0.0,
        }
    }
}
