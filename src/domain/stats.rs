//! Read-only snapshots reported by the router, the enricher and the store.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::outcome::DeliveryOutcome;

/// Snapshot of the router's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouterStats {
    pub received: u64,
    pub invalid: u64,
    pub duplicates: u64,
    pub filtered: u64,
    pub processed: u64,
    pub deliveries_succeeded: u64,
    pub deliveries_failed: u64,
    pub enrichment_failures: u64,
    /// Persistence writes that failed after delivery was attempted.
    pub storage_failures: u64,
    pub errors: u64,
    pub last_processed_at: Option<DateTime<Utc>>,
}

/// Snapshot of the translation enricher.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnricherStats {
    pub enabled: bool,
    pub provider: Option<String>,
    pub requests: u64,
    pub successes: u64,
    pub failures: u64,
    pub average_latency_ms: f64,
}

impl EnricherStats {
    /// Percentage of requests that succeeded, or 0 when nothing was sent.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.requests == 0 {
            return 0.0;
        }
        self.successes as f64 / self.requests as f64 * 100.0
    }
}

/// A persisted announcement with its delivery outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredAnnouncement {
    pub identity: String,
    pub catalog_id: i64,
    pub catalog_name: String,
    pub title: String,
    pub body: String,
    pub disclaimer: Option<String>,
    pub publish_date: i64,
    pub received_at: DateTime<Utc>,
    pub processed: bool,
    pub outcomes: Vec<DeliveryOutcome>,
}

/// One page of stored announcements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnnouncementPage {
    pub items: Vec<StoredAnnouncement>,
    pub total: u64,
}

/// Aggregate counts over the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    pub total_announcements: u64,
    pub processed_announcements: u64,
    pub successful_outcomes: u64,
    pub failed_outcomes: u64,
    pub recent_24h: u64,
}

/// Rows removed by one retention sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PruneSummary {
    pub announcements: u64,
    pub outcomes: u64,
}
