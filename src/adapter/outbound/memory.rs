//! In-memory announcement store.
//!
//! Used when `[database] enabled = false` and as a test double.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

use crate::domain::{
    AnnouncementPage, DeliveryOutcome, PruneSummary, Record, RecordIdentity, StoreSummary,
    StoredAnnouncement,
};
use crate::error::Result;
use crate::port::AnnouncementStore;

#[derive(Debug, Clone)]
struct Entry {
    record: Record,
    received_at: DateTime<Utc>,
    processed: bool,
}

/// Process-local store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    announcements: RwLock<HashMap<RecordIdentity, Entry>>,
    outcomes: RwLock<HashMap<RecordIdentity, Vec<DeliveryOutcome>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the identity has been marked processed.
    #[must_use]
    pub fn is_processed(&self, identity: &RecordIdentity) -> bool {
        self.announcements
            .read()
            .get(identity)
            .is_some_and(|e| e.processed)
    }

    /// Outcomes logged for an identity, in logging order.
    #[must_use]
    pub fn outcomes_for(&self, identity: &RecordIdentity) -> Vec<DeliveryOutcome> {
        self.outcomes
            .read()
            .get(identity)
            .cloned()
            .unwrap_or_default()
    }

    fn to_stored(&self, identity: &RecordIdentity, entry: &Entry) -> StoredAnnouncement {
        StoredAnnouncement {
            identity: identity.to_string(),
            catalog_id: entry.record.catalog_id,
            catalog_name: entry.record.catalog_name.clone(),
            title: entry.record.title.clone(),
            body: entry.record.body.clone(),
            disclaimer: entry.record.disclaimer.clone(),
            publish_date: entry.record.publish_date,
            received_at: entry.received_at,
            processed: entry.processed,
            outcomes: self.outcomes_for(identity),
        }
    }
}

#[async_trait]
impl AnnouncementStore for MemoryStore {
    async fn exists(&self, identity: &RecordIdentity) -> Result<bool> {
        Ok(self.announcements.read().contains_key(identity))
    }

    async fn upsert_record(&self, identity: &RecordIdentity, record: &Record) -> Result<()> {
        self.announcements
            .write()
            .entry(identity.clone())
            .and_modify(|e| e.record = record.clone())
            .or_insert_with(|| Entry {
                record: record.clone(),
                received_at: Utc::now(),
                processed: false,
            });
        Ok(())
    }

    async fn log_outcome(&self, identity: &RecordIdentity, outcome: &DeliveryOutcome) -> Result<()> {
        self.outcomes
            .write()
            .entry(identity.clone())
            .or_default()
            .push(outcome.clone());
        Ok(())
    }

    async fn mark_processed(&self, identity: &RecordIdentity) -> Result<()> {
        if let Some(entry) = self.announcements.write().get_mut(identity) {
            entry.processed = true;
        }
        Ok(())
    }

    async fn recent(&self, limit: u32, offset: u32) -> Result<AnnouncementPage> {
        let announcements = self.announcements.read();
        let mut entries: Vec<(&RecordIdentity, &Entry)> = announcements.iter().collect();
        entries.sort_by(|a, b| {
            b.1.received_at
                .cmp(&a.1.received_at)
                .then(b.1.record.publish_date.cmp(&a.1.record.publish_date))
        });

        let items = entries
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|(identity, entry)| self.to_stored(identity, entry))
            .collect();

        Ok(AnnouncementPage {
            items,
            total: announcements.len() as u64,
        })
    }

    async fn summary(&self) -> Result<StoreSummary> {
        let cutoff = Utc::now() - Duration::hours(24);
        let announcements = self.announcements.read();
        let outcomes = self.outcomes.read();
        let (succeeded, failed) = outcomes
            .values()
            .flatten()
            .fold((0, 0), |(ok, err), o| if o.success { (ok + 1, err) } else { (ok, err + 1) });

        Ok(StoreSummary {
            total_announcements: announcements.len() as u64,
            processed_announcements: announcements.values().filter(|e| e.processed).count() as u64,
            successful_outcomes: succeeded,
            failed_outcomes: failed,
            recent_24h: announcements
                .values()
                .filter(|e| e.received_at >= cutoff)
                .count() as u64,
        })
    }

    async fn prune_older_than(&self, cutoff: DateTime<Utc>) -> Result<PruneSummary> {
        let mut announcements = self.announcements.write();
        let before = announcements.len();
        announcements.retain(|_, e| e.received_at >= cutoff);
        let removed = before - announcements.len();

        let mut outcomes = self.outcomes.write();
        let mut outcomes_removed = 0;
        outcomes.retain(|_, logged| {
            let kept = logged.len();
            logged.retain(|o| o.attempted_at >= cutoff);
            outcomes_removed += kept - logged.len();
            !logged.is_empty()
        });

        Ok(PruneSummary {
            announcements: removed as u64,
            outcomes: outcomes_removed as u64,
        })
    }
}
