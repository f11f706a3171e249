//! In-memory store with call counting and failure injection.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::adapter::outbound::memory::MemoryStore;
use crate::domain::{
    AnnouncementPage, DeliveryOutcome, PruneSummary, Record, RecordIdentity, StoreSummary,
};
use crate::error::{Result, StoreError};
use crate::port::AnnouncementStore;

/// Wraps [`MemoryStore`], counting upserts and optionally failing
/// lookups or outcome writes.
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: MemoryStore,
    upserts: AtomicU32,
    prunes: AtomicU32,
    fail_lookups: bool,
    fail_outcome_logs: bool,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `exists` call fail.
    pub fn failing_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }

    /// Make every `log_outcome` call fail.
    pub fn failing_outcome_logs(mut self) -> Self {
        self.fail_outcome_logs = true;
        self
    }

    pub fn upserts(&self) -> u32 {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn prunes(&self) -> u32 {
        self.prunes.load(Ordering::SeqCst)
    }

    pub fn is_processed(&self, identity: &RecordIdentity) -> bool {
        self.inner.is_processed(identity)
    }

    pub fn outcomes_for(&self, identity: &RecordIdentity) -> Vec<DeliveryOutcome> {
        self.inner.outcomes_for(identity)
    }
}

fn injected() -> crate::error::Error {
    StoreError::Pool("injected failure".to_string()).into()
}

#[async_trait]
impl AnnouncementStore for CountingStore {
    async fn exists(&self, identity: &RecordIdentity) -> Result<bool> {
        if self.fail_lookups {
            return Err(injected());
        }
        self.inner.exists(identity).await
    }

    async fn upsert_record(&self, identity: &RecordIdentity, record: &Record) -> Result<()> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.inner.upsert_record(identity, record).await
    }

    async fn log_outcome(&self, identity: &RecordIdentity, outcome: &DeliveryOutcome) -> Result<()> {
        if self.fail_outcome_logs {
            return Err(injected());
        }
        self.inner.log_outcome(identity, outcome).await
    }

    async fn mark_processed(&self, identity: &RecordIdentity) -> Result<()> {
        self.inner.mark_processed(identity).await
    }

    async fn recent(&self, limit: u32, offset: u32) -> Result<AnnouncementPage> {
        self.inner.recent(limit, offset).await
    }

    async fn summary(&self) -> Result<StoreSummary> {
        self.inner.summary().await
    }

    async fn prune_older_than(&self, cutoff: DateTime<Utc>) -> Result<PruneSummary> {
        self.prunes.fetch_add(1, Ordering::SeqCst);
        self.inner.prune_older_than(cutoff).await
    }
}
