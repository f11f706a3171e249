//! Persistence port for announcements and delivery outcomes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    AnnouncementPage, DeliveryOutcome, PruneSummary, Record, RecordIdentity, StoreSummary,
};
use crate::error::Result;

/// Storage for deduplication state, records and delivery outcomes.
///
/// Accessed concurrently by overlapping record pipelines. `upsert_record`
/// must be idempotent so that a race between `exists` and the write is
/// harmless.
#[async_trait]
pub trait AnnouncementStore: Send + Sync {
    /// True if a record with this identity has been persisted.
    async fn exists(&self, identity: &RecordIdentity) -> Result<bool>;

    /// Insert or replace the record keyed by `identity`.
    async fn upsert_record(&self, identity: &RecordIdentity, record: &Record) -> Result<()>;

    /// Append one delivery outcome for `identity`.
    async fn log_outcome(&self, identity: &RecordIdentity, outcome: &DeliveryOutcome)
        -> Result<()>;

    /// Flag the record as processed.
    async fn mark_processed(&self, identity: &RecordIdentity) -> Result<()>;

    /// Most recently received announcements first, with their outcomes.
    async fn recent(&self, limit: u32, offset: u32) -> Result<AnnouncementPage>;

    /// Aggregate counts for the administration surface.
    async fn summary(&self) -> Result<StoreSummary>;

    /// Delete announcements received and outcomes attempted before `cutoff`.
    ///
    /// A pruned identity is no longer known to dedup.
    async fn prune_older_than(&self, cutoff: DateTime<Utc>) -> Result<PruneSummary>;
}
