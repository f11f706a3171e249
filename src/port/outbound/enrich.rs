//! Enrichment port.

use async_trait::async_trait;

use crate::domain::{EnricherStats, Record};
use crate::error::Result;

/// Best-effort transformation applied before fan-out.
///
/// The router treats an error as "deliver the input unchanged".
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Return an enriched copy of `record`.
    async fn enrich(&self, record: &Record) -> Result<Record>;

    /// Counters for the administration surface.
    fn stats(&self) -> EnricherStats;
}
