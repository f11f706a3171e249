//! Lock-free router counters.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use chrono::{TimeZone, Utc};

use crate::domain::RouterStats;

/// Live counters shared by overlapping record pipelines.
#[derive(Debug, Default)]
pub(super) struct RouterCounters {
    pub(super) received: AtomicU64,
    pub(super) invalid: AtomicU64,
    pub(super) duplicates: AtomicU64,
    pub(super) filtered: AtomicU64,
    pub(super) processed: AtomicU64,
    pub(super) deliveries_succeeded: AtomicU64,
    pub(super) deliveries_failed: AtomicU64,
    pub(super) enrichment_failures: AtomicU64,
    pub(super) storage_failures: AtomicU64,
    pub(super) errors: AtomicU64,
    /// Epoch millis of the last completed pipeline; 0 when none.
    last_processed_ms: AtomicI64,
}

impl RouterCounters {
    pub(super) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn add(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(super) fn mark_processed_now(&self) {
        self.last_processed_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub(super) fn snapshot(&self) -> RouterStats {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        let last_ms = self.last_processed_ms.load(Ordering::Relaxed);
        RouterStats {
            received: load(&self.received),
            invalid: load(&self.invalid),
            duplicates: load(&self.duplicates),
            filtered: load(&self.filtered),
            processed: load(&self.processed),
            deliveries_succeeded: load(&self.deliveries_succeeded),
            deliveries_failed: load(&self.deliveries_failed),
            enrichment_failures: load(&self.enrichment_failures),
            storage_failures: load(&self.storage_failures),
            errors: load(&self.errors),
            last_processed_at: (last_ms > 0)
                .then(|| Utc.timestamp_millis_opt(last_ms).single())
                .flatten(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let counters = RouterCounters::default();
        assert_eq!(counters.snapshot(), RouterStats::default());

        RouterCounters::bump(&counters.received);
        RouterCounters::add(&counters.deliveries_failed, 3);
        counters.mark_processed_now();

        let stats = counters.snapshot();
        assert_eq!(stats.received, 1);
        assert_eq!(stats.deliveries_failed, 3);
        assert!(stats.last_processed_at.is_some());
    }
}
