//! Distribution router: dedup, filter, enrich, fan out, persist.
//!
//! ```text
//! raw payload
//!     |
//!     +-- parse + validate ----------> Invalid
//!     +-- identity, in-flight claim,
//!     |   store lookup --------------> Duplicate
//!     +-- category / keyword rules --> Rejected
//!     +-- enrich (best effort)
//!     +-- deliver to every channel concurrently, wait for all
//!     +-- upsert record, log each outcome, mark processed
//!     v
//! Delivered(RouteReport)
//! ```
//!
//! Only parsing and the duplicate check stop a pipeline early. A failing
//! channel, enricher or storage write is counted and logged, and the rest of
//! the pipeline carries on.

mod filter;
mod stats;

pub use filter::RecordFilter;

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashSet;
use futures_util::future::join_all;
use tracing::{debug, error, info, warn};

use self::stats::RouterCounters;
use crate::domain::{
    ChannelOutcome, Record, RecordIdentity, RouteOutcome, RouteReport, RouterStats,
};
use crate::port::{AnnouncementStore, Channel, Enricher};

/// Routes records from the feed to every enabled channel.
pub struct DistributionRouter {
    filter: RecordFilter,
    channels: Vec<Arc<dyn Channel>>,
    enricher: Option<Arc<dyn Enricher>>,
    store: Arc<dyn AnnouncementStore>,
    in_flight: DashSet<RecordIdentity>,
    counters: RouterCounters,
}

/// Releases an in-flight claim when the pipeline finishes.
struct InFlight<'a> {
    set: &'a DashSet<RecordIdentity>,
    identity: RecordIdentity,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set.remove(&self.identity);
    }
}

impl DistributionRouter {
    pub fn new(
        filter: RecordFilter,
        channels: Vec<Arc<dyn Channel>>,
        enricher: Option<Arc<dyn Enricher>>,
        store: Arc<dyn AnnouncementStore>,
    ) -> Self {
        Self {
            filter,
            channels,
            enricher,
            store,
            in_flight: DashSet::new(),
            counters: RouterCounters::default(),
        }
    }

    /// Names of the configured channels, in fan-out order.
    #[must_use]
    pub fn channel_names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.name().to_string()).collect()
    }

    #[must_use]
    pub fn stats(&self) -> RouterStats {
        self.counters.snapshot()
    }

    /// The enricher, if translation is configured.
    #[must_use]
    pub fn enricher(&self) -> Option<&Arc<dyn Enricher>> {
        self.enricher.as_ref()
    }

    /// Run one raw data payload through the whole pipeline.
    pub async fn route_raw(&self, payload: &str) -> RouteOutcome {
        RouterCounters::bump(&self.counters.received);
        match Record::from_payload(payload) {
            Ok(record) => self.route(record).await,
            Err(e) => {
                RouterCounters::bump(&self.counters.invalid);
                warn!(error = %e, "Dropping unparseable record payload");
                RouteOutcome::Invalid {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Run an already decoded record through the pipeline.
    pub async fn route_record(&self, record: Record) -> RouteOutcome {
        RouterCounters::bump(&self.counters.received);
        self.route(record).await
    }

    /// Deliver a synthetic record to every channel without persisting
    /// anything.
    pub async fn test_channels(&self) -> Vec<ChannelOutcome> {
        let record = Record::test_record();
        self.fan_out(&record).await
    }

    async fn route(&self, record: Record) -> RouteOutcome {
        if let Err(reason) = self.filter.validate(&record) {
            RouterCounters::bump(&self.counters.invalid);
            warn!(%reason, title = %record.title, "Rejecting invalid record");
            return RouteOutcome::Invalid { reason };
        }

        let identity = record.identity();
        if !self.in_flight.insert(identity.clone()) {
            RouterCounters::bump(&self.counters.duplicates);
            debug!(%identity, "Record already in flight");
            return RouteOutcome::Duplicate { identity };
        }
        let _claim = InFlight {
            set: &self.in_flight,
            identity: identity.clone(),
        };

        match self.store.exists(&identity).await {
            Ok(true) => {
                RouterCounters::bump(&self.counters.duplicates);
                debug!(%identity, "Record already processed");
                return RouteOutcome::Duplicate { identity };
            }
            Ok(false) => {}
            Err(e) => {
                RouterCounters::bump(&self.counters.errors);
                warn!(%identity, error = %e, "Dedup lookup failed; treating record as new");
            }
        }

        if let Err(reason) = self.filter.check(&record) {
            RouterCounters::bump(&self.counters.filtered);
            debug!(%identity, ?reason, "Record filtered");
            return RouteOutcome::Rejected { identity, reason };
        }

        let record = self.enrich(record).await;

        if self.channels.is_empty() {
            warn!(%identity, "No delivery channels configured");
        }
        let channels = self.fan_out(&record).await;
        let report = RouteReport::new(identity, channels, Utc::now());

        let succeeded = report.outcomes.iter().filter(|o| o.success).count();
        RouterCounters::add(&self.counters.deliveries_succeeded, succeeded);
        RouterCounters::add(
            &self.counters.deliveries_failed,
            report.outcomes.len() - succeeded,
        );

        self.persist(&record, &report).await;

        RouterCounters::bump(&self.counters.processed);
        self.counters.mark_processed_now();
        info!(
            identity = %report.identity,
            title = %record.title,
            success = report.success,
            succeeded = report.success_count,
            total = report.total_count,
            "Record routed"
        );

        RouteOutcome::Delivered(report)
    }

    async fn enrich(&self, record: Record) -> Record {
        let Some(enricher) = &self.enricher else {
            return record;
        };
        match enricher.enrich(&record).await {
            Ok(enriched) => enriched,
            Err(e) => {
                RouterCounters::bump(&self.counters.enrichment_failures);
                warn!(error = %e, "Enrichment failed; delivering original content");
                record
            }
        }
    }

    async fn fan_out(&self, record: &Record) -> Vec<ChannelOutcome> {
        join_all(self.channels.iter().map(|channel| async move {
            let report = channel.deliver(record).await;
            if !report.success {
                warn!(
                    channel = channel.name(),
                    error = report.error.as_deref().unwrap_or("unknown"),
                    "Channel delivery failed"
                );
            }
            ChannelOutcome {
                channel: channel.name().to_string(),
                report,
            }
        }))
        .await
    }

    /// Write the record and every outcome. Each write stands alone.
    async fn persist(&self, record: &Record, report: &RouteReport) {
        let identity = &report.identity;

        if let Err(e) = self.store.upsert_record(identity, record).await {
            RouterCounters::bump(&self.counters.storage_failures);
            error!(%identity, error = %e, "Failed to store record");
        }

        for outcome in &report.outcomes {
            if let Err(e) = self.store.log_outcome(identity, outcome).await {
                RouterCounters::bump(&self.counters.storage_failures);
                error!(
                    %identity,
                    channel = %outcome.channel,
                    recipient = outcome.recipient.as_deref().unwrap_or("-"),
                    error = %e,
                    "Failed to log delivery outcome"
                );
            }
        }

        if report.success {
            if let Err(e) = self.store.mark_processed(identity).await {
                RouterCounters::bump(&self.counters.storage_failures);
                error!(%identity, error = %e, "Failed to mark record processed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChannelReport, RecipientResult, RejectReason};
    use crate::infrastructure::config::filter::FilterConfig;
    use crate::testkit::channel::ScriptedChannel;
    use crate::testkit::domain::RecordBuilder;
    use crate::testkit::enrich::ScriptedEnricher;
    use crate::testkit::store::CountingStore;

    fn router_with(
        channels: Vec<Arc<dyn Channel>>,
        enricher: Option<Arc<dyn Enricher>>,
        store: Arc<CountingStore>,
        filters: FilterConfig,
    ) -> DistributionRouter {
        DistributionRouter::new(RecordFilter::new(&filters), channels, enricher, store)
    }

    fn listing_payload() -> String {
        serde_json::to_string(&RecordBuilder::listing().build()).unwrap()
    }

    #[tokio::test]
    async fn delivers_and_persists_once() {
        let store = Arc::new(CountingStore::new());
        let channel = Arc::new(ScriptedChannel::new("telegram"));
        let router = router_with(
            vec![channel.clone()],
            None,
            store.clone(),
            FilterConfig::default(),
        );

        let outcome = router.route_raw(&listing_payload()).await;
        assert!(outcome.is_success());

        let identity = RecordBuilder::listing().build().identity();
        assert!(store.exists(&identity).await.unwrap());
        assert!(store.is_processed(&identity));
        assert_eq!(store.upserts(), 1);
        assert_eq!(store.outcomes_for(&identity).len(), 1);
        assert_eq!(channel.calls(), 1);
    }

    #[tokio::test]
    async fn redelivery_is_a_duplicate() {
        let store = Arc::new(CountingStore::new());
        let channel = Arc::new(ScriptedChannel::new("telegram"));
        let router = router_with(
            vec![channel.clone()],
            None,
            store.clone(),
            FilterConfig::default(),
        );

        router.route_raw(&listing_payload()).await;
        let second = router.route_raw(&listing_payload()).await;

        assert!(matches!(second, RouteOutcome::Duplicate { .. }));
        assert_eq!(channel.calls(), 1);
        assert_eq!(store.upserts(), 1);
        assert_eq!(router.stats().duplicates, 1);
        assert_eq!(router.stats().received, 2);
    }

    #[tokio::test]
    async fn concurrent_redelivery_delivers_once() {
        let store = Arc::new(CountingStore::new());
        let channel = Arc::new(ScriptedChannel::new("telegram"));
        let router = router_with(
            vec![channel.clone()],
            None,
            store.clone(),
            FilterConfig::default(),
        );

        let payload = listing_payload();
        let (a, b) = tokio::join!(router.route_raw(&payload), router.route_raw(&payload));

        let delivered = [&a, &b]
            .iter()
            .filter(|o| matches!(o, RouteOutcome::Delivered(_)))
            .count();
        assert_eq!(delivered, 1);
        assert_eq!(channel.calls(), 1);
        assert_eq!(store.upserts(), 1);
    }

    #[tokio::test]
    async fn failing_channel_does_not_block_siblings() {
        let store = Arc::new(CountingStore::new());
        let a = Arc::new(ScriptedChannel::new("a"));
        let b = Arc::new(ScriptedChannel::new("b").always(ChannelReport::failed("HTTP 500")));
        let c = Arc::new(ScriptedChannel::new("c"));
        let router = router_with(
            vec![a.clone(), b.clone(), c.clone()],
            None,
            store.clone(),
            FilterConfig::default(),
        );

        let outcome = router.route_raw(&listing_payload()).await;
        let RouteOutcome::Delivered(report) = outcome else {
            panic!("expected delivery");
        };

        assert!(report.success);
        assert_eq!(report.success_count, 2);
        assert_eq!(report.total_count, 3);
        assert_eq!((a.calls(), b.calls(), c.calls()), (1, 1, 1));

        let logged = store.outcomes_for(&report.identity);
        assert_eq!(logged.len(), 3);
        assert!(logged.iter().any(|o| o.channel == "b" && !o.success));
        assert!(store.is_processed(&report.identity));

        let stats = router.stats();
        assert_eq!(stats.deliveries_succeeded, 2);
        assert_eq!(stats.deliveries_failed, 1);
    }

    #[tokio::test]
    async fn total_failure_is_stored_but_not_processed() {
        let store = Arc::new(CountingStore::new());
        let channel =
            Arc::new(ScriptedChannel::new("telegram").always(ChannelReport::failed("down")));
        let router = router_with(vec![channel], None, store.clone(), FilterConfig::default());

        let outcome = router.route_raw(&listing_payload()).await;
        assert!(!outcome.is_success());

        let identity = RecordBuilder::listing().build().identity();
        assert_eq!(store.upserts(), 1);
        assert!(!store.is_processed(&identity));
        assert_eq!(store.outcomes_for(&identity).len(), 1);
    }

    #[tokio::test]
    async fn multi_recipient_channel_logs_each_recipient() {
        let store = Arc::new(CountingStore::new());
        let channel = Arc::new(ScriptedChannel::new("showdoc").always(
            ChannelReport::from_recipients(vec![
                RecipientResult::ok("alice"),
                RecipientResult::failed("bob", "timeout"),
            ]),
        ));
        let router = router_with(vec![channel], None, store.clone(), FilterConfig::default());

        router.route_raw(&listing_payload()).await;

        let identity = RecordBuilder::listing().build().identity();
        let logged = store.outcomes_for(&identity);
        assert_eq!(logged.len(), 2);
        assert_eq!(logged[0].recipient.as_deref(), Some("alice"));
        assert_eq!(logged[1].recipient.as_deref(), Some("bob"));
        assert!(store.is_processed(&identity));
    }

    #[tokio::test]
    async fn filtered_record_touches_no_channel() {
        let store = Arc::new(CountingStore::new());
        let channel = Arc::new(ScriptedChannel::new("telegram"));
        let filters = FilterConfig {
            keywords: vec!["listing".into()],
            exclude_keywords: vec!["xyz".into()],
            ..FilterConfig::default()
        };
        let router = router_with(vec![channel.clone()], None, store.clone(), filters);

        let outcome = router.route_raw(&listing_payload()).await;
        assert!(matches!(
            outcome,
            RouteOutcome::Rejected {
                reason: RejectReason::ExcludedKeyword { .. },
                ..
            }
        ));
        assert_eq!(channel.calls(), 0);
        assert_eq!(store.upserts(), 0);
        assert_eq!(router.stats().filtered, 1);
    }

    #[tokio::test]
    async fn invalid_payloads_stop_early() {
        let store = Arc::new(CountingStore::new());
        let channel = Arc::new(ScriptedChannel::new("telegram"));
        let router = router_with(
            vec![channel.clone()],
            None,
            store.clone(),
            FilterConfig::default(),
        );

        let garbage = router.route_raw("{not json").await;
        let short = router.route_raw(r#"{"title":"Hi"}"#).await;

        assert!(matches!(garbage, RouteOutcome::Invalid { .. }));
        assert!(matches!(short, RouteOutcome::Invalid { .. }));
        assert_eq!(channel.calls(), 0);
        assert_eq!(router.stats().invalid, 2);
    }

    #[tokio::test]
    async fn null_body_is_still_delivered() {
        let store = Arc::new(CountingStore::new());
        let channel = Arc::new(ScriptedChannel::new("telegram"));
        let router = router_with(
            vec![channel.clone()],
            None,
            store.clone(),
            FilterConfig::default(),
        );

        let payload = r#"{"catalogId":161,"catalogName":null,"title":"New Listing: XYZ",
            "body":null,"publishDate":1700000000000}"#;
        let outcome = router.route_raw(payload).await;

        assert!(outcome.is_success());
        assert_eq!(channel.calls(), 1);
        assert!(channel.records()[0].body.is_empty());
    }

    #[tokio::test]
    async fn enrichment_failure_delivers_original() {
        let store = Arc::new(CountingStore::new());
        let channel = Arc::new(ScriptedChannel::new("telegram"));
        let enricher = Arc::new(ScriptedEnricher::failing());
        let router = router_with(
            vec![channel.clone()],
            Some(enricher),
            store,
            FilterConfig::default(),
        );

        let outcome = router.route_raw(&listing_payload()).await;
        assert!(outcome.is_success());

        let delivered = channel.records();
        assert_eq!(delivered.len(), 1);
        assert!(!delivered[0].has_translation());
        assert_eq!(router.stats().enrichment_failures, 1);
    }

    #[tokio::test]
    async fn enriched_record_reaches_channels() {
        let store = Arc::new(CountingStore::new());
        let channel = Arc::new(ScriptedChannel::new("telegram"));
        let enricher = Arc::new(ScriptedEnricher::translating("新上币"));
        let router = router_with(
            vec![channel.clone()],
            Some(enricher),
            store,
            FilterConfig::default(),
        );

        router.route_raw(&listing_payload()).await;
        let delivered = channel.records();
        assert_eq!(delivered[0].translated_title.as_deref(), Some("新上币"));
    }

    #[tokio::test]
    async fn storage_failures_are_counted_not_fatal() {
        let store = Arc::new(CountingStore::new().failing_outcome_logs());
        let a = Arc::new(ScriptedChannel::new("a"));
        let b = Arc::new(ScriptedChannel::new("b"));
        let router = router_with(
            vec![a.clone(), b.clone()],
            None,
            store.clone(),
            FilterConfig::default(),
        );

        let outcome = router.route_raw(&listing_payload()).await;
        assert!(outcome.is_success());
        assert_eq!((a.calls(), b.calls()), (1, 1));
        assert_eq!(router.stats().storage_failures, 2);
        assert_eq!(store.upserts(), 1);
    }

    #[tokio::test]
    async fn failed_dedup_lookup_still_delivers() {
        let store = Arc::new(CountingStore::new().failing_lookups());
        let channel = Arc::new(ScriptedChannel::new("telegram"));
        let router = router_with(
            vec![channel.clone()],
            None,
            store,
            FilterConfig::default(),
        );

        let outcome = router.route_raw(&listing_payload()).await;
        assert!(outcome.is_success());
        assert_eq!(channel.calls(), 1);
        assert_eq!(router.stats().errors, 1);
    }

    #[tokio::test]
    async fn test_channels_skips_persistence() {
        let store = Arc::new(CountingStore::new());
        let a = Arc::new(ScriptedChannel::new("a"));
        let b = Arc::new(ScriptedChannel::new("b").always(ChannelReport::failed("nope")));
        let router = router_with(
            vec![a, b],
            None,
            store.clone(),
            FilterConfig::default(),
        );

        let results = router.test_channels().await;
        assert_eq!(results.len(), 2);
        assert!(results[0].report.success);
        assert!(!results[1].report.success);
        assert_eq!(store.upserts(), 0);
        assert_eq!(router.stats().received, 0);
    }
}
