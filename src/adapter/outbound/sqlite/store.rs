//! SQLite announcement store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::upsert::excluded;

use super::database::connection::DbPool;
use super::database::model::{AnnouncementRow, NewOutcomeRow, OutcomeRow};
use super::database::schema::{announcements, delivery_outcomes};
use crate::domain::{
    AnnouncementPage, DeliveryOutcome, PruneSummary, Record, RecordIdentity, StoreSummary,
    StoredAnnouncement,
};
use crate::error::{Error, Result, StoreError};
use crate::port::AnnouncementStore;

type Conn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// SQLite-backed [`AnnouncementStore`].
///
/// Timestamps are stored as RFC 3339 text in UTC with millisecond precision,
/// so lexical order matches chronological order.
pub struct SqliteAnnouncementStore {
    pool: DbPool,
}

impl SqliteAnnouncementStore {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<Conn> {
        self.pool
            .get()
            .map_err(|e| StoreError::Pool(e.to_string()).into())
    }

    fn to_row(identity: &RecordIdentity, record: &Record, received_at: DateTime<Utc>) -> AnnouncementRow {
        AnnouncementRow {
            identity: identity.to_string(),
            catalog_id: record.catalog_id,
            catalog_name: record.catalog_name.clone(),
            title: record.title.clone(),
            body: record.body.clone(),
            disclaimer: record.disclaimer.clone(),
            publish_date: record.publish_date,
            received_at: timestamp(received_at),
            processed: false,
        }
    }

    fn from_outcome_row(row: OutcomeRow) -> Result<DeliveryOutcome> {
        Ok(DeliveryOutcome {
            channel: row.channel,
            recipient: row.recipient,
            success: row.success,
            error_detail: row.error_detail,
            raw_detail: row.raw_detail,
            attempted_at: parse_timestamp(&row.attempted_at)?,
        })
    }

    fn from_row(row: AnnouncementRow, outcomes: Vec<DeliveryOutcome>) -> Result<StoredAnnouncement> {
        Ok(StoredAnnouncement {
            received_at: parse_timestamp(&row.received_at)?,
            identity: row.identity,
            catalog_id: row.catalog_id,
            catalog_name: row.catalog_name,
            title: row.title,
            body: row.body,
            disclaimer: row.disclaimer,
            publish_date: row.publish_date,
            processed: row.processed,
            outcomes,
        })
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Parse(e.to_string()))
}

fn count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or_default()
}

#[async_trait]
impl AnnouncementStore for SqliteAnnouncementStore {
    async fn exists(&self, identity: &RecordIdentity) -> Result<bool> {
        let mut conn = self.conn()?;
        let found = diesel::select(diesel::dsl::exists(
            announcements::table.find(identity.as_str()),
        ))
        .get_result::<bool>(&mut conn)
        .map_err(StoreError::from)?;
        Ok(found)
    }

    async fn upsert_record(&self, identity: &RecordIdentity, record: &Record) -> Result<()> {
        let row = Self::to_row(identity, record, Utc::now());
        let mut conn = self.conn()?;

        // The identity only covers (category, title, publish date); later
        // copies may carry an edited body, which replaces the stored one.
        diesel::insert_into(announcements::table)
            .values(&row)
            .on_conflict(announcements::identity)
            .do_update()
            .set((
                announcements::catalog_name.eq(excluded(announcements::catalog_name)),
                announcements::body.eq(excluded(announcements::body)),
                announcements::disclaimer.eq(excluded(announcements::disclaimer)),
            ))
            .execute(&mut conn)
            .map_err(StoreError::from)?;
        Ok(())
    }

    async fn log_outcome(&self, identity: &RecordIdentity, outcome: &DeliveryOutcome) -> Result<()> {
        let row = NewOutcomeRow {
            identity: identity.to_string(),
            channel: outcome.channel.clone(),
            recipient: outcome.recipient.clone(),
            success: outcome.success,
            error_detail: outcome.error_detail.clone(),
            raw_detail: outcome.raw_detail.clone(),
            attempted_at: timestamp(outcome.attempted_at),
        };
        let mut conn = self.conn()?;

        diesel::insert_into(delivery_outcomes::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(StoreError::from)?;
        Ok(())
    }

    async fn mark_processed(&self, identity: &RecordIdentity) -> Result<()> {
        let mut conn = self.conn()?;
        diesel::update(announcements::table.find(identity.as_str()))
            .set(announcements::processed.eq(true))
            .execute(&mut conn)
            .map_err(StoreError::from)?;
        Ok(())
    }

    async fn recent(&self, limit: u32, offset: u32) -> Result<AnnouncementPage> {
        let mut conn = self.conn()?;

        let total: i64 = announcements::table
            .count()
            .get_result(&mut conn)
            .map_err(StoreError::from)?;

        let rows: Vec<AnnouncementRow> = announcements::table
            .select(AnnouncementRow::as_select())
            .order((
                announcements::received_at.desc(),
                announcements::publish_date.desc(),
            ))
            .limit(i64::from(limit))
            .offset(i64::from(offset))
            .load(&mut conn)
            .map_err(StoreError::from)?;

        let identities: Vec<String> = rows.iter().map(|r| r.identity.clone()).collect();
        let outcome_rows: Vec<OutcomeRow> = delivery_outcomes::table
            .select(OutcomeRow::as_select())
            .filter(delivery_outcomes::identity.eq_any(identities))
            .order(delivery_outcomes::id.asc())
            .load(&mut conn)
            .map_err(StoreError::from)?;

        let mut grouped: HashMap<String, Vec<DeliveryOutcome>> = HashMap::new();
        for row in outcome_rows {
            let identity = row.identity.clone();
            grouped
                .entry(identity)
                .or_default()
                .push(Self::from_outcome_row(row)?);
        }

        let items = rows
            .into_iter()
            .map(|row| {
                let outcomes = grouped.remove(&row.identity).unwrap_or_default();
                Self::from_row(row, outcomes)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(AnnouncementPage {
            items,
            total: count(total),
        })
    }

    async fn summary(&self) -> Result<StoreSummary> {
        let mut conn = self.conn()?;
        let cutoff = timestamp(Utc::now() - Duration::hours(24));

        let total: i64 = announcements::table
            .count()
            .get_result(&mut conn)
            .map_err(StoreError::from)?;
        let processed: i64 = announcements::table
            .filter(announcements::processed.eq(true))
            .count()
            .get_result(&mut conn)
            .map_err(StoreError::from)?;
        let recent: i64 = announcements::table
            .filter(announcements::received_at.ge(cutoff))
            .count()
            .get_result(&mut conn)
            .map_err(StoreError::from)?;
        let succeeded: i64 = delivery_outcomes::table
            .filter(delivery_outcomes::success.eq(true))
            .count()
            .get_result(&mut conn)
            .map_err(StoreError::from)?;
        let failed: i64 = delivery_outcomes::table
            .filter(delivery_outcomes::success.eq(false))
            .count()
            .get_result(&mut conn)
            .map_err(StoreError::from)?;

        Ok(StoreSummary {
            total_announcements: count(total),
            processed_announcements: count(processed),
            successful_outcomes: count(succeeded),
            failed_outcomes: count(failed),
            recent_24h: count(recent),
        })
    }

    async fn prune_older_than(&self, cutoff: DateTime<Utc>) -> Result<PruneSummary> {
        let cutoff = timestamp(cutoff);
        let mut conn = self.conn()?;

        let (announcement_rows, outcome_rows) = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                let outcome_rows = diesel::delete(
                    delivery_outcomes::table.filter(delivery_outcomes::attempted_at.lt(&cutoff)),
                )
                .execute(conn)?;
                let announcement_rows = diesel::delete(
                    announcements::table.filter(announcements::received_at.lt(&cutoff)),
                )
                .execute(conn)?;
                Ok((announcement_rows, outcome_rows))
            })
            .map_err(StoreError::from)?;

        Ok(PruneSummary {
            announcements: announcement_rows as u64,
            outcomes: outcome_rows as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations};
    use crate::domain::ChannelReport;
    use crate::testkit::domain::RecordBuilder;

    fn store() -> SqliteAnnouncementStore {
        let pool = create_pool(":memory:", 1, 5000).unwrap();
        run_migrations(&pool).unwrap();
        SqliteAnnouncementStore::new(pool)
    }

    #[tokio::test]
    async fn upsert_then_exists() {
        let store = store();
        let record = RecordBuilder::listing().build();
        let identity = record.identity();

        assert!(!store.exists(&identity).await.unwrap());
        store.upsert_record(&identity, &record).await.unwrap();
        assert!(store.exists(&identity).await.unwrap());
    }

    #[tokio::test]
    async fn upsert_is_idempotent_and_keeps_processed_flag() {
        let store = store();
        let record = RecordBuilder::listing().build();
        let identity = record.identity();

        store.upsert_record(&identity, &record).await.unwrap();
        store.mark_processed(&identity).await.unwrap();

        let edited = RecordBuilder::listing().body("Updated body").build();
        store.upsert_record(&identity, &edited).await.unwrap();

        let page = store.recent(10, 0).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].body, "Updated body");
        assert!(page.items[0].processed);
    }

    #[tokio::test]
    async fn outcomes_are_attached_to_their_announcement() {
        let store = store();
        let record = RecordBuilder::listing().build();
        let identity = record.identity();
        store.upsert_record(&identity, &record).await.unwrap();

        let now = Utc::now();
        for outcome in ChannelReport::ok()
            .outcomes("telegram", now)
            .into_iter()
            .chain(ChannelReport::failed("HTTP 502").outcomes("showdoc", now))
        {
            store.log_outcome(&identity, &outcome).await.unwrap();
        }

        let page = store.recent(10, 0).await.unwrap();
        let outcomes = &page.items[0].outcomes;
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].channel, "telegram");
        assert!(outcomes[0].success);
        assert_eq!(outcomes[1].error_detail.as_deref(), Some("HTTP 502"));
        assert!(outcomes[1].raw_detail.is_some());
    }

    #[tokio::test]
    async fn recent_pages_newest_first() {
        let store = store();
        for (i, title) in ["First notice", "Second notice", "Third notice"]
            .iter()
            .enumerate()
        {
            let record = RecordBuilder::new()
                .title(title)
                .publish_date(1_700_000_000_000 + i as i64)
                .build();
            store.upsert_record(&record.identity(), &record).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let first = store.recent(2, 0).await.unwrap();
        assert_eq!(first.total, 3);
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.items[0].title, "Third notice");

        let second = store.recent(2, 2).await.unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].title, "First notice");
    }

    #[tokio::test]
    async fn prune_removes_rows_before_cutoff() {
        let store = store();
        let record = RecordBuilder::listing().build();
        let identity = record.identity();
        store.upsert_record(&identity, &record).await.unwrap();

        let now = Utc::now();
        let stale = ChannelReport::failed("down").outcomes("telegram", now - Duration::days(40));
        let fresh = ChannelReport::ok().outcomes("showdoc", now);
        for outcome in stale.iter().chain(&fresh) {
            store.log_outcome(&identity, outcome).await.unwrap();
        }

        let pruned = store.prune_older_than(now - Duration::days(30)).await.unwrap();
        assert_eq!(pruned, PruneSummary { announcements: 0, outcomes: 1 });
        assert!(store.exists(&identity).await.unwrap());

        let pruned = store
            .prune_older_than(Utc::now() + Duration::minutes(1))
            .await
            .unwrap();
        assert_eq!(pruned, PruneSummary { announcements: 1, outcomes: 1 });
        assert!(!store.exists(&identity).await.unwrap());
        assert_eq!(store.summary().await.unwrap(), StoreSummary::default());
    }

    #[tokio::test]
    async fn summary_counts_announcements_and_outcomes() {
        let store = store();
        let delivered = RecordBuilder::listing().build();
        let failed = RecordBuilder::new().title("Maintenance notice").build();

        for record in [&delivered, &failed] {
            store.upsert_record(&record.identity(), record).await.unwrap();
        }
        let now = Utc::now();
        for outcome in ChannelReport::ok().outcomes("telegram", now) {
            store.log_outcome(&delivered.identity(), &outcome).await.unwrap();
        }
        for outcome in ChannelReport::failed("down").outcomes("telegram", now) {
            store.log_outcome(&failed.identity(), &outcome).await.unwrap();
        }
        store.mark_processed(&delivered.identity()).await.unwrap();

        let summary = store.summary().await.unwrap();
        assert_eq!(
            summary,
            StoreSummary {
                total_announcements: 2,
                processed_announcements: 1,
                successful_outcomes: 1,
                failed_outcomes: 1,
                recent_24h: 2,
            }
        );
    }
}
