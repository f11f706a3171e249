//! Builders for announcement records.

use crate::domain::Record;

/// Fluent builder for [`Record`] with sensible defaults.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self {
            record: Record {
                catalog_id: 49,
                catalog_name: "Latest Binance News".to_string(),
                title: "Scheduled system maintenance".to_string(),
                body: "Trading will be paused during the upgrade.".to_string(),
                disclaimer: None,
                publish_date: 1_700_000_000_000,
                translated_title: None,
                translated_body: None,
            },
        }
    }

    /// The canonical listing announcement used across tests.
    pub fn listing() -> Self {
        Self::new()
            .catalog(161, "New Cryptocurrency Listing")
            .title("New Listing: XYZ")
            .body("Binance will list XYZ.")
    }

    pub fn catalog(mut self, id: i64, name: &str) -> Self {
        self.record.catalog_id = id;
        self.record.catalog_name = name.to_string();
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.record.title = title.to_string();
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.record.body = body.to_string();
        self
    }

    pub fn disclaimer(mut self, disclaimer: &str) -> Self {
        self.record.disclaimer = Some(disclaimer.to_string());
        self
    }

    pub fn publish_date(mut self, millis: i64) -> Self {
        self.record.publish_date = millis;
        self
    }

    pub fn translated(mut self, title: &str, body: &str) -> Self {
        self.record.translated_title = Some(title.to_string());
        self.record.translated_body = Some(body.to_string());
        self
    }

    pub fn build(self) -> Record {
        self.record
    }

    /// The record encoded the way the feed carries it.
    pub fn payload(self) -> String {
        serde_json::to_string(&self.record).unwrap_or_default()
    }
}

impl Default for RecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}
