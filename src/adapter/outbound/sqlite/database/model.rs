//! Database model types for Diesel ORM.

use diesel::prelude::*;

use super::schema::{announcements, delivery_outcomes};

/// Database row for an announcement.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = announcements)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AnnouncementRow {
    pub identity: String,
    pub catalog_id: i64,
    pub catalog_name: String,
    pub title: String,
    pub body: String,
    pub disclaimer: Option<String>,
    pub publish_date: i64,
    pub received_at: String,
    pub processed: bool,
}

/// Database row for a delivery outcome (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = delivery_outcomes)]
pub struct NewOutcomeRow {
    pub identity: String,
    pub channel: String,
    pub recipient: Option<String>,
    pub success: bool,
    pub error_detail: Option<String>,
    pub raw_detail: Option<String>,
    pub attempted_at: String,
}

/// Database row for a delivery outcome (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = delivery_outcomes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OutcomeRow {
    pub id: i32,
    pub identity: String,
    pub channel: String,
    pub recipient: Option<String>,
    pub success: bool,
    pub error_detail: Option<String>,
    pub raw_detail: Option<String>,
    pub attempted_at: String,
}
