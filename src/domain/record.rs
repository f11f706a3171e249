//! Announcement records and their deduplication identity.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

/// A single announcement received from the feed.
///
/// Immutable once received. The translation step produces a new value with
/// the `translated_*` fields filled in rather than mutating the original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Category code assigned by the exchange.
    #[serde(default, deserialize_with = "null_as_default")]
    pub catalog_id: i64,
    /// Human-readable category name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub catalog_name: String,
    /// Announcement title. Records with a short or empty title are rejected.
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Announcement body, possibly large.
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disclaimer: Option<String>,
    /// Publication instant in epoch milliseconds.
    #[serde(default, deserialize_with = "null_as_default")]
    pub publish_date: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_body: Option<String>,
}

impl Record {
    /// Decode a record from the JSON payload carried by a data message.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not a JSON object of the expected shape.
    pub fn from_payload(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }

    /// Derive the deduplication identity for this record.
    #[must_use]
    pub fn identity(&self) -> RecordIdentity {
        RecordIdentity::of(self)
    }

    /// Publication instant, if the millisecond timestamp is representable.
    #[must_use]
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.publish_date).single()
    }

    /// True when the translation step attached any translated content.
    #[must_use]
    pub fn has_translation(&self) -> bool {
        self.translated_title.is_some() || self.translated_body.is_some()
    }

    /// Lowercased `title + " " + body`, the haystack for keyword filters.
    #[must_use]
    pub fn search_text(&self) -> String {
        format!("{} {}", self.title, self.body).to_lowercase()
    }

    /// Synthetic record used by the `/test` endpoint and channel checks.
    #[must_use]
    pub fn test_record() -> Self {
        Self {
            catalog_id: 161,
            catalog_name: "Test".to_string(),
            title: "System test notification".to_string(),
            body: "This is a test message used to verify that delivery channels work."
                .to_string(),
            disclaimer: None,
            publish_date: Utc::now().timestamp_millis(),
            translated_title: None,
            translated_body: None,
        }
    }
}

/// The feed sends explicit `null` for absent fields; treat it like a
/// missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deterministic digest of `(catalog_id, title, publish_date)`.
///
/// This is the only deduplication key: edits to the body of an already seen
/// announcement do not produce a new identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordIdentity(String);

impl RecordIdentity {
    /// Length of the hex-encoded digest.
    pub const LEN: usize = 64;

    /// Compute the identity of a record.
    #[must_use]
    pub fn of(record: &Record) -> Self {
        let content = format!(
            "{}-{}-{}",
            record.catalog_id, record.title, record.publish_date
        );
        let digest = Sha256::digest(content.as_bytes());
        Self(hex::encode(digest))
    }

    /// Wrap an identity previously read back from storage.
    #[must_use]
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
