//! Delivery results reported by channels and the router.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::record::RecordIdentity;

/// Result of one recipient's retry series on a multi-recipient channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientResult {
    pub recipient: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecipientResult {
    #[must_use]
    pub fn ok(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            success: true,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(recipient: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            success: false,
            error: Some(error.into()),
        }
    }
}

/// What a channel returns for one delivery call.
///
/// Single-recipient channels leave `recipients` empty; multi-recipient
/// channels fill it and derive `success` from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recipients: Vec<RecipientResult>,
}

impl ChannelReport {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            recipients: Vec::new(),
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            recipients: Vec::new(),
        }
    }

    /// Aggregate per-recipient results; succeeds if any recipient succeeded.
    #[must_use]
    pub fn from_recipients(recipients: Vec<RecipientResult>) -> Self {
        let success = recipients.iter().any(|r| r.success);
        let error = if success {
            None
        } else if recipients.is_empty() {
            Some("no recipients configured".to_string())
        } else {
            Some(format!("all {} recipients failed", recipients.len()))
        };
        Self {
            success,
            error,
            recipients,
        }
    }

    #[must_use]
    pub fn is_multi_recipient(&self) -> bool {
        !self.recipients.is_empty()
    }

    /// Expand this report into one persisted outcome per recipient.
    #[must_use]
    pub fn outcomes(&self, channel: &str, attempted_at: DateTime<Utc>) -> Vec<DeliveryOutcome> {
        if self.recipients.is_empty() {
            return vec![DeliveryOutcome {
                channel: channel.to_string(),
                recipient: None,
                success: self.success,
                error_detail: self.error.clone(),
                raw_detail: serde_json::to_string(self).ok(),
                attempted_at,
            }];
        }

        self.recipients
            .iter()
            .map(|r| DeliveryOutcome {
                channel: channel.to_string(),
                recipient: Some(r.recipient.clone()),
                success: r.success,
                error_detail: r.error.clone(),
                raw_detail: serde_json::to_string(r).ok(),
                attempted_at,
            })
            .collect()
    }
}

/// Final outcome of one (record, channel, recipient) retry series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryOutcome {
    pub channel: String,
    pub recipient: Option<String>,
    pub success: bool,
    pub error_detail: Option<String>,
    /// Serialized channel result as returned across the channel boundary.
    #[serde(skip)]
    pub raw_detail: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

/// A channel's report tagged with the channel name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelOutcome {
    pub channel: String,
    pub report: ChannelReport,
}

/// Aggregate result for a record that went through fan-out.
#[derive(Debug, Clone, Serialize)]
pub struct RouteReport {
    pub identity: RecordIdentity,
    pub success: bool,
    pub channels: Vec<ChannelOutcome>,
    pub outcomes: Vec<DeliveryOutcome>,
    pub success_count: usize,
    pub total_count: usize,
}

impl RouteReport {
    #[must_use]
    pub fn new(identity: RecordIdentity, channels: Vec<ChannelOutcome>, attempted_at: DateTime<Utc>) -> Self {
        let outcomes = channels
            .iter()
            .flat_map(|c| c.report.outcomes(&c.channel, attempted_at))
            .collect();
        let success_count = channels.iter().filter(|c| c.report.success).count();
        let total_count = channels.len();
        Self {
            identity,
            success: success_count > 0,
            channels,
            outcomes,
            success_count,
            total_count,
        }
    }
}

/// Why a valid, unseen record was not delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    /// Category allow-list is set and the record's category is not on it.
    Category,
    /// Keyword allow-list is set and none of its keywords matched.
    MissingKeyword,
    /// A deny-list keyword matched.
    ExcludedKeyword { keyword: String },
}

/// Result of running one raw payload through the router.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RouteOutcome {
    Delivered(RouteReport),
    Duplicate { identity: RecordIdentity },
    Rejected {
        identity: RecordIdentity,
        #[serde(flatten)]
        reason: RejectReason,
    },
    Invalid { reason: String },
}

impl RouteOutcome {
    /// True when at least one channel accepted the record.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Delivered(report) if report.success)
    }
}
