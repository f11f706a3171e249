//! Feed connection state as published by the connection manager.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle phase of the single feed connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPhase {
    #[default]
    Idle,
    Connecting,
    Open,
    Closing,
}

/// Monotonic connection counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionCounters {
    pub total_connections: u64,
    pub total_reconnections: u64,
    pub messages_received: u64,
    pub records_forwarded: u64,
    pub parse_errors: u64,
    pub last_message_at: Option<DateTime<Utc>>,
}

/// Snapshot of the connection manager's state.
///
/// Only the connection manager writes this; everyone else reads copies.
/// `phase == Open` implies `opened_at` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionState {
    pub phase: ConnectionPhase,
    /// Consecutive reconnect attempts; reset to 0 on a successful open.
    pub attempt_count: u32,
    pub last_probe_ack: Option<DateTime<Utc>>,
    pub opened_at: Option<DateTime<Utc>>,
    /// Set once the reconnect budget is spent; cleared by a manual connect.
    pub exhausted: bool,
    pub counters: ConnectionCounters,
}

impl ConnectionState {
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.phase == ConnectionPhase::Open
    }

    /// Milliseconds since the current connection opened, or 0 when not open.
    #[must_use]
    pub fn uptime_ms(&self, now: DateTime<Utc>) -> i64 {
        match (self.phase, self.opened_at) {
            (ConnectionPhase::Open, Some(opened)) => (now - opened).num_milliseconds().max(0),
            _ => 0,
        }
    }
}
