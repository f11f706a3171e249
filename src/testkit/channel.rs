//! Scripted [`Channel`] for router tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{ChannelReport, Record};
use crate::port::Channel;

/// A channel that replays scripted reports and records what it was sent.
///
/// Queued reports are used first; afterwards every call returns the
/// fallback report (success unless [`always`](Self::always) is set).
pub struct ScriptedChannel {
    name: String,
    queued: Mutex<VecDeque<ChannelReport>>,
    fallback: ChannelReport,
    calls: AtomicU32,
    records: Mutex<Vec<Record>>,
}

impl ScriptedChannel {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            queued: Mutex::new(VecDeque::new()),
            fallback: ChannelReport::ok(),
            calls: AtomicU32::new(0),
            records: Mutex::new(Vec::new()),
        }
    }

    /// Return `report` for every call once the queue is empty.
    pub fn always(mut self, report: ChannelReport) -> Self {
        self.fallback = report;
        self
    }

    pub fn with_reports(self, reports: Vec<ChannelReport>) -> Self {
        *self.queued.lock() = reports.into();
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Records received, in call order.
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().clone()
    }
}

#[async_trait]
impl Channel for ScriptedChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, record: &Record) -> ChannelReport {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.records.lock().push(record.clone());
        let queued = self.queued.lock().pop_front();
        queued.unwrap_or_else(|| self.fallback.clone())
    }
}
