//! Scripted [`FeedStream`] for driving the connection manager in tests.
//!
//! Each successful `connect()` loads the next scripted session. `subscribe()`
//! queues the next scripted acknowledgment (a successful one by default) at
//! the front of the session. `ping()` queues a `Pong` unless pongs are
//! disabled. When a session runs dry, `next_event()` pends forever, which
//! looks like a silent but open connection.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::Result;
use crate::port::{FeedEvent, FeedMessage, FeedStream, SignedRequest};

/// A mock feed with scripted connect results, acknowledgments and sessions.
pub struct ScriptedFeed {
    connect_results: VecDeque<Result<()>>,
    acks: VecDeque<Option<FeedEvent>>,
    sessions: VecDeque<Vec<FeedEvent>>,
    current: VecDeque<FeedEvent>,
    auto_pong: bool,
    probe: FeedProbe,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self {
            connect_results: VecDeque::new(),
            acks: VecDeque::new(),
            sessions: VecDeque::new(),
            current: VecDeque::new(),
            auto_pong: true,
            probe: FeedProbe::default(),
        }
    }

    /// Results popped by successive `connect()` calls; `Ok(())` once exhausted.
    pub fn with_connect_results(mut self, results: Vec<Result<()>>) -> Self {
        self.connect_results = results.into();
        self
    }

    /// Acknowledgments queued by successive `subscribe()` calls. `None`
    /// withholds the acknowledgment entirely.
    pub fn with_acks(mut self, acks: Vec<Option<FeedEvent>>) -> Self {
        self.acks = acks.into();
        self
    }

    /// Append a session: the events delivered after one successful handshake.
    pub fn with_session(mut self, events: Vec<FeedEvent>) -> Self {
        self.sessions.push_back(events);
        self
    }

    /// Stop answering pings.
    pub fn without_pongs(mut self) -> Self {
        self.auto_pong = false;
        self
    }

    /// Shared counters that stay readable after the feed is moved.
    pub fn probe(&self) -> FeedProbe {
        self.probe.clone()
    }
}

impl Default for ScriptedFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedStream for ScriptedFeed {
    async fn connect(&mut self, request: &SignedRequest) -> Result<()> {
        self.probe.connects.fetch_add(1, Ordering::SeqCst);
        self.probe.requests.lock().push(request.clone());
        let result = self.connect_results.pop_front().unwrap_or(Ok(()));
        if result.is_ok() {
            self.current = self.sessions.pop_front().unwrap_or_default().into();
        }
        result
    }

    async fn subscribe(&mut self, _topic: &str) -> Result<()> {
        self.probe.subscribes.fetch_add(1, Ordering::SeqCst);
        let ack = self.acks.pop_front().unwrap_or_else(|| {
            Some(FeedEvent::Message(FeedMessage::SubscribeAck {
                ok: true,
                detail: "SUCCESS".to_string(),
            }))
        });
        if let Some(ack) = ack {
            self.current.push_front(ack);
        }
        Ok(())
    }

    async fn ping(&mut self) -> Result<()> {
        self.probe.pings.fetch_add(1, Ordering::SeqCst);
        if self.auto_pong {
            self.current.push_back(FeedEvent::Pong);
        }
        Ok(())
    }

    async fn next_event(&mut self) -> Option<FeedEvent> {
        match self.current.pop_front() {
            Some(event) => Some(event),
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
        self.current.clear();
        Ok(())
    }
}

/// Call counters and captured requests of a [`ScriptedFeed`].
#[derive(Debug, Clone, Default)]
pub struct FeedProbe {
    connects: Arc<AtomicU32>,
    subscribes: Arc<AtomicU32>,
    pings: Arc<AtomicU32>,
    closes: Arc<AtomicU32>,
    requests: Arc<Mutex<Vec<SignedRequest>>>,
}

impl FeedProbe {
    pub fn connects(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn subscribes(&self) -> u32 {
        self.subscribes.load(Ordering::SeqCst)
    }

    pub fn pings(&self) -> u32 {
        self.pings.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> u32 {
        self.closes.load(Ordering::SeqCst)
    }

    /// Every signed request passed to `connect()`, in order.
    pub fn requests(&self) -> Vec<SignedRequest> {
        self.requests.lock().clone()
    }
}
