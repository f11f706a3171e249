//! The connection manager task.
//!
//! One task owns the feed transport and the [`ConnectionState`]. Commands
//! arrive through a [`ConnectionHandle`]; state changes are published on a
//! `watch` channel; data payloads leave through an unbounded queue so the
//! read loop never waits on record processing.
//!
//! Every timer (probe, liveness deadline, lifetime cap, scheduled reconnect)
//! is a local of the loop that owns it, so leaving that loop cancels it.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::backoff::ReconnectPolicy;
use super::signer::Signer;
use crate::domain::{ConnectionPhase, ConnectionState};
use crate::error::ConnectionError;
use crate::infrastructure::config::feed::FeedConfig;
use crate::infrastructure::config::reconnection::ReconnectionConfig;
use crate::port::{FeedEvent, FeedMessage, FeedStream, SignedRequest, NORMAL_CLOSURE};

/// Bound on sending the close frame during teardown.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Timings and policy used by the manager.
#[derive(Debug, Clone)]
pub struct ManagerSettings {
    pub ws_url: String,
    pub topic: String,
    pub connect_timeout: Duration,
    pub probe_interval: Duration,
    pub liveness_timeout: Duration,
    pub lifetime: Duration,
    pub manual_reconnect_delay: Duration,
    pub policy: ReconnectPolicy,
}

impl ManagerSettings {
    #[must_use]
    pub fn from_config(feed: &FeedConfig, reconnection: &ReconnectionConfig) -> Self {
        Self {
            ws_url: feed.ws_url.clone(),
            topic: feed.topic.clone(),
            connect_timeout: feed.connect_timeout(),
            probe_interval: feed.probe_interval(),
            liveness_timeout: feed.liveness_timeout(),
            lifetime: feed.lifetime(),
            manual_reconnect_delay: feed.manual_reconnect_delay(),
            policy: ReconnectPolicy::from_config(reconnection),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Connect,
    Reconnect,
    Disconnect,
    Shutdown,
}

/// Cloneable control surface for a running [`ConnectionManager`].
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionState>,
}

impl ConnectionHandle {
    /// Request a connection. Clears an exhausted reconnect budget.
    pub fn connect(&self) {
        self.send(Command::Connect);
    }

    /// Close any open transport and reopen shortly after with the attempt
    /// counter reset.
    pub fn reconnect(&self) {
        self.send(Command::Reconnect);
    }

    /// Close with the normal-closure code; nothing is rescheduled.
    pub fn disconnect(&self) {
        self.send(Command::Disconnect);
    }

    /// Close and stop the manager task.
    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }

    /// Current state snapshot.
    #[must_use]
    pub fn status(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    /// A receiver that observes every published state.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Wait until the published state satisfies `predicate`.
    ///
    /// Returns the last state if the manager stops first.
    pub async fn wait_for<F>(&self, mut predicate: F) -> ConnectionState
    where
        F: FnMut(&ConnectionState) -> bool,
    {
        let mut rx = self.state.clone();
        loop {
            {
                let state = rx.borrow_and_update();
                if predicate(&state) {
                    return state.clone();
                }
            }
            if rx.changed().await.is_err() {
                return rx.borrow().clone();
            }
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!(?command, "Connection manager already stopped");
        }
    }
}

/// How an open or opening session ended.
#[derive(Debug)]
enum SessionEnd {
    /// Handshake did not complete.
    Failed(ConnectionError),
    /// Abnormal close, transport error or liveness timeout.
    Lost(String),
    /// Lifetime cap or manual reconnect; reopen after the manual delay.
    Cycle,
    /// Deliberate disconnect or server normal closure.
    Disconnected,
    Shutdown,
}

/// Owns the single feed connection.
pub struct ConnectionManager<S: FeedStream> {
    stream: S,
    signer: Signer,
    settings: ManagerSettings,
    state: ConnectionState,
    state_tx: watch::Sender<ConnectionState>,
    commands: mpsc::UnboundedReceiver<Command>,
    records: mpsc::UnboundedSender<String>,
}

impl<S: FeedStream> ConnectionManager<S> {
    /// Build a manager in the Idle phase.
    ///
    /// Returns the manager (to be driven by [`run`](Self::run)), its control
    /// handle, and the receiver of raw record payloads in arrival order.
    pub fn new(
        stream: S,
        signer: Signer,
        settings: ManagerSettings,
    ) -> (Self, ConnectionHandle, mpsc::UnboundedReceiver<String>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (records_tx, records_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::default());

        let manager = Self {
            stream,
            signer,
            settings,
            state: ConnectionState::default(),
            state_tx,
            commands: command_rx,
            records: records_tx,
        };
        let handle = ConnectionHandle {
            commands: command_tx,
            state: state_rx,
        };
        (manager, handle, records_rx)
    }

    /// Drive the connection until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        let mut next_attempt: Option<Instant> = None;

        loop {
            let scheduled = next_attempt;
            let wake = tokio::select! {
                command = self.commands.recv() => Wake::Command(command),
                () = wait_until(scheduled) => Wake::Attempt,
            };

            let command = match wake {
                Wake::Attempt => None,
                Wake::Command(None) | Wake::Command(Some(Command::Shutdown)) => break,
                Wake::Command(Some(command)) => Some(command),
            };

            match command {
                Some(Command::Connect) => {
                    if self.state.exhausted {
                        self.state.exhausted = false;
                        self.state.attempt_count = 0;
                    }
                }
                Some(Command::Reconnect) => {
                    info!("Manual reconnect requested");
                    self.reset_attempts();
                    next_attempt = Some(Instant::now() + self.settings.manual_reconnect_delay);
                    self.publish();
                    continue;
                }
                Some(Command::Disconnect) => {
                    if next_attempt.take().is_some() {
                        info!("Scheduled reconnect cancelled");
                    }
                    continue;
                }
                Some(Command::Shutdown) => break,
                None => {}
            }

            next_attempt = None;
            match self.session().await {
                SessionEnd::Failed(err) => {
                    warn!(error = %err, "Feed connection attempt failed");
                    next_attempt = self.schedule_backoff();
                }
                SessionEnd::Lost(reason) => {
                    warn!(%reason, "Feed connection lost");
                    next_attempt = self.schedule_backoff();
                }
                SessionEnd::Cycle => {
                    self.reset_attempts();
                    self.state.counters.total_reconnections += 1;
                    next_attempt = Some(Instant::now() + self.settings.manual_reconnect_delay);
                }
                SessionEnd::Disconnected => {
                    info!("Feed disconnected; no reconnect scheduled");
                }
                SessionEnd::Shutdown => break,
            }
            self.publish();
        }

        self.set_idle();
        info!("Connection manager stopped");
    }

    fn reset_attempts(&mut self) {
        self.state.attempt_count = 0;
        self.state.exhausted = false;
    }

    /// Schedule the next reconnect, or give up once the budget is spent.
    fn schedule_backoff(&mut self) -> Option<Instant> {
        let policy = self.settings.policy;
        if policy.is_exhausted(self.state.attempt_count) {
            self.state.exhausted = true;
            error!(
                attempts = self.state.attempt_count,
                error = %ConnectionError::Exhausted {
                    attempts: self.state.attempt_count
                },
                "Giving up on feed connection"
            );
            return None;
        }

        let delay = policy.delay(self.state.attempt_count);
        self.state.attempt_count += 1;
        self.state.counters.total_reconnections += 1;
        info!(
            attempt = self.state.attempt_count,
            max_attempts = policy.max_attempts(),
            delay_ms = delay.as_millis() as u64,
            "Reconnect scheduled"
        );
        Some(Instant::now() + delay)
    }

    /// Connect, handshake, then serve until the session ends.
    async fn session(&mut self) -> SessionEnd {
        self.state.phase = ConnectionPhase::Connecting;
        self.publish();

        let request = match self.signer.sign_now(&self.settings.ws_url, &self.settings.topic) {
            Ok(request) => request,
            Err(e) => {
                self.set_idle();
                return SessionEnd::Failed(ConnectionError::Transport(e.to_string()));
            }
        };

        let timeout = self.settings.connect_timeout;
        let handshake = time::timeout(timeout, self.handshake(&request)).await;
        let failure = match handshake {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(_) => Some(ConnectionError::Timeout {
                secs: timeout.as_secs(),
            }),
        };
        if let Some(err) = failure {
            self.teardown().await;
            return SessionEnd::Failed(err);
        }

        let now = Utc::now();
        self.state.phase = ConnectionPhase::Open;
        self.state.opened_at = Some(now);
        self.state.last_probe_ack = Some(now);
        self.state.attempt_count = 0;
        self.state.exhausted = false;
        self.state.counters.total_connections += 1;
        self.publish();
        info!(topic = %self.settings.topic, "Feed connection open");

        self.serve().await
    }

    async fn handshake(&mut self, request: &SignedRequest) -> Result<(), ConnectionError> {
        self.stream
            .connect(request)
            .await
            .map_err(|e| ConnectionError::Transport(e.to_string()))?;
        self.stream
            .subscribe(&self.settings.topic)
            .await
            .map_err(|e| ConnectionError::Transport(e.to_string()))?;

        loop {
            match self.stream.next_event().await {
                Some(FeedEvent::Message(FeedMessage::SubscribeAck { ok: true, .. })) => {
                    return Ok(());
                }
                Some(FeedEvent::Message(FeedMessage::SubscribeAck { ok: false, detail })) => {
                    return Err(ConnectionError::SubscribeRejected {
                        topic: self.settings.topic.clone(),
                        detail,
                    });
                }
                Some(FeedEvent::Message(message @ FeedMessage::Data { .. })) => {
                    // The server may push a record before acknowledging the
                    // subscription. A dropped consumer is handled once open.
                    let _ = self.on_message(message);
                }
                Some(FeedEvent::Malformed { error }) => {
                    self.state.counters.messages_received += 1;
                    self.state.counters.parse_errors += 1;
                    warn!(%error, "Malformed frame during handshake");
                }
                Some(FeedEvent::Closed { code, reason }) => {
                    return Err(ConnectionError::ClosedDuringHandshake(format!(
                        "code {code:?}: {reason}"
                    )));
                }
                Some(FeedEvent::Error(e)) => return Err(ConnectionError::Transport(e)),
                None => {
                    return Err(ConnectionError::ClosedDuringHandshake(
                        "stream ended".to_string(),
                    ))
                }
                Some(other) => debug!(event = ?other, "Ignoring event before subscribe ack"),
            }
        }
    }

    /// The open-phase loop: probes, liveness deadline, lifetime cap,
    /// commands and inbound events.
    async fn serve(&mut self) -> SessionEnd {
        let probe_interval = self.settings.probe_interval;
        let mut probe = time::interval_at(Instant::now() + probe_interval, probe_interval);
        probe.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let liveness = time::sleep(self.settings.liveness_timeout);
        tokio::pin!(liveness);
        let lifetime = time::sleep(self.settings.lifetime);
        tokio::pin!(lifetime);

        loop {
            tokio::select! {
                _ = probe.tick() => {
                    if let Err(e) = self.stream.ping().await {
                        self.teardown().await;
                        return SessionEnd::Lost(format!("probe failed: {e}"));
                    }
                    debug!("Liveness probe sent");
                }
                () = &mut liveness => {
                    warn!(
                        timeout_secs = self.settings.liveness_timeout.as_secs(),
                        "No probe acknowledgment; treating connection as dead"
                    );
                    self.teardown().await;
                    return SessionEnd::Lost("liveness timeout".to_string());
                }
                () = &mut lifetime => {
                    info!("Connection lifetime reached; re-establishing");
                    self.teardown().await;
                    return SessionEnd::Cycle;
                }
                command = self.commands.recv() => match command {
                    None | Some(Command::Shutdown) => {
                        self.teardown().await;
                        return SessionEnd::Shutdown;
                    }
                    Some(Command::Disconnect) => {
                        info!("Disconnect requested");
                        self.teardown().await;
                        return SessionEnd::Disconnected;
                    }
                    Some(Command::Reconnect) => {
                        info!("Manual reconnect requested");
                        self.teardown().await;
                        return SessionEnd::Cycle;
                    }
                    Some(Command::Connect) => debug!("Connect requested while open; ignoring"),
                },
                event = self.stream.next_event() => match event {
                    Some(FeedEvent::Pong) => {
                        self.state.last_probe_ack = Some(Utc::now());
                        liveness
                            .as_mut()
                            .reset(Instant::now() + self.settings.liveness_timeout);
                        self.publish();
                    }
                    Some(FeedEvent::Message(message)) => {
                        if !self.on_message(message) {
                            self.teardown().await;
                            return SessionEnd::Shutdown;
                        }
                    }
                    Some(FeedEvent::Malformed { error }) => {
                        self.state.counters.messages_received += 1;
                        self.state.counters.parse_errors += 1;
                        self.publish();
                        warn!(%error, "Failed to parse feed message");
                    }
                    Some(FeedEvent::Closed { code: Some(NORMAL_CLOSURE), reason }) => {
                        info!(%reason, "Feed closed normally by server");
                        self.teardown().await;
                        return SessionEnd::Disconnected;
                    }
                    Some(FeedEvent::Closed { code, reason }) => {
                        self.teardown().await;
                        return SessionEnd::Lost(format!("closed with code {code:?}: {reason}"));
                    }
                    Some(FeedEvent::Error(e)) => {
                        self.teardown().await;
                        return SessionEnd::Lost(e);
                    }
                    None => {
                        self.teardown().await;
                        return SessionEnd::Lost("stream ended".to_string());
                    }
                },
            }
        }
    }

    /// Handle an application message. Returns false if the record consumer
    /// is gone.
    fn on_message(&mut self, message: FeedMessage) -> bool {
        self.state.counters.messages_received += 1;
        self.state.counters.last_message_at = Some(Utc::now());

        match message {
            FeedMessage::Data { topic, payload } if topic == self.settings.topic => {
                if self.records.send(payload).is_err() {
                    warn!("Record consumer dropped; stopping feed");
                    return false;
                }
                self.state.counters.records_forwarded += 1;
            }
            FeedMessage::Data { topic, .. } => debug!(%topic, "Ignoring data for other topic"),
            FeedMessage::SubscribeAck { ok, detail } => {
                debug!(ok, %detail, "Late subscribe acknowledgment");
            }
            FeedMessage::Unrecognized => debug!("Ignoring unrecognized message"),
        }
        self.publish();
        true
    }

    async fn teardown(&mut self) {
        self.state.phase = ConnectionPhase::Closing;
        self.publish();
        match time::timeout(CLOSE_TIMEOUT, self.stream.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "Error while closing feed transport"),
            Err(_) => debug!("Timed out closing feed transport"),
        }
        self.set_idle();
    }

    fn set_idle(&mut self) {
        self.state.phase = ConnectionPhase::Idle;
        self.state.opened_at = None;
        self.publish();
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }
}

enum Wake {
    Command(Option<Command>),
    Attempt,
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testkit::feed::{FeedProbe, ScriptedFeed};

    const TOPIC: &str = "com_announcement_en";

    fn settings() -> ManagerSettings {
        ManagerSettings {
            ws_url: "wss://feed.test/sapi/wss".to_string(),
            topic: TOPIC.to_string(),
            connect_timeout: Duration::from_secs(15),
            probe_interval: Duration::from_secs(30),
            liveness_timeout: Duration::from_secs(90),
            lifetime: Duration::from_secs(24 * 60 * 60 - 60),
            manual_reconnect_delay: Duration::from_secs(1),
            policy: ReconnectPolicy::new(Duration::from_secs(5), Duration::from_secs(300), 10),
        }
    }

    fn start(
        feed: ScriptedFeed,
        settings: ManagerSettings,
    ) -> (ConnectionHandle, mpsc::UnboundedReceiver<String>, FeedProbe) {
        let probe = feed.probe();
        let signer = Signer::new("key", "secret", 30_000);
        let (manager, handle, records) = ConnectionManager::new(feed, signer, settings);
        tokio::spawn(manager.run());
        (handle, records, probe)
    }

    fn data(topic: &str, payload: &str) -> FeedEvent {
        FeedEvent::Message(FeedMessage::Data {
            topic: topic.to_string(),
            payload: payload.to_string(),
        })
    }

    fn failure() -> crate::error::Result<()> {
        Err(Error::Connection(ConnectionError::Transport("refused".into())))
    }

    // ==================== Open phase ====================

    #[tokio::test(start_paused = true)]
    async fn starts_idle_until_connect() {
        let (handle, _records, probe) = start(ScriptedFeed::new(), settings());

        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(handle.status().phase, ConnectionPhase::Idle);
        assert_eq!(probe.connects(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn forwards_matching_data_in_order() {
        let feed = ScriptedFeed::new().with_session(vec![
            data(TOPIC, "first"),
            data("other_topic", "ignored"),
            FeedEvent::Malformed {
                error: "expected value".into(),
            },
            data(TOPIC, "second"),
        ]);
        let (handle, mut records, probe) = start(feed, settings());

        handle.connect();
        assert_eq!(records.recv().await.as_deref(), Some("first"));
        assert_eq!(records.recv().await.as_deref(), Some("second"));

        let state = handle.wait_for(|s| s.counters.records_forwarded == 2).await;
        assert!(state.is_open());
        assert!(state.opened_at.is_some());
        assert_eq!(state.attempt_count, 0);
        assert_eq!(state.counters.parse_errors, 1);
        assert_eq!(state.counters.total_connections, 1);
        assert_eq!(probe.subscribes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn probes_while_open() {
        let (handle, _records, probe) = start(ScriptedFeed::new(), settings());
        handle.connect();
        handle.wait_for(ConnectionState::is_open).await;

        time::sleep(Duration::from_secs(95)).await;
        assert_eq!(probe.pings(), 3);
        assert!(handle.status().is_open());
        assert!(handle.status().last_probe_ack.is_some());
    }

    // ==================== Liveness and lifetime ====================

    #[tokio::test(start_paused = true)]
    async fn missing_probe_ack_forces_reconnect() {
        let feed = ScriptedFeed::new().without_pongs();
        let (handle, _records, probe) = start(feed, settings());
        handle.connect();
        handle.wait_for(ConnectionState::is_open).await;

        time::sleep(Duration::from_secs(89)).await;
        assert_eq!(probe.connects(), 1);

        // 90s liveness deadline, then a 5s backoff.
        time::sleep(Duration::from_secs(7)).await;
        assert_eq!(probe.connects(), 2);
        assert!(probe.closes() >= 1);
        let state = handle.status();
        assert!(state.is_open());
        assert_eq!(state.attempt_count, 0);
        assert_eq!(state.counters.total_reconnections, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn lifetime_cap_cycles_connection() {
        let mut settings = settings();
        settings.lifetime = Duration::from_secs(100);
        let (handle, _records, probe) = start(ScriptedFeed::new(), settings);
        handle.connect();
        handle.wait_for(ConnectionState::is_open).await;

        time::sleep(Duration::from_secs(100) + Duration::from_millis(500)).await;
        assert_eq!(probe.closes(), 1);
        assert_eq!(probe.connects(), 1);

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(probe.connects(), 2);
        let state = handle.status();
        assert!(state.is_open());
        assert_eq!(state.attempt_count, 0);
    }

    // ==================== Reconnection policy ====================

    #[tokio::test(start_paused = true)]
    async fn failed_attempts_back_off_exponentially() {
        let feed =
            ScriptedFeed::new().with_connect_results(vec![failure(), failure(), failure(), Ok(())]);
        let (handle, _records, probe) = start(feed, settings());
        handle.connect();

        // Attempts at 0s, 5s, 15s, 35s.
        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(probe.connects(), 1);
        assert_eq!(handle.status().attempt_count, 1);
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(probe.connects(), 2);
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(probe.connects(), 3);
        assert_eq!(handle.status().attempt_count, 3);
        time::sleep(Duration::from_secs(18)).await;
        assert_eq!(probe.connects(), 3);
        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(probe.connects(), 4);

        let state = handle.status();
        assert!(state.is_open());
        assert_eq!(state.attempt_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_budget_stops_until_manual_reconnect() {
        let mut settings = settings();
        settings.policy = ReconnectPolicy::new(Duration::from_secs(5), Duration::from_secs(300), 2);
        let feed =
            ScriptedFeed::new().with_connect_results(vec![failure(), failure(), failure(), Ok(())]);
        let (handle, _records, probe) = start(feed, settings);
        handle.connect();

        let state = handle.wait_for(|s| s.exhausted).await;
        assert_eq!(state.phase, ConnectionPhase::Idle);
        assert_eq!(probe.connects(), 3);

        time::sleep(Duration::from_secs(600)).await;
        assert_eq!(probe.connects(), 3);

        handle.reconnect();
        let state = handle.wait_for(ConnectionState::is_open).await;
        assert!(!state.exhausted);
        assert_eq!(state.attempt_count, 0);
        assert_eq!(probe.connects(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_subscription_schedules_reconnect() {
        let feed = ScriptedFeed::new().with_acks(vec![Some(FeedEvent::Message(
            FeedMessage::SubscribeAck {
                ok: false,
                detail: "INVALID_TOPIC".into(),
            },
        ))]);
        let (handle, _records, probe) = start(feed, settings());
        handle.connect();

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(handle.status().attempt_count, 1);
        assert_eq!(probe.closes(), 1);
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(probe.connects(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn data_ahead_of_ack_is_forwarded() {
        let feed = ScriptedFeed::new().with_acks(vec![None]).with_session(vec![
            data(TOPIC, "early"),
            data("other_topic", "ignored"),
            FeedEvent::Message(FeedMessage::SubscribeAck {
                ok: true,
                detail: "SUCCESS".into(),
            }),
            data(TOPIC, "late"),
        ]);
        let (handle, mut records, _probe) = start(feed, settings());

        handle.connect();
        assert_eq!(records.recv().await.as_deref(), Some("early"));
        assert_eq!(records.recv().await.as_deref(), Some("late"));

        let state = handle.wait_for(|s| s.counters.records_forwarded == 2).await;
        assert!(state.is_open());
        assert_eq!(state.counters.messages_received, 3);
        assert_eq!(state.counters.total_connections, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_ack_times_out_handshake() {
        let feed = ScriptedFeed::new().with_acks(vec![None]);
        let (handle, _records, probe) = start(feed, settings());
        handle.connect();

        time::sleep(Duration::from_secs(14)).await;
        assert_eq!(handle.status().phase, ConnectionPhase::Connecting);

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(handle.status().phase, ConnectionPhase::Idle);
        assert_eq!(handle.status().attempt_count, 1);

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(probe.connects(), 2);
        assert!(handle.status().is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn abnormal_close_reconnects() {
        let feed = ScriptedFeed::new().with_session(vec![FeedEvent::Closed {
            code: Some(1006),
            reason: "abnormal".into(),
        }]);
        let (handle, _records, probe) = start(feed, settings());
        handle.connect();

        time::sleep(Duration::from_secs(6)).await;
        assert_eq!(probe.connects(), 2);
        assert!(handle.status().is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn each_attempt_is_freshly_signed() {
        let feed = ScriptedFeed::new().with_connect_results(vec![failure(), Ok(())]);
        let (handle, _records, probe) = start(feed, settings());
        handle.connect();
        handle.wait_for(ConnectionState::is_open).await;

        let requests = probe.requests();
        assert_eq!(requests.len(), 2);
        assert_ne!(requests[0].url, requests[1].url);
        assert!(requests[0].url.starts_with("wss://feed.test/sapi/wss?timestamp="));
        assert!(requests[0].url.contains("&topic=com_announcement_en&signature="));
        assert_eq!(requests[0].api_key, "key");
    }

    // ==================== Deliberate close ====================

    #[tokio::test(start_paused = true)]
    async fn server_normal_close_is_terminal() {
        let feed = ScriptedFeed::new().with_session(vec![FeedEvent::Closed {
            code: Some(NORMAL_CLOSURE),
            reason: "bye".into(),
        }]);
        let (handle, _records, probe) = start(feed, settings());
        handle.connect();

        time::sleep(Duration::from_secs(3_600)).await;
        assert_eq!(probe.connects(), 1);
        assert_eq!(handle.status().phase, ConnectionPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_cancels_timers() {
        let mut settings = settings();
        settings.lifetime = Duration::from_secs(100);
        let (handle, _records, probe) = start(ScriptedFeed::new(), settings);
        handle.connect();
        handle.wait_for(ConnectionState::is_open).await;

        handle.disconnect();
        handle
            .wait_for(|s| s.phase == ConnectionPhase::Idle)
            .await;
        let pings = probe.pings();

        time::sleep(Duration::from_secs(500)).await;
        assert_eq!(probe.connects(), 1);
        assert_eq!(probe.closes(), 1);
        assert_eq!(probe.pings(), pings);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_cancels_scheduled_reconnect() {
        let feed = ScriptedFeed::new().with_connect_results(vec![failure()]);
        let (handle, _records, probe) = start(feed, settings());
        handle.connect();
        handle.wait_for(|s| s.attempt_count == 1).await;

        handle.disconnect();
        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(probe.connects(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_reconnect_resets_attempts() {
        let (handle, _records, probe) = start(ScriptedFeed::new(), settings());
        handle.connect();
        handle.wait_for(ConnectionState::is_open).await;

        handle.reconnect();
        handle
            .wait_for(|s| s.phase == ConnectionPhase::Idle)
            .await;
        assert_eq!(probe.closes(), 1);

        let state = handle
            .wait_for(|s| s.is_open() && s.counters.total_connections == 2)
            .await;
        assert_eq!(state.attempt_count, 0);
        assert_eq!(probe.connects(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_closes_and_stops() {
        let (handle, _records, probe) = start(ScriptedFeed::new(), settings());
        handle.connect();
        handle.wait_for(ConnectionState::is_open).await;

        handle.shutdown();
        let state = handle
            .wait_for(|s| s.phase == ConnectionPhase::Idle)
            .await;
        assert!(!state.is_open());
        assert_eq!(probe.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_consumer_stops_feed() {
        let feed = ScriptedFeed::new().with_session(vec![data(TOPIC, "orphan")]);
        let (handle, records, probe) = start(feed, settings());
        drop(records);
        handle.connect();

        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(handle.status().phase, ConnectionPhase::Idle);
        assert_eq!(probe.connects(), 1);
    }
}
