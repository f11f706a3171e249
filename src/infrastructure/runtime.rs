//! Process lifecycle for `bulletin run`.
//!
//! Spawns the connection manager, the admin server and the record pump, then
//! waits for a shutdown signal or a spent reconnect budget. Shutdown stops
//! the pump first, closes the feed normally, drains in-flight pipelines and
//! finally stops the admin server and the retention sweep.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::signal;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use super::bootstrap;
use crate::adapter::inbound::http::{self, AdminState};
use crate::application::connection::ConnectionHandle;
use crate::application::router::DistributionRouter;
use crate::domain::{ConnectionPhase, ConnectionState};
use crate::error::{ConnectionError, Result};
use crate::infrastructure::config::settings::Config;
use crate::port::AnnouncementStore;

/// Upper bound on waiting for the feed to close during shutdown.
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Period of the stored-history retention sweep.
const RETENTION_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Run until ctrl-c, SIGTERM or a fatal error.
///
/// # Errors
///
/// Returns an error if startup fails, or if the reconnect budget is spent
/// while `exit_on_exhausted` is set.
pub async fn run(config: Config) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut signals = ShutdownSignals::register()?;
    tokio::spawn(async move {
        let received = signals.recv().await;
        info!(signal = received, "Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });
    run_with_shutdown(config, shutdown_rx).await
}

/// Termination signals that start a graceful shutdown: ctrl-c everywhere,
/// plus SIGTERM on unix.
struct ShutdownSignals {
    #[cfg(unix)]
    terminate: signal::unix::Signal,
}

impl ShutdownSignals {
    /// Install the handlers now so a signal sent right after startup is not
    /// missed.
    fn register() -> std::io::Result<Self> {
        Ok(Self {
            #[cfg(unix)]
            terminate: signal::unix::signal(signal::unix::SignalKind::terminate())?,
        })
    }

    /// Wait for the first signal and name it.
    #[cfg(unix)]
    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.terminate.recv() => "SIGTERM",
            Ok(()) = signal::ctrl_c() => "SIGINT",
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> &'static str {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
        "ctrl-c"
    }
}

/// Run with an externally controlled shutdown signal.
///
/// # Errors
///
/// Same as [`run`].
pub async fn run_with_shutdown(config: Config, shutdown: watch::Receiver<bool>) -> Result<()> {
    info!(
        topic = %config.feed.topic,
        channels = ?config.enabled_channels(),
        translation = config.translation.enabled,
        "Starting bulletin"
    );

    let store = bootstrap::build_store(&config)?;
    let router = bootstrap::build_router(&config, Arc::clone(&store))?;
    let (manager, connection, records) = bootstrap::build_feed(&config);

    let manager_task = tokio::spawn(manager.run());
    connection.connect();

    let (retention_stop, retention_stop_rx) = watch::channel(false);
    let retention = config.database.retention().map(|keep| {
        tokio::spawn(retention_sweeps(
            Arc::clone(&store),
            keep,
            RETENTION_SWEEP_INTERVAL,
            retention_stop_rx,
        ))
    });

    let admin = config.admin.enabled.then(|| {
        spawn_admin(
            config.admin.bind_address(),
            AdminState {
                router: Arc::clone(&router),
                connection: connection.clone(),
                store,
                translation_mode: bootstrap::translation_mode(&config),
                started_at: Instant::now(),
            },
        )
    });

    let mut pipelines = JoinSet::new();
    let result = pump(
        &router,
        &connection,
        records,
        &mut pipelines,
        shutdown,
        config.reconnection.exit_on_exhausted,
    )
    .await;

    info!("Stopping feed");
    connection.disconnect();
    let closed = tokio::time::timeout(
        DISCONNECT_TIMEOUT,
        connection.wait_for(|s| s.phase == ConnectionPhase::Idle),
    )
    .await;
    if closed.is_err() {
        warn!("Feed did not close in time");
    }
    connection.shutdown();
    if let Err(e) = manager_task.await {
        error!(error = %e, "Connection manager task failed");
    }

    let in_flight = pipelines.len();
    if in_flight > 0 {
        info!(in_flight, "Waiting for in-flight records");
    }
    while let Some(joined) = pipelines.join_next().await {
        log_pipeline_exit(joined);
    }

    if let Some((stop, task)) = admin {
        let _ = stop.send(());
        if let Err(e) = task.await {
            error!(error = %e, "Admin server task failed");
        }
    }

    if let Some(task) = retention {
        let _ = retention_stop.send(true);
        if let Err(e) = task.await {
            error!(error = %e, "Retention task failed");
        }
    }

    info!(stats = ?router.stats(), "bulletin stopped");
    result
}

/// Forward queued payloads into spawned pipelines until told to stop.
async fn pump(
    router: &Arc<DistributionRouter>,
    connection: &ConnectionHandle,
    mut records: mpsc::UnboundedReceiver<String>,
    pipelines: &mut JoinSet<()>,
    mut shutdown: watch::Receiver<bool>,
    exit_on_exhausted: bool,
) -> Result<()> {
    let mut state = connection.watch();

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return Ok(());
                }
            }
            payload = records.recv() => {
                let Some(payload) = payload else {
                    warn!("Record queue closed");
                    return Ok(());
                };
                let router = Arc::clone(router);
                pipelines.spawn(async move {
                    router.route_raw(&payload).await;
                });
            }
            Some(joined) = pipelines.join_next() => log_pipeline_exit(joined),
            changed = state.changed() => {
                if changed.is_err() {
                    warn!("Connection manager stopped");
                    return Ok(());
                }
                let snapshot = state.borrow_and_update().clone();
                if let Some(err) = exhausted(&snapshot, exit_on_exhausted) {
                    error!(error = %err, "Giving up on the feed");
                    return Err(err.into());
                }
            }
        }
    }
}

/// The fatal error to stop with, if the budget is spent and exiting is on.
fn exhausted(state: &ConnectionState, exit_on_exhausted: bool) -> Option<ConnectionError> {
    (state.exhausted && exit_on_exhausted).then_some(ConnectionError::Exhausted {
        attempts: state.attempt_count,
    })
}

/// Prune history older than `keep` right away and then every `every`.
async fn retention_sweeps(
    store: Arc<dyn AnnouncementStore>,
    keep: chrono::Duration,
    every: Duration,
    mut stop: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    return;
                }
            }
            _ = ticker.tick() => {
                let cutoff = Utc::now() - keep;
                match store.prune_older_than(cutoff).await {
                    Ok(pruned) => info!(
                        announcements = pruned.announcements,
                        outcomes = pruned.outcomes,
                        cutoff = %cutoff,
                        "Pruned stored history"
                    ),
                    Err(e) => warn!(error = %e, "Retention sweep failed"),
                }
            }
        }
    }
}

fn log_pipeline_exit(joined: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        error!(error = %e, "Record pipeline task failed");
    }
}

fn spawn_admin(address: String, state: AdminState) -> (oneshot::Sender<()>, JoinHandle<()>) {
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        let stopped = async move {
            let _ = stop_rx.await;
        };
        if let Err(e) = http::serve(&address, state, stopped).await {
            error!(error = %e, address = %address, "Admin server failed");
        }
    });
    (stop_tx, task)
}
