//! Composition root: turns a validated [`Config`] into wired components.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::adapter::outbound::binance::WsFeedStream;
use crate::adapter::outbound::llm;
use crate::adapter::outbound::memory::MemoryStore;
use crate::adapter::outbound::notifier::showdoc::ShowDocChannel;
#[cfg(feature = "telegram")]
use crate::adapter::outbound::notifier::telegram::TelegramChannel;
use crate::adapter::outbound::sqlite::database::connection;
use crate::adapter::outbound::sqlite::SqliteAnnouncementStore;
use crate::adapter::outbound::translation::TranslationEnricher;
use crate::application::connection::{
    ConnectionHandle, ConnectionManager, ManagerSettings, Signer,
};
use crate::application::router::{DistributionRouter, RecordFilter};
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::config::translation::TranslationMode;
use crate::port::{AnnouncementStore, Channel, Enricher};

/// Manager, control handle and record queue for the live feed.
pub type FeedParts = (
    ConnectionManager<WsFeedStream>,
    ConnectionHandle,
    mpsc::UnboundedReceiver<String>,
);

/// Layout the channels render with. Without an enricher there is never a
/// translation, so the original layout is forced.
#[must_use]
pub fn translation_mode(config: &Config) -> TranslationMode {
    if config.translation.enabled {
        config.translation.mode
    } else {
        TranslationMode::Original
    }
}

/// Open the configured store: SQLite (with migrations) or in-memory.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or migrated.
#[allow(clippy::result_large_err)]
pub fn build_store(config: &Config) -> Result<Arc<dyn AnnouncementStore>> {
    if !config.database.enabled {
        warn!("Database disabled; deduplication will not survive restarts");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let pool = connection::open(&config.database)?;
    info!(path = %config.database.path, "Database initialized");
    Ok(Arc::new(SqliteAnnouncementStore::new(pool)))
}

/// Build every enabled delivery channel.
///
/// # Errors
///
/// Returns an error if an enabled channel cannot be constructed.
#[allow(clippy::result_large_err)]
pub fn build_channels(config: &Config) -> Result<Vec<Arc<dyn Channel>>> {
    let mode = translation_mode(config);
    let mut channels: Vec<Arc<dyn Channel>> = Vec::new();

    if config.telegram.enabled {
        #[cfg(feature = "telegram")]
        channels.push(Arc::new(TelegramChannel::new(&config.telegram, mode)?));
        #[cfg(not(feature = "telegram"))]
        warn!("Telegram enabled in config but the binary was built without the telegram feature");
    }

    if config.showdoc.enabled {
        let showdoc = ShowDocChannel::new(&config.showdoc, mode)?;
        info!(recipients = ?showdoc.recipients(), "ShowDoc channel configured");
        channels.push(Arc::new(showdoc));
    }

    if channels.is_empty() {
        warn!("No delivery channels enabled");
    }
    Ok(channels)
}

/// Build the translation enricher when translation is enabled.
///
/// # Errors
///
/// Returns an error if the provider settings are unusable.
#[allow(clippy::result_large_err)]
pub fn build_enricher(config: &Config) -> Result<Option<Arc<dyn Enricher>>> {
    if !config.translation.enabled {
        return Ok(None);
    }

    let llm = llm::from_config(&config.translation)?;
    info!(
        provider = llm.name(),
        model = %config.translation.model,
        mode = ?config.translation.mode,
        "Translation enabled"
    );
    Ok(Some(Arc::new(TranslationEnricher::new(
        llm,
        &config.translation,
    ))))
}

/// Build the distribution router over the given store.
///
/// # Errors
///
/// Returns an error if a channel or the enricher cannot be constructed.
#[allow(clippy::result_large_err)]
pub fn build_router(
    config: &Config,
    store: Arc<dyn AnnouncementStore>,
) -> Result<Arc<DistributionRouter>> {
    let router = DistributionRouter::new(
        RecordFilter::new(&config.filters),
        build_channels(config)?,
        build_enricher(config)?,
        store,
    );
    info!(channels = ?router.channel_names(), "Router initialized");
    Ok(Arc::new(router))
}

/// Signer for the configured credentials.
#[must_use]
pub fn build_signer(config: &Config) -> Signer {
    Signer::new(
        config.feed.api_key.clone(),
        config.feed.api_secret.clone(),
        config.feed.recv_window_ms,
    )
}

/// Build the connection manager over the live websocket transport.
#[must_use]
pub fn build_feed(config: &Config) -> FeedParts {
    ConnectionManager::new(
        WsFeedStream::new(),
        build_signer(config),
        ManagerSettings::from_config(&config.feed, &config.reconnection),
    )
}
