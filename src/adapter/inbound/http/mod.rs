//! Administration HTTP surface.
//!
//! Read-only health, status and statistics plus a manual test trigger.

mod handlers;

use std::sync::Arc;
use std::time::Instant;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::application::connection::ConnectionHandle;
use crate::application::router::DistributionRouter;
use crate::error::Result;
use crate::infrastructure::config::translation::TranslationMode;
use crate::port::AnnouncementStore;

/// Largest page size served by `/announcements`.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AdminState {
    pub router: Arc<DistributionRouter>,
    pub connection: ConnectionHandle,
    pub store: Arc<dyn AnnouncementStore>,
    pub translation_mode: TranslationMode,
    pub started_at: Instant,
}

/// Build the admin routes.
pub fn routes(state: AdminState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status))
        .route("/stats", get(handlers::stats))
        .route("/test", post(handlers::send_test))
        .route("/announcements", get(handlers::announcements))
        .route("/announcements/stats", get(handlers::announcement_stats))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Serve the admin surface until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn serve<F>(address: &str, state: AdminState, shutdown: F) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(address).await?;
    info!(address = %listener.local_addr()?, "Admin server listening");

    axum::serve(listener, routes(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Admin server stopped");
    Ok(())
}
