//! Admin route handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::domain::{EnricherStats, Record, RouteOutcome};
use crate::error::Error;

use super::{AdminState, MAX_PAGE_SIZE};

type Shared = State<Arc<AdminState>>;

const DEFAULT_PAGE_SIZE: u32 = 20;

/// Error body `{"success": false, "error": ...}` with status 500.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "Admin request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "error": self.0.to_string() })),
        )
            .into_response()
    }
}

pub async fn health(State(state): Shared) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "uptime_ms": state.started_at.elapsed().as_millis() as u64,
        "websocket_connected": state.connection.status().is_open(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub async fn status(State(state): Shared) -> Json<Value> {
    let connection = state.connection.status();
    let translation = state
        .router
        .enricher()
        .map_or_else(EnricherStats::default, |e| e.stats());

    Json(json!({
        "system": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_ms": state.started_at.elapsed().as_millis() as u64,
        "websocket_connected": connection.is_open(),
        "connection": {
            "uptime_ms": connection.uptime_ms(Utc::now()),
            "state": connection,
        },
        "router": state.router.stats(),
        "channels": state.router.channel_names(),
        "translation": {
            "mode": format!("{:?}", state.translation_mode).to_lowercase(),
            "success_rate": translation.success_rate(),
            "stats": translation,
        },
    }))
}

pub async fn stats(State(state): Shared) -> Json<Value> {
    Json(json!(state.router.stats()))
}

pub async fn send_test(State(state): Shared) -> (StatusCode, Json<Value>) {
    info!("Routing test record from admin surface");
    let outcome = state.router.route_record(Record::test_record()).await;
    let status = match &outcome {
        RouteOutcome::Delivered(_) => StatusCode::OK,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (
        status,
        Json(json!({ "success": outcome.is_success(), "outcome": outcome })),
    )
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    page: Option<u32>,
    limit: Option<u32>,
}

impl PageQuery {
    /// 1-based page and a limit clamped to `1..=MAX_PAGE_SIZE`.
    fn resolve(&self) -> (u32, u32) {
        let page = self.page.filter(|p| *p > 0).unwrap_or(1);
        let limit = self
            .limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);
        (page, limit)
    }
}

pub async fn announcements(
    State(state): Shared,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, ApiError> {
    let (page, limit) = query.resolve();
    let offset = (page - 1).saturating_mul(limit);
    let result = state.store.recent(limit, offset).await?;
    let total_pages = result.total.div_ceil(u64::from(limit));

    Ok(Json(json!({
        "success": true,
        "data": {
            "announcements": result.items,
            "pagination": {
                "page": page,
                "limit": limit,
                "total": result.total,
                "total_pages": total_pages,
            },
        },
    })))
}

pub async fn announcement_stats(State(state): Shared) -> Result<Json<Value>, ApiError> {
    let summary = state.store.summary().await?;
    Ok(Json(json!({ "success": true, "data": summary })))
}

pub async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not Found" })))
}

#[cfg(test)]
mod tests {
    use super::super::routes;
    use super::*;
    use crate::adapter::outbound::memory::MemoryStore;
    use crate::application::connection::{ConnectionManager, ManagerSettings, Signer};
    use crate::application::router::{DistributionRouter, RecordFilter};
    use crate::infrastructure::config::feed::FeedConfig;
    use crate::infrastructure::config::filter::FilterConfig;
    use crate::infrastructure::config::reconnection::ReconnectionConfig;
    use crate::infrastructure::config::translation::TranslationMode;
    use crate::port::{AnnouncementStore, Channel};
    use crate::testkit::channel::ScriptedChannel;
    use crate::testkit::domain::RecordBuilder;
    use crate::testkit::feed::ScriptedFeed;
    use crate::testkit::http;
    use std::time::Instant;

    async fn server(store: Arc<MemoryStore>) -> String {
        let channel: Arc<dyn Channel> = Arc::new(ScriptedChannel::new("telegram"));
        let router = Arc::new(DistributionRouter::new(
            RecordFilter::new(&FilterConfig::default()),
            vec![channel],
            None,
            store.clone(),
        ));
        let settings =
            ManagerSettings::from_config(&FeedConfig::default(), &ReconnectionConfig::default());
        let (_manager, connection, _records) =
            ConnectionManager::new(ScriptedFeed::new(), Signer::new("k", "s", 30_000), settings);

        let state = AdminState {
            router,
            connection,
            store,
            translation_mode: TranslationMode::Both,
            started_at: Instant::now(),
        };
        http::serve(routes(state)).await
    }

    async fn get(url: String) -> (u16, Value) {
        let response = reqwest::get(url).await.unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    #[test]
    fn page_query_clamps_limit() {
        let query = PageQuery {
            page: Some(0),
            limit: Some(500),
        };
        assert_eq!(query.resolve(), (1, MAX_PAGE_SIZE));

        let query = PageQuery {
            page: None,
            limit: None,
        };
        assert_eq!(query.resolve(), (1, DEFAULT_PAGE_SIZE));
    }

    #[tokio::test]
    async fn health_reports_disconnected_feed() {
        let base = server(Arc::new(MemoryStore::new())).await;

        let (status, body) = get(format!("{base}/health")).await;

        assert_eq!(status, 200);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["websocket_connected"], false);
    }

    #[tokio::test]
    async fn status_includes_connection_router_and_translation() {
        let base = server(Arc::new(MemoryStore::new())).await;

        let (_, body) = get(format!("{base}/status")).await;

        assert_eq!(body["connection"]["state"]["phase"], "idle");
        assert_eq!(body["router"]["received"], 0);
        assert_eq!(body["channels"][0], "telegram");
        assert_eq!(body["translation"]["stats"]["enabled"], false);
        assert_eq!(body["translation"]["mode"], "both");
    }

    #[tokio::test]
    async fn test_trigger_routes_and_persists_record() {
        let store = Arc::new(MemoryStore::new());
        let base = server(store.clone()).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/test"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["outcome"]["status"], "delivered");

        let (_, stats) = get(format!("{base}/stats")).await;
        assert_eq!(stats["processed"], 1);
        assert_eq!(store.summary().await.unwrap().total_announcements, 1);
    }

    #[tokio::test]
    async fn announcements_are_paginated() {
        let store = Arc::new(MemoryStore::new());
        for i in 0..3 {
            let record = RecordBuilder::listing().publish_date(1_700_000_000_000 + i).build();
            store.upsert_record(&record.identity(), &record).await.unwrap();
        }
        let base = server(store).await;

        let (status, body) = get(format!("{base}/announcements?page=2&limit=2")).await;

        assert_eq!(status, 200);
        assert_eq!(body["data"]["announcements"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"]["pagination"]["total"], 3);
        assert_eq!(body["data"]["pagination"]["total_pages"], 2);

        let (_, summary) = get(format!("{base}/announcements/stats")).await;
        assert_eq!(summary["data"]["total_announcements"], 3);
    }

    #[tokio::test]
    async fn unknown_path_is_json_404() {
        let base = server(Arc::new(MemoryStore::new())).await;
        let (status, body) = get(format!("{base}/dashboard")).await;
        assert_eq!(status, 404);
        assert_eq!(body["error"], "Not Found");
    }
}
