//! airwatch-api library
//!
//! HTTP surface around the advisory engine: classify/recommend, alert
//! evaluation, subscription CRUD, readings ingest, heatmap and forecast.

use airwatch_engine::SubscriptionRegistry;
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod db;
pub mod error;
pub mod history;
pub mod monitor;
pub mod sink;

pub use crate::error::{ApiError, ApiResult};
use crate::history::AlertHistory;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Readings store
    pub db: SqlitePool,
    /// Subscription registry
    pub registry: Arc<dyn SubscriptionRegistry>,
    /// Alert history shared with the monitor
    pub history: AlertHistory,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        registry: Arc<dyn SubscriptionRegistry>,
        history: AlertHistory,
    ) -> Self {
        Self {
            db,
            registry,
            history,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::advisory_routes())
        .merge(api::alert_routes())
        .merge(api::subscription_routes())
        .merge(api::reading_routes())
        .merge(api::dashboard_routes())
        .merge(api::health_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
