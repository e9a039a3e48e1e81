//! Reading ingest and lookup

use crate::api::aqi_from_json;
use crate::db::readings::{
    history_for_location, insert_reading, latest_for_location, latest_per_location,
};
use crate::db::storable_now;
use crate::{ApiError, ApiResult, AppState};
use airwatch_engine::subscription::validate_location;
use airwatch_engine::AqiReading;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub location: String,
    #[serde(default)]
    pub aqi: Value,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ReadingResponse {
    pub location: String,
    pub aqi: u32,
    pub category: String,
    pub color: String,
    pub timestamp: DateTime<Utc>,
}

impl From<AqiReading> for ReadingResponse {
    fn from(reading: AqiReading) -> Self {
        let band = reading.band();
        Self {
            category: band.label().to_string(),
            color: band.color().to_string(),
            aqi: reading.value,
            location: reading.location,
            timestamp: reading.timestamp,
        }
    }
}

/// POST /api/readings
///
/// Stores one observation. A missing timestamp means "now".
pub async fn ingest_reading(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> ApiResult<(StatusCode, Json<ReadingResponse>)> {
    let location = validate_location(&request.location)?;
    let value = aqi_from_json(&request.aqi)?;
    let timestamp = request
        .timestamp
        .map(|t| t.trunc_subsecs(6))
        .unwrap_or_else(storable_now);

    let reading = AqiReading {
        value,
        location,
        timestamp,
    };
    insert_reading(&state.db, &reading).await?;
    debug!("Stored reading {} for {}", reading.value, reading.location);

    Ok((StatusCode::CREATED, Json(reading.into())))
}

/// GET /api/readings/:location
pub async fn latest_reading(
    State(state): State<AppState>,
    Path(location): Path<String>,
) -> ApiResult<Json<ReadingResponse>> {
    let reading = latest_for_location(&state.db, &location)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No readings for location: {}", location)))?;
    Ok(Json(reading.into()))
}

/// GET /api/readings/:location/history
///
/// Full series for the history chart, oldest first. 404 if the location has
/// no readings.
pub async fn reading_history(
    State(state): State<AppState>,
    Path(location): Path<String>,
) -> ApiResult<Json<Vec<ReadingResponse>>> {
    let history = history_for_location(&state.db, &location).await?;
    if history.is_empty() {
        return Err(ApiError::NotFound(format!(
            "No readings for location: {}",
            location
        )));
    }
    Ok(Json(history.into_iter().map(ReadingResponse::from).collect()))
}

#[derive(Debug, Serialize)]
pub struct CitiesResponse {
    pub cities: Vec<String>,
}

/// GET /api/cities
///
/// Locations with at least one reading, sorted case-insensitively.
pub async fn list_cities(State(state): State<AppState>) -> ApiResult<Json<CitiesResponse>> {
    let cities = latest_per_location(&state.db)
        .await?
        .into_iter()
        .map(|reading| reading.location)
        .collect();
    Ok(Json(CitiesResponse { cities }))
}

pub fn reading_routes() -> Router<AppState> {
    Router::new()
        .route("/api/readings", post(ingest_reading))
        .route("/api/readings/:location", get(latest_reading))
        .route("/api/readings/:location/history", get(reading_history))
        .route("/api/cities", get(list_cities))
}
