//! Dashboard data: heatmap markers, statistics and forecasts

use crate::db::readings::{latest_per_location, recent_for_location};
use crate::{ApiError, ApiResult, AppState};
use airwatch_engine::forecast::{project, ForecastPoint, DEFAULT_FORECAST_DAYS, FORECAST_WINDOW};
use airwatch_engine::heatmap::{heatmap_points, statistics, AqiStatistics, HeatmapPoint};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

/// Longest projection a caller may request
pub const MAX_FORECAST_DAYS: u32 = 14;

#[derive(Debug, Serialize)]
pub struct HeatmapResponse {
    pub heatmap_data: Vec<HeatmapPoint>,
    pub statistics: AqiStatistics,
}

#[derive(Debug, Deserialize)]
pub struct ForecastRequest {
    pub location: String,
    #[serde(default)]
    pub days: Option<u32>,
}

/// GET /api/heatmap
///
/// Statistics cover every location with a reading; markers only those the
/// gazetteer knows.
pub async fn get_heatmap(State(state): State<AppState>) -> ApiResult<Json<HeatmapResponse>> {
    let readings = latest_per_location(&state.db).await?;
    Ok(Json(HeatmapResponse {
        heatmap_data: heatmap_points(&readings),
        statistics: statistics(&readings),
    }))
}

/// POST /api/forecast
pub async fn get_forecast(
    State(state): State<AppState>,
    Json(request): Json<ForecastRequest>,
) -> ApiResult<Json<Vec<ForecastPoint>>> {
    let location = request.location.trim();
    if location.is_empty() {
        return Err(ApiError::BadRequest("Location is required".to_string()));
    }
    let days = request.days.unwrap_or(DEFAULT_FORECAST_DAYS);
    if !(1..=MAX_FORECAST_DAYS).contains(&days) {
        return Err(ApiError::BadRequest(format!(
            "days must be between 1 and {}",
            MAX_FORECAST_DAYS
        )));
    }

    let history = recent_for_location(&state.db, location, FORECAST_WINDOW as i64).await?;
    if history.is_empty() {
        return Err(ApiError::NotFound(format!(
            "No readings for location: {}",
            location
        )));
    }
    Ok(Json(project(&history, days)?))
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/api/heatmap", get(get_heatmap))
        .route("/api/forecast", post(get_forecast))
}
