//! Classify + recommend endpoints
//!
//! POST /api/advisory takes an AQI directly; POST /api/aqi looks up the
//! latest stored reading for a location first. Both return the same shape.

use crate::api::aqi_from_json;
use crate::db::readings::latest_for_location;
use crate::{ApiError, ApiResult, AppState};
use airwatch_engine::{advise, AdvisoryMessage, PersonContext, Recommendation};
use axum::{extract::State, routing::post, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request carrying an AQI value
#[derive(Debug, Deserialize)]
pub struct AdvisoryRequest {
    #[serde(default)]
    pub aqi: Value,
    #[serde(default)]
    pub age_group: Option<String>,
    #[serde(default)]
    pub health_conditions: Option<Vec<String>>,
}

/// Request naming a location with stored readings
#[derive(Debug, Deserialize)]
pub struct LocationAdvisoryRequest {
    pub location: String,
    #[serde(default)]
    pub age_group: Option<String>,
    #[serde(default)]
    pub health_conditions: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct AqiPayload {
    pub aqi: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct AdvisoryResponse {
    pub aqi: AqiPayload,
    pub recommendations: Recommendation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_message: Option<AdvisoryMessage>,
}

fn build_response(
    aqi: u32,
    location: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    context: &PersonContext,
) -> ApiResult<AdvisoryResponse> {
    let advice = advise(i64::from(aqi), context)?;
    Ok(AdvisoryResponse {
        aqi: AqiPayload {
            aqi: advice.aqi,
            location,
            timestamp,
        },
        recommendations: advice.recommendation,
        alert_message: advice.alert_message,
    })
}

fn parse_context(age_group: Option<&str>, conditions: Option<&[String]>) -> ApiResult<PersonContext> {
    Ok(PersonContext::parse(age_group, conditions.unwrap_or_default())?)
}

/// POST /api/advisory
///
/// **Request:** `{"aqi": 160, "age_group": "child", "health_conditions": ["asthma"]}`
///
/// **Errors:**
/// - 400 INVALID_READING: negative or non-numeric AQI
/// - 400 VALIDATION_ERROR: unknown age group or condition
pub async fn get_advisory(Json(request): Json<AdvisoryRequest>) -> ApiResult<Json<AdvisoryResponse>> {
    let aqi = aqi_from_json(&request.aqi)?;
    let context = parse_context(request.age_group.as_deref(), request.health_conditions.as_deref())?;
    Ok(Json(build_response(aqi, None, None, &context)?))
}

/// POST /api/aqi
///
/// Same response as `/api/advisory`, using the latest stored reading.
/// 404 if no reading exists for the location.
pub async fn advise_for_location(
    State(state): State<AppState>,
    Json(request): Json<LocationAdvisoryRequest>,
) -> ApiResult<Json<AdvisoryResponse>> {
    let location = request.location.trim();
    if location.is_empty() {
        return Err(ApiError::BadRequest("Location is required".to_string()));
    }
    let context = parse_context(request.age_group.as_deref(), request.health_conditions.as_deref())?;

    let reading = latest_for_location(&state.db, location)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No readings for location: {}", location)))?;

    Ok(Json(build_response(
        reading.value,
        Some(reading.location),
        Some(reading.timestamp),
        &context,
    )?))
}

pub fn advisory_routes() -> Router<AppState> {
    Router::new()
        .route("/api/advisory", post(get_advisory))
        .route("/api/aqi", post(advise_for_location))
}
