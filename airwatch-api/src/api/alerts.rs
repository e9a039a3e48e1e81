//! On-demand alert evaluation

use crate::api::aqi_from_json;
use crate::{ApiResult, AppState};
use airwatch_engine::{evaluate, AlertLevel, AqiReading};
use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub subscription_id: Uuid,
    #[serde(default)]
    pub current_aqi: Value,
}

#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub current_aqi: u32,
    pub level: AlertLevel,
    pub message: String,
    pub triggered: bool,
}

/// POST /api/alerts/evaluate
///
/// Evaluates a caller-supplied AQI against a stored subscription without
/// recording anything.
pub async fn evaluate_alert(
    State(state): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> ApiResult<Json<EvaluateResponse>> {
    let aqi = aqi_from_json(&request.current_aqi)?;
    let subscription = state.registry.get(request.subscription_id).await?;
    let reading = AqiReading {
        value: aqi,
        location: subscription.location.clone(),
        timestamp: Utc::now(),
    };

    let decision = evaluate(&subscription, &reading);
    Ok(Json(EvaluateResponse {
        current_aqi: decision.current_aqi,
        level: decision.level,
        message: decision.message,
        triggered: decision.triggered,
    }))
}

pub fn alert_routes() -> Router<AppState> {
    Router::new().route("/api/alerts/evaluate", post(evaluate_alert))
}
