//! Subscription CRUD, on-demand checks and alert history

use crate::db::readings::latest_for_location;
use crate::history::AlertRecord;
use crate::{ApiError, ApiResult, AppState};
use airwatch_engine::subscription::DEFAULT_THRESHOLD;
use airwatch_engine::{
    evaluate, AgeGroup, AlertDecision, HealthCondition, NewSubscription, PersonContext,
    Subscription, SubscriptionUpdate,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// POST /api/subscriptions body
#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    #[serde(default, alias = "user_id")]
    pub owner: Option<String>,
    pub location: String,
    #[serde(default)]
    pub threshold: Option<i64>,
    #[serde(default)]
    pub age_group: Option<String>,
    #[serde(default)]
    pub health_conditions: Option<Vec<String>>,
}

/// PATCH /api/subscriptions/:id body
///
/// An absent context field keeps its stored value.
#[derive(Debug, Deserialize)]
pub struct UpdateSubscriptionRequest {
    #[serde(default, alias = "user_id")]
    pub owner: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub threshold: Option<i64>,
    #[serde(default)]
    pub age_group: Option<String>,
    #[serde(default)]
    pub health_conditions: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    #[serde(default, alias = "user_id")]
    pub owner: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionListResponse {
    pub subscriptions: Vec<Subscription>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub subscription_id: Uuid,
    pub alerts: Vec<AlertRecord>,
}

fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid subscription id: {}", raw)))
}

fn context_from(age_group: Option<&str>, conditions: Option<&[String]>) -> ApiResult<PersonContext> {
    Ok(PersonContext::parse(age_group, conditions.unwrap_or_default())?)
}

/// GET /api/subscriptions
pub async fn list_subscriptions(
    State(state): State<AppState>,
) -> ApiResult<Json<SubscriptionListResponse>> {
    let subscriptions = state.registry.list().await?;
    Ok(Json(SubscriptionListResponse {
        total: subscriptions.len(),
        subscriptions,
    }))
}

/// POST /api/subscriptions
///
/// **Errors:** 400 VALIDATION_ERROR for an empty location, a threshold
/// outside 0-500, or an unknown age group / condition.
pub async fn create_subscription(
    State(state): State<AppState>,
    Json(request): Json<CreateSubscriptionRequest>,
) -> ApiResult<(StatusCode, Json<Subscription>)> {
    let context = context_from(request.age_group.as_deref(), request.health_conditions.as_deref())?;
    let mut new = NewSubscription::new(
        request.location,
        request.threshold.unwrap_or(DEFAULT_THRESHOLD as i64),
        context,
    );
    if let Some(owner) = request.owner {
        new = new.with_owner(owner);
    }

    let subscription = state.registry.create(new).await?;
    info!(
        "Created subscription {} for {} (threshold {})",
        subscription.id, subscription.location, subscription.threshold
    );
    Ok((StatusCode::CREATED, Json(subscription)))
}

/// GET /api/subscriptions/:id
pub async fn get_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Subscription>> {
    let id = parse_id(&id)?;
    Ok(Json(state.registry.get(id).await?))
}

/// PATCH /api/subscriptions/:id
///
/// 404 both for unknown ids and for callers that do not own the subscription.
pub async fn update_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateSubscriptionRequest>,
) -> ApiResult<Json<Subscription>> {
    let id = parse_id(&id)?;
    let age_group = request
        .age_group
        .as_deref()
        .map(str::parse::<AgeGroup>)
        .transpose()?;
    let health_conditions = request
        .health_conditions
        .map(|raw| {
            raw.iter()
                .map(|c| c.parse::<HealthCondition>())
                .collect::<airwatch_engine::Result<Vec<_>>>()
        })
        .transpose()?;

    let update = SubscriptionUpdate {
        location: request.location,
        threshold: request.threshold,
        age_group,
        health_conditions,
    };
    let subscription = state
        .registry
        .update(id, request.owner.as_deref(), update)
        .await?;
    info!("Updated subscription {}", subscription.id);
    Ok(Json(subscription))
}

/// DELETE /api/subscriptions/:id?owner=...
pub async fn delete_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<OwnerQuery>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    state
        .registry
        .remove_owned(id, query.owner.as_deref())
        .await?;
    state.history.forget(id).await;
    info!("Removed subscription {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/subscriptions/:id/check
///
/// Evaluates against the latest stored reading and records the decision as a
/// test entry. Nothing is delivered and the cooldown is not touched.
pub async fn check_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AlertDecision>> {
    let id = parse_id(&id)?;
    let subscription = state.registry.get(id).await?;
    let reading = latest_for_location(&state.db, &subscription.location)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("No readings for location: {}", subscription.location))
        })?;

    let decision = evaluate(&subscription, &reading);
    state
        .history
        .record(AlertRecord {
            subscription_id: id,
            decision: decision.clone(),
            recorded_at: Utc::now(),
            is_test: true,
            delivered: false,
        })
        .await;
    Ok(Json(decision))
}

/// GET /api/subscriptions/:id/history
pub async fn subscription_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<HistoryResponse>> {
    let id = parse_id(&id)?;
    state.registry.get(id).await?;
    Ok(Json(HistoryResponse {
        subscription_id: id,
        alerts: state.history.for_subscription(id).await,
    }))
}

pub fn subscription_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/subscriptions",
            get(list_subscriptions).post(create_subscription),
        )
        .route(
            "/api/subscriptions/:id",
            get(get_subscription)
                .patch(update_subscription)
                .delete(delete_subscription),
        )
        .route("/api/subscriptions/:id/check", post(check_subscription))
        .route("/api/subscriptions/:id/history", get(subscription_history))
}
