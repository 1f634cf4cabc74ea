//! Subscription handlers — plans, usage, plan changes.

use axum::Json;
use axum::extract::State;

use postforge_auth::quota::UsageSnapshot;
use postforge_entity::plan::SubscriptionPlan;

use crate::dto::request::ChangePlanRequest;
use crate::dto::response::{ApiResponse, UserResponse};
use crate::error::ApiError;
use crate::extractors::ActiveUser;
use crate::state::AppState;

/// GET /api/v1/subscriptions/plans
pub async fn list_plans(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<SubscriptionPlan>>>, ApiError> {
    let plans = state.subscription_service.list_plans().await?;
    Ok(Json(ApiResponse::ok(plans)))
}

/// GET /api/v1/subscriptions/usage
pub async fn get_usage(
    State(state): State<AppState>,
    active: ActiveUser,
) -> Result<Json<ApiResponse<UsageSnapshot>>, ApiError> {
    let usage = state.subscription_service.get_usage(active.user.id).await?;
    Ok(Json(ApiResponse::ok(usage)))
}

/// PUT /api/v1/subscriptions/plan
pub async fn change_plan(
    State(state): State<AppState>,
    active: ActiveUser,
    Json(req): Json<ChangePlanRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = state
        .subscription_service
        .change_plan(active.user.id, req.tier)
        .await?;
    Ok(Json(ApiResponse::ok(UserResponse::from(&user))))
}

/// DELETE /api/v1/subscriptions/plan
pub async fn cancel_plan(
    State(state): State<AppState>,
    active: ActiveUser,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = state.subscription_service.cancel(active.user.id).await?;
    Ok(Json(ApiResponse::ok(UserResponse::from(&user))))
}
