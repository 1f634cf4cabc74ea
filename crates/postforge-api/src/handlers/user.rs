//! User self-service handlers.

use axum::Json;
use axum::extract::State;
use validator::Validate;

use postforge_core::error::AppError;
use postforge_service::user::service::UpdateProfileRequest as ServiceUpdateProfile;

use crate::dto::request::{ChangePasswordRequest, UpdateProfileRequest};
use crate::dto::response::{ApiResponse, MessageResponse, UserResponse};
use crate::error::ApiError;
use crate::extractors::ActiveUser;
use crate::state::AppState;

/// GET /api/v1/users/me
pub async fn get_profile(
    State(state): State<AppState>,
    active: ActiveUser,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = state.user_service.get_profile(active.user.id).await?;
    Ok(Json(ApiResponse::ok(UserResponse::from(&user))))
}

/// PUT /api/v1/users/me
pub async fn update_profile(
    State(state): State<AppState>,
    active: ActiveUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = state
        .user_service
        .update_profile(
            active.user.id,
            ServiceUpdateProfile {
                first_name: req.first_name,
                last_name: req.last_name,
            },
        )
        .await?;
    Ok(Json(ApiResponse::ok(UserResponse::from(&user))))
}

/// PUT /api/v1/users/me/password
pub async fn change_password(
    State(state): State<AppState>,
    active: ActiveUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    req.validate()
        .map_err(|e| ApiError(AppError::validation(e.to_string())))?;

    state
        .user_service
        .change_password(active.user.id, &req.current_password, &req.new_password)
        .await?;

    Ok(Json(ApiResponse::ok(MessageResponse::new(
        "Password changed successfully",
    ))))
}
