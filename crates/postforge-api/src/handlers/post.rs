//! Blog post handlers — generation, listing, and deletion.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use uuid::Uuid;
use validator::Validate;

use postforge_core::error::AppError;
use postforge_core::types::pagination::{PageRequest, PageResponse};
use postforge_entity::post::BlogPost;
use postforge_service::content::CreatePostRequest as CreatePost;

use crate::dto::request::CreatePostRequest;
use crate::dto::response::{ApiResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::{ActiveUser, BasicTier, RequireTier, VerifiedUser};
use crate::state::AppState;

/// POST /api/v1/posts
///
/// Generation requires a verified email on top of an active account.
pub async fn create_post(
    State(state): State<AppState>,
    verified: VerifiedUser,
    Json(req): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BlogPost>>), ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let post = state
        .post_service
        .create_post(
            verified.user.id,
            CreatePost {
                title: req.title,
                topic: req.topic,
                word_count: req.word_count,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(post))))
}

/// GET /api/v1/posts
pub async fn list_posts(
    State(state): State<AppState>,
    active: ActiveUser,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<PageResponse<BlogPost>>>, ApiError> {
    let posts = state.post_service.list_posts(active.user.id, &page).await?;
    Ok(Json(ApiResponse::ok(posts)))
}

/// GET /api/v1/posts/{id}
pub async fn get_post(
    State(state): State<AppState>,
    active: ActiveUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BlogPost>>, ApiError> {
    let post = state.post_service.get_post(active.user.id, id).await?;
    Ok(Json(ApiResponse::ok(post)))
}

/// POST /api/v1/posts/{id}/regenerate
///
/// Rerunning generation is a paid-tier feature.
pub async fn regenerate_post(
    State(state): State<AppState>,
    gated: RequireTier<BasicTier>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BlogPost>>, ApiError> {
    let post = state
        .post_service
        .regenerate_post(gated.user.id, id)
        .await?;
    Ok(Json(ApiResponse::ok(post)))
}

/// DELETE /api/v1/posts/{id}
pub async fn delete_post(
    State(state): State<AppState>,
    active: ActiveUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.post_service.delete_post(active.user.id, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Post deleted"))))
}
