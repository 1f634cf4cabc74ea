//! Authentication extractors — the chained access-control gate.
//!
//! Handlers pick the strictest gate they need:
//!
//! `CurrentUser` (valid, unrevoked token) → `ActiveUser` (account enabled)
//! → `VerifiedUser` (email verified) → `RequireTier<T>` (minimum tier).
//!
//! Each stage extracts the previous one, so every stronger gate implies
//! all the weaker checks.

use std::marker::PhantomData;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use postforge_core::error::AppError;
use postforge_entity::user::{SubscriptionTier, User};

use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated user with a valid, unrevoked access token.
///
/// Carries the raw token so logout can revoke exactly what was presented.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// The user row behind the token subject.
    pub user: User,
    /// The raw bearer token from the request.
    pub token: String,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // A missing or malformed Authorization header is a scheme problem
        // (403), while a present-but-bad credential is 401.
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError(AppError::forbidden("Not authenticated")))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError(AppError::forbidden("Invalid authentication scheme")))?;

        let claims = state.jwt_decoder.decode_access_token(token)?;

        // Fails closed: a cache outage surfaces as 503 rather than letting
        // a possibly revoked token through.
        if state.revocation.is_blacklisted(token).await? {
            return Err(ApiError(AppError::unauthorized("Token has been revoked")));
        }

        let user = state
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| ApiError(AppError::unauthorized("User no longer exists")))?;

        Ok(CurrentUser {
            user,
            token: token.to_string(),
        })
    }
}

/// Authenticated user whose account is enabled.
#[derive(Debug, Clone)]
pub struct ActiveUser(pub CurrentUser);

impl std::ops::Deref for ActiveUser {
    type Target = CurrentUser;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for ActiveUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let current = CurrentUser::from_request_parts(parts, state).await?;
        if !current.user.is_active {
            return Err(ApiError(AppError::forbidden("Account is disabled")));
        }
        Ok(ActiveUser(current))
    }
}

/// Active user whose email address has been verified.
#[derive(Debug, Clone)]
pub struct VerifiedUser(pub CurrentUser);

impl std::ops::Deref for VerifiedUser {
    type Target = CurrentUser;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for VerifiedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let active = ActiveUser::from_request_parts(parts, state).await?;
        if !active.user.is_verified {
            return Err(ApiError(AppError::forbidden(
                "Email verification required for this action",
            )));
        }
        Ok(VerifiedUser(active.0))
    }
}

/// Minimum subscription tier for an endpoint.
pub trait TierRequirement: Send + Sync + 'static {
    /// The lowest tier admitted.
    const TIER: SubscriptionTier;
}

/// Requires the basic tier or above.
#[derive(Debug, Clone, Copy)]
pub struct BasicTier;

impl TierRequirement for BasicTier {
    const TIER: SubscriptionTier = SubscriptionTier::Basic;
}

/// Requires the premium tier.
#[derive(Debug, Clone, Copy)]
pub struct PremiumTier;

impl TierRequirement for PremiumTier {
    const TIER: SubscriptionTier = SubscriptionTier::Premium;
}

/// Active user on at least the tier named by `T`.
///
/// Tier checks compare ranks, so an endpoint gated on `BasicTier` also
/// admits premium subscribers.
#[derive(Debug, Clone)]
pub struct RequireTier<T: TierRequirement> {
    /// The admitted user.
    pub user: User,
    /// The raw bearer token from the request.
    pub token: String,
    _tier: PhantomData<T>,
}

impl<T: TierRequirement> FromRequestParts<AppState> for RequireTier<T> {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let active = ActiveUser::from_request_parts(parts, state).await?;
        if !active.user.tier.at_least(T::TIER) {
            return Err(ApiError(AppError::forbidden(format!(
                "This feature requires the {} plan or above",
                T::TIER
            ))));
        }
        let CurrentUser { user, token } = active.0;
        Ok(RequireTier {
            user,
            token,
            _tier: PhantomData,
        })
    }
}
