//! Fixed-window rate limiting middleware backed by the cache.
//!
//! Each window is a cache counter: the first `INCR` creates the key and
//! an `EXPIRE` stamps the window length; the count resets when the key
//! expires. The limiter fails open — a cache outage must not take the
//! API down with it.

use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::{HeaderValue, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use postforge_cache::keys;
use postforge_core::error::AppError;
use postforge_core::traits::CacheProvider;

use crate::error::ApiError;
use crate::state::AppState;

/// General API rate limit: authenticated requests are keyed by user,
/// anonymous ones by client IP.
pub async fn api_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.rate_limit.enabled {
        return next.run(request).await;
    }

    let (identifier, limit) = match bearer_subject(&state, &request) {
        Some(user_id) => (user_id, state.config.rate_limit.authenticated_limit),
        None => (client_ip(&request), state.config.rate_limit.anonymous_limit),
    };

    match enforce(&state, "api", &identifier, limit).await {
        Some(rejection) => rejection,
        None => next.run(request).await,
    }
}

/// Stricter window for credential endpoints, keyed by client IP.
pub async fn login_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.rate_limit.enabled {
        return next.run(request).await;
    }

    let ip = client_ip(&request);
    match enforce(&state, "login", &ip, state.config.rate_limit.login_limit).await {
        Some(rejection) => rejection,
        None => next.run(request).await,
    }
}

/// Runs the fixed-window check. Returns a 429 response when the window
/// is exhausted, `None` when the request may proceed.
async fn enforce(
    state: &AppState,
    endpoint: &str,
    identifier: &str,
    limit: u32,
) -> Option<Response> {
    let window = Duration::from_secs(state.config.rate_limit.window_seconds);
    let key = keys::rate_limit(endpoint, identifier);

    let count = match state.cache.incr(&key).await {
        Ok(count) => count,
        Err(e) => {
            warn!(error = %e, "Rate limiter cache unavailable, allowing request");
            return None;
        }
    };

    if count == 1 {
        if let Err(e) = state.cache.expire(&key, window).await {
            warn!(error = %e, "Failed to stamp rate limit window");
        }
    }

    if count <= limit as i64 {
        return None;
    }

    let retry_after = match state.cache.ttl(&key).await {
        Ok(Some(ttl)) => ttl.as_secs().max(1),
        _ => window.as_secs(),
    };

    let mut response = ApiError(AppError::rate_limited(format!(
        "Rate limit exceeded. Try again in {retry_after} seconds."
    )))
    .into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    Some(response)
}

/// User ID from a decodable bearer token, if any. Invalid tokens fall
/// back to IP keying; the auth extractor rejects them properly later.
fn bearer_subject(state: &AppState, request: &Request) -> Option<String> {
    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())?
        .strip_prefix("Bearer ")?;
    state
        .jwt_decoder
        .decode_access_token(token)
        .ok()
        .map(|claims| claims.sub.to_string())
}

/// Best-effort client IP from proxy headers.
fn client_ip(request: &Request) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
