//! Route definitions for the PostForge HTTP API.
//!
//! Versioned routes are organized by domain and mounted under `/api/v1`.
//! The router receives `AppState` and passes it to all handlers via
//! Axum's `State` extractor.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
///
/// Receives the fully-constructed `AppState` and threads it through
/// every route via `.with_state(state)`.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;

    let api_routes = Router::new()
        .merge(auth_routes(state.clone()))
        .merge(user_routes())
        .merge(subscription_routes())
        .merge(post_routes())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::api_rate_limit,
        ));

    let health_routes = Router::new().route("/health", get(handlers::health::health_check));

    let cors = build_cors_layer(&state);

    Router::new()
        .nest("/api/v1", api_routes)
        .merge(health_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// Auth endpoints. Credential endpoints carry a stricter per-IP rate
/// limit on top of the general API window.
fn auth_routes(state: AppState) -> Router<AppState> {
    let credential_routes = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route(
            "/auth/forgot-password",
            post(handlers::auth::forgot_password),
        )
        .route("/auth/reset-password", post(handlers::auth::reset_password))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::rate_limit::login_rate_limit,
        ));

    Router::new()
        .merge(credential_routes)
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me))
}

/// User self-service endpoints
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(handlers::user::get_profile))
        .route("/users/me", put(handlers::user::update_profile))
        .route("/users/me/password", put(handlers::user::change_password))
}

/// Subscription plans, usage, and plan changes
fn subscription_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/subscriptions/plans",
            get(handlers::subscription::list_plans),
        )
        .route("/subscriptions/usage", get(handlers::subscription::get_usage))
        .route(
            "/subscriptions/plan",
            put(handlers::subscription::change_plan),
        )
        .route(
            "/subscriptions/plan",
            delete(handlers::subscription::cancel_plan),
        )
}

/// Blog post generation and management
fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", post(handlers::post::create_post))
        .route("/posts", get(handlers::post::list_posts))
        .route("/posts/{id}", get(handlers::post::get_post))
        .route("/posts/{id}", delete(handlers::post::delete_post))
        .route(
            "/posts/{id}/regenerate",
            post(handlers::post::regenerate_post),
        )
}

/// Build CORS layer from configuration
fn build_cors_layer(state: &AppState) -> CorsLayer {
    use tower_http::cors::Any;

    let cors_config = &state.config.server.cors;

    let mut cors = CorsLayer::new();

    if cors_config.allowed_origins.contains(&"*".to_string()) {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = cors_config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    let methods: Vec<Method> = cors_config
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    cors = cors.allow_methods(methods);

    if cors_config.allowed_headers.contains(&"*".to_string()) {
        cors = cors.allow_headers(Any);
    }

    cors = cors.max_age(std::time::Duration::from_secs(cors_config.max_age_seconds));

    cors
}
