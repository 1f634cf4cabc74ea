//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use sqlx::PgPool;

use postforge_auth::jwt::decoder::JwtDecoder;
use postforge_auth::jwt::encoder::JwtEncoder;
use postforge_auth::password::hasher::PasswordHasher;
use postforge_auth::password::validator::PasswordValidator;
use postforge_auth::quota::UsageGate;
use postforge_auth::revocation::RevocationRegistry;
use postforge_cache::provider::CacheManager;
use postforge_core::config::AppConfig;

use postforge_database::repositories::plan::PlanRepository;
use postforge_database::repositories::post::PostRepository;
use postforge_database::repositories::user::UserRepository;

use postforge_service::auth::service::AuthService;
use postforge_service::content::service::PostService;
use postforge_service::subscription::service::SubscriptionService;
use postforge_service::user::service::UserService;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// PostgreSQL connection pool
    pub db_pool: PgPool,
    /// Cache manager (Redis or in-memory)
    pub cache: Arc<CacheManager>,

    // ── Auth ─────────────────────────────────────────────────
    /// JWT token encoder
    pub jwt_encoder: Arc<JwtEncoder>,
    /// JWT token decoder and validator
    pub jwt_decoder: Arc<JwtDecoder>,
    /// Password hasher (Argon2)
    pub password_hasher: Arc<PasswordHasher>,
    /// Password policy validator
    pub password_validator: Arc<PasswordValidator>,
    /// Token revocation registry
    pub revocation: Arc<RevocationRegistry>,
    /// Monthly post-credit gate
    pub usage_gate: Arc<UsageGate>,

    // ── Repositories ─────────────────────────────────────────
    /// User repository
    pub user_repo: Arc<UserRepository>,
    /// Plan repository
    pub plan_repo: Arc<PlanRepository>,
    /// Post repository
    pub post_repo: Arc<PostRepository>,

    // ── Services ─────────────────────────────────────────────
    /// Authentication service
    pub auth_service: Arc<AuthService>,
    /// User self-service
    pub user_service: Arc<UserService>,
    /// Subscription service
    pub subscription_service: Arc<SubscriptionService>,
    /// Post generation service
    pub post_service: Arc<PostService>,
}
