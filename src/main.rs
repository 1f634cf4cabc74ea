//! PostForge Server — AI Blog Content Generation Platform
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use postforge_core::config::AppConfig;
use postforge_core::error::AppError;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("POSTFORGE_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting PostForge v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    tracing::info!("Connecting to database...");
    let database = postforge_database::connection::DatabasePool::connect(&config.database).await?;
    let db_pool = database.pool().clone();

    tracing::info!("Running database migrations...");
    postforge_database::migration::run_migrations(&db_pool).await?;
    tracing::info!("Database migrations complete");

    // ── Step 2: Initialize cache ─────────────────────────────────
    tracing::info!(
        "Initializing cache (provider: {})...",
        config.cache.provider
    );
    let cache = Arc::new(postforge_cache::provider::CacheManager::new(&config.cache).await?);
    tracing::info!("Cache initialized");

    // ── Step 3: Initialize repositories ──────────────────────────
    let user_repo = Arc::new(
        postforge_database::repositories::user::UserRepository::new(db_pool.clone()),
    );
    let plan_repo = Arc::new(
        postforge_database::repositories::plan::PlanRepository::new(db_pool.clone()),
    );
    let post_repo = Arc::new(
        postforge_database::repositories::post::PostRepository::new(db_pool.clone()),
    );

    // ── Step 4: Initialize auth system ───────────────────────────
    tracing::info!("Initializing authentication system...");
    let password_hasher = Arc::new(postforge_auth::password::hasher::PasswordHasher::new());
    let password_validator = Arc::new(postforge_auth::password::validator::PasswordValidator::new(
        &config.auth,
    ));
    let jwt_encoder = Arc::new(postforge_auth::jwt::encoder::JwtEncoder::new(&config.auth));
    let jwt_decoder = Arc::new(postforge_auth::jwt::decoder::JwtDecoder::new(&config.auth));
    let revocation = Arc::new(postforge_auth::revocation::RevocationRegistry::new(
        &config.auth,
        Arc::clone(&cache),
    ));
    let usage_gate = Arc::new(postforge_auth::quota::UsageGate::new(
        user_repo.as_ref().clone(),
    ));

    // ── Step 5: Initialize services ──────────────────────────────
    tracing::info!("Initializing services...");
    let auth_service = Arc::new(postforge_service::auth::service::AuthService::new(
        &config.auth,
        Arc::clone(&user_repo),
        Arc::clone(&plan_repo),
        Arc::clone(&password_hasher),
        Arc::clone(&password_validator),
        Arc::clone(&jwt_encoder),
        Arc::clone(&jwt_decoder),
        Arc::clone(&revocation),
    ));
    let user_service = Arc::new(postforge_service::user::service::UserService::new(
        Arc::clone(&user_repo),
        Arc::clone(&password_hasher),
        Arc::clone(&password_validator),
    ));
    let subscription_service = Arc::new(
        postforge_service::subscription::service::SubscriptionService::new(
            Arc::clone(&plan_repo),
            Arc::clone(&user_repo),
            Arc::clone(&usage_gate),
        ),
    );
    let generator = Arc::new(postforge_service::content::generator::GeneratorClient::new(
        config.generator.clone(),
    )?);
    let post_service = Arc::new(postforge_service::content::service::PostService::new(
        Arc::clone(&post_repo),
        Arc::clone(&usage_gate),
        generator,
    ));
    tracing::info!("Services initialized");

    // ── Step 6: Seed default plans ───────────────────────────────
    subscription_service.seed_default_plans().await?;

    // ── Step 7: Build router and serve ───────────────────────────
    let state = postforge_api::AppState {
        config: Arc::new(config.clone()),
        db_pool,
        cache,
        jwt_encoder,
        jwt_decoder,
        password_hasher,
        password_validator,
        revocation,
        usage_gate,
        user_repo,
        plan_repo,
        post_repo,
        auth_service,
        user_service,
        subscription_service,
        post_service,
    };

    let app = postforge_api::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(grace))
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    tracing::info!("Shutting down");
    database.close().await;
    Ok(())
}

/// Resolves on SIGINT or SIGTERM. In-flight requests get the grace
/// period to finish before the process exits.
async fn shutdown_signal(grace: Duration) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!(
        "Shutdown signal received, draining for up to {}s",
        grace.as_secs()
    );
}
