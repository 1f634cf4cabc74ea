//! Authentication service — registration, login, token lifecycle, and
//! password reset.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use postforge_auth::jwt::{JwtDecoder, JwtEncoder, TokenPair};
use postforge_auth::password::{PasswordHasher, PasswordValidator};
use postforge_auth::revocation::RevocationRegistry;
use postforge_core::config::auth::AuthConfig;
use postforge_core::error::AppError;
use postforge_core::result::AppResult;
use postforge_database::repositories::{PlanRepository, UserRepository};
use postforge_entity::user::model::CreateUser;
use postforge_entity::user::{SubscriptionTier, User};

/// Fallback allowance when no free plan row has been seeded yet.
const DEFAULT_FREE_POSTS: i32 = 5;

/// Data for a new account registration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RegisterRequest {
    /// Email address, used as the login name.
    pub email: String,
    /// Plaintext password.
    pub password: String,
    /// First name (optional).
    pub first_name: Option<String>,
    /// Last name (optional).
    pub last_name: Option<String>,
}

/// Handles the full authentication lifecycle.
#[derive(Debug, Clone)]
pub struct AuthService {
    /// User repository.
    user_repo: Arc<UserRepository>,
    /// Plan repository, for the initial free allowance.
    plan_repo: Arc<PlanRepository>,
    /// Password hasher.
    hasher: Arc<PasswordHasher>,
    /// Password validator.
    validator: Arc<PasswordValidator>,
    /// JWT encoder.
    encoder: Arc<JwtEncoder>,
    /// JWT decoder.
    decoder: Arc<JwtDecoder>,
    /// Token revocation registry.
    revocation: Arc<RevocationRegistry>,
    /// Maximum failed logins before lockout.
    max_failed_attempts: i32,
    /// Lockout duration in minutes.
    lockout_minutes: u64,
}

impl AuthService {
    /// Creates a new auth service.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &AuthConfig,
        user_repo: Arc<UserRepository>,
        plan_repo: Arc<PlanRepository>,
        hasher: Arc<PasswordHasher>,
        validator: Arc<PasswordValidator>,
        encoder: Arc<JwtEncoder>,
        decoder: Arc<JwtDecoder>,
        revocation: Arc<RevocationRegistry>,
    ) -> Self {
        Self {
            user_repo,
            plan_repo,
            hasher,
            validator,
            encoder,
            decoder,
            revocation,
            max_failed_attempts: config.max_failed_attempts,
            lockout_minutes: config.lockout_duration_minutes,
        }
    }

    /// Registers a new account on the free tier and signs it in,
    /// returning the created user with its first token pair.
    pub async fn register(&self, req: RegisterRequest) -> AppResult<(User, TokenPair)> {
        let email = req.email.trim().to_lowercase();
        if !email.contains('@') || !email.contains('.') {
            return Err(AppError::validation("Invalid email format"));
        }

        self.validator.validate(&req.password)?;

        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("A user with this email already exists"));
        }

        let posts_limit = match self.plan_repo.find_by_tier(SubscriptionTier::Free).await? {
            Some(plan) => plan.posts_per_month,
            None => DEFAULT_FREE_POSTS,
        };

        let password_hash = self.hasher.hash_password(&req.password)?;
        let user = self
            .user_repo
            .create(&CreateUser {
                email,
                password_hash,
                first_name: req.first_name,
                last_name: req.last_name,
                tier: SubscriptionTier::Free,
                posts_limit,
            })
            .await?;

        let pair = self.encoder.generate_token_pair(user.id, &user.email)?;
        self.revocation
            .store_refresh_token(user.id, &pair.refresh_token)
            .await?;

        info!(user_id = %user.id, "User registered");
        Ok((user, pair))
    }

    /// Authenticates credentials and issues a token pair.
    ///
    /// The refresh token replaces any previously stored one, so a login
    /// from a second device invalidates the first device's refresh token.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<TokenPair> {
        // A single generic message for bad email and bad password keeps
        // account existence unguessable.
        let Some(user) = self.user_repo.find_by_email(email).await? else {
            return Err(AppError::unauthorized("Invalid email or password"));
        };

        if user.is_locked() {
            warn!(user_id = %user.id, "Login attempt on locked account");
            return Err(AppError::forbidden(
                "Account temporarily locked due to repeated failed logins. Try again later.",
            ));
        }

        if !user.is_active {
            return Err(AppError::forbidden("Account is disabled"));
        }

        if !self.hasher.verify_password(password, &user.password_hash)? {
            let failures = self
                .user_repo
                .record_login_failure(user.id, self.max_failed_attempts, self.lockout_minutes)
                .await?;
            if failures >= self.max_failed_attempts {
                warn!(user_id = %user.id, failures, "Account locked");
            }
            return Err(AppError::unauthorized("Invalid email or password"));
        }

        self.user_repo.record_login_success(user.id).await?;

        let pair = self.encoder.generate_token_pair(user.id, &user.email)?;
        self.revocation
            .store_refresh_token(user.id, &pair.refresh_token)
            .await?;

        info!(user_id = %user.id, "User logged in");
        Ok(pair)
    }

    /// Exchanges a refresh token for a new token pair.
    ///
    /// The presented refresh token is rotated: it is blacklisted for its
    /// remaining lifetime and replaced by a freshly issued one.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = self.decoder.decode_refresh_token(refresh_token)?;

        if self.revocation.is_blacklisted(refresh_token).await? {
            return Err(AppError::unauthorized("Token has been revoked"));
        }

        if !self
            .revocation
            .is_current_refresh_token(claims.sub, refresh_token)
            .await?
        {
            return Err(AppError::unauthorized("Refresh token is no longer valid"));
        }

        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::unauthorized("User no longer exists"))?;
        if !user.is_active {
            return Err(AppError::forbidden("Account is disabled"));
        }

        // Rotate: the old refresh token dies with this exchange.
        self.revocation
            .blacklist_token(refresh_token, claims.remaining_ttl_seconds())
            .await?;

        let pair = self.encoder.generate_token_pair(user.id, &user.email)?;
        self.revocation
            .store_refresh_token(user.id, &pair.refresh_token)
            .await?;

        info!(user_id = %user.id, "Token pair refreshed");
        Ok(pair)
    }

    /// Logs out: revokes the presented access token and the user's stored
    /// refresh token.
    pub async fn logout(&self, user_id: Uuid, access_token: &str) -> AppResult<()> {
        let remaining = self
            .decoder
            .decode_access_token(access_token)
            .map(|c| c.remaining_ttl_seconds())
            .unwrap_or(0);

        self.revocation
            .blacklist_token(access_token, remaining)
            .await?;
        self.revocation.revoke_refresh_token(user_id).await?;

        info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    /// Starts a password reset for the given email.
    ///
    /// Returns the reset token when the account exists, `None` otherwise.
    /// Callers must respond identically in both cases so the endpoint
    /// cannot be used to enumerate accounts.
    pub async fn request_password_reset(&self, email: &str) -> AppResult<Option<String>> {
        let Some(user) = self.user_repo.find_by_email(email).await? else {
            return Ok(None);
        };

        let token = self.revocation.issue_reset_token(user.id).await?;
        info!(user_id = %user.id, "Password reset token issued");
        Ok(Some(token))
    }

    /// Completes a password reset with a single-use token.
    ///
    /// All existing sessions are invalidated by revoking the stored
    /// refresh token.
    pub async fn confirm_password_reset(&self, token: &str, new_password: &str) -> AppResult<()> {
        self.validator.validate(new_password)?;

        let user_id = self
            .revocation
            .consume_reset_token(token)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid or expired reset token"))?;

        let hash = self.hasher.hash_password(new_password)?;
        self.user_repo.update_password(user_id, &hash).await?;
        self.revocation.revoke_refresh_token(user_id).await?;

        info!(user_id = %user_id, "Password reset completed");
        Ok(())
    }
}
