//! Token revocation registry and password-reset token store.
//!
//! Revoked tokens are stored by SHA-256 digest so raw bearer credentials
//! never land in the cache. Each user has at most one live refresh token;
//! storing a new one overwrites the old, which invalidates every other
//! session's refresh token.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

use postforge_cache::{CacheManager, keys};
use postforge_core::config::auth::AuthConfig;
use postforge_core::error::AppError;
use postforge_core::result::AppResult;
use postforge_core::traits::CacheProvider;

/// Minimum blacklist TTL, guards against tokens revoked at the edge of
/// their lifetime racing an in-flight request.
const MIN_BLACKLIST_TTL: Duration = Duration::from_secs(60);

/// Number of random bytes in a password reset token.
const RESET_TOKEN_BYTES: usize = 32;

/// Tracks revoked tokens, active refresh tokens, and reset tokens.
#[derive(Debug, Clone)]
pub struct RevocationRegistry {
    /// Cache backend for all revocation state.
    cache: Arc<CacheManager>,
    /// Lifetime of stored refresh tokens.
    refresh_ttl: Duration,
    /// Lifetime of password reset tokens.
    reset_ttl: Duration,
}

impl RevocationRegistry {
    /// Creates a new registry from auth configuration.
    pub fn new(config: &AuthConfig, cache: Arc<CacheManager>) -> Self {
        Self {
            cache,
            refresh_ttl: Duration::from_secs(config.jwt_refresh_ttl_days * 24 * 3600),
            reset_ttl: Duration::from_secs(config.reset_token_ttl_minutes * 60),
        }
    }

    /// SHA-256 hex digest of a raw token.
    pub fn token_hash(token: &str) -> String {
        let digest = Sha256::digest(token.as_bytes());
        format!("{digest:x}")
    }

    /// Marks a token as revoked for the remainder of its lifetime.
    pub async fn blacklist_token(&self, token: &str, remaining_ttl_seconds: u64) -> AppResult<()> {
        let key = keys::blacklist(&Self::token_hash(token));
        let ttl = Duration::from_secs(remaining_ttl_seconds).max(MIN_BLACKLIST_TTL);
        self.cache.set(&key, "revoked", ttl).await?;
        debug!(ttl_seconds = ttl.as_secs(), "Token blacklisted");
        Ok(())
    }

    /// Checks whether a token has been revoked.
    ///
    /// Fails closed: if the cache backend is unreachable the check returns
    /// an error and the caller must reject the request, since an attacker
    /// must never slip a revoked token past an outage.
    pub async fn is_blacklisted(&self, token: &str) -> AppResult<bool> {
        let key = keys::blacklist(&Self::token_hash(token));
        match self.cache.exists(&key).await {
            Ok(found) => Ok(found),
            Err(e) => Err(AppError::service_unavailable(format!(
                "Revocation check unavailable: {e}"
            ))),
        }
    }

    /// Stores the user's refresh token, replacing any previous one.
    ///
    /// Only the digest is stored. Because the key is per-user, logging in
    /// from a second device invalidates the first device's refresh token.
    pub async fn store_refresh_token(&self, user_id: Uuid, token: &str) -> AppResult<()> {
        let key = keys::refresh_token(user_id);
        self.cache
            .set(&key, &Self::token_hash(token), self.refresh_ttl)
            .await
    }

    /// Checks whether the presented refresh token is the user's current one.
    pub async fn is_current_refresh_token(&self, user_id: Uuid, token: &str) -> AppResult<bool> {
        let key = keys::refresh_token(user_id);
        match self.cache.get(&key).await? {
            Some(stored) => Ok(stored == Self::token_hash(token)),
            None => Ok(false),
        }
    }

    /// Removes the user's stored refresh token.
    pub async fn revoke_refresh_token(&self, user_id: Uuid) -> AppResult<()> {
        self.cache.delete(&keys::refresh_token(user_id)).await
    }

    /// Issues a single-use password reset token for the user.
    pub async fn issue_reset_token(&self, user_id: Uuid) -> AppResult<String> {
        let mut bytes = [0u8; RESET_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let token = URL_SAFE_NO_PAD.encode(bytes);

        // NX so a token can never silently claim another token's key.
        let key = keys::password_reset(&token);
        let stored = self
            .cache
            .set_nx(&key, &user_id.to_string(), self.reset_ttl)
            .await?;
        if !stored {
            return Err(AppError::internal("Reset token collision"));
        }
        Ok(token)
    }

    /// Consumes a reset token, returning the user it was issued to.
    ///
    /// The token is deleted before the user ID is returned, so a token can
    /// be redeemed at most once.
    pub async fn consume_reset_token(&self, token: &str) -> AppResult<Option<Uuid>> {
        let key = keys::password_reset(token);
        let Some(stored) = self.cache.get(&key).await? else {
            return Ok(None);
        };
        self.cache.delete(&key).await?;

        let user_id = stored
            .parse::<Uuid>()
            .map_err(|e| AppError::internal(format!("Corrupt reset token entry: {e}")))?;
        Ok(Some(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postforge_cache::memory::MemoryCacheProvider;
    use postforge_core::config::cache::MemoryCacheConfig;

    fn registry() -> RevocationRegistry {
        let provider = MemoryCacheProvider::new(&MemoryCacheConfig { max_capacity: 1000 });
        let cache = Arc::new(CacheManager::from_provider(Arc::new(provider)));
        let config = AuthConfig {
            jwt_secret: "test-secret".to_string(),
            jwt_access_ttl_hours: 24,
            jwt_refresh_ttl_days: 30,
            reset_token_ttl_minutes: 60,
            password_min_length: 8,
            max_failed_attempts: 5,
            lockout_duration_minutes: 30,
        };
        RevocationRegistry::new(&config, cache)
    }

    #[tokio::test]
    async fn test_blacklist_roundtrip() {
        let registry = registry();
        assert!(!registry.is_blacklisted("tok-a").await.unwrap());
        registry.blacklist_token("tok-a", 3600).await.unwrap();
        assert!(registry.is_blacklisted("tok-a").await.unwrap());
        assert!(!registry.is_blacklisted("tok-b").await.unwrap());
    }

    #[tokio::test]
    async fn test_refresh_token_is_one_per_user() {
        let registry = registry();
        let user = Uuid::new_v4();

        registry.store_refresh_token(user, "first").await.unwrap();
        assert!(registry.is_current_refresh_token(user, "first").await.unwrap());

        // A second login replaces the first device's token.
        registry.store_refresh_token(user, "second").await.unwrap();
        assert!(!registry.is_current_refresh_token(user, "first").await.unwrap());
        assert!(registry.is_current_refresh_token(user, "second").await.unwrap());

        registry.revoke_refresh_token(user).await.unwrap();
        assert!(!registry.is_current_refresh_token(user, "second").await.unwrap());
    }

    #[tokio::test]
    async fn test_reset_token_single_use() {
        let registry = registry();
        let user = Uuid::new_v4();

        let token = registry.issue_reset_token(user).await.unwrap();
        assert_eq!(registry.consume_reset_token(&token).await.unwrap(), Some(user));
        // Second redemption fails.
        assert_eq!(registry.consume_reset_token(&token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unknown_reset_token() {
        let registry = registry();
        assert_eq!(registry.consume_reset_token("nope").await.unwrap(), None);
    }
}
