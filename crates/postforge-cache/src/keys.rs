//! Cache key builders for all PostForge cache entries.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the application uses.

use uuid::Uuid;

/// Prefix applied to all PostForge cache keys.
const PREFIX: &str = "postforge";

// ── Token revocation keys ──────────────────────────────────

/// Cache key marking a revoked token. Takes the SHA-256 hex digest of the
/// raw token so bearer credentials never land in the store.
pub fn blacklist(token_hash: &str) -> String {
    format!("{PREFIX}:blacklist:{token_hash}")
}

/// Cache key for the single active refresh token of a user.
pub fn refresh_token(user_id: Uuid) -> String {
    format!("{PREFIX}:refresh:{user_id}")
}

/// Cache key for a password reset token.
pub fn password_reset(token: &str) -> String {
    format!("{PREFIX}:pwreset:{token}")
}

// ── Rate limiting keys ─────────────────────────────────────

/// Cache key for a fixed-window rate limit bucket.
pub fn rate_limit(endpoint: &str, identifier: &str) -> String {
    format!("{PREFIX}:rate:{endpoint}:{identifier}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_key() {
        let id = Uuid::nil();
        assert_eq!(
            refresh_token(id),
            "postforge:refresh:00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_rate_limit_key() {
        assert_eq!(
            rate_limit("login", "10.0.0.1"),
            "postforge:rate:login:10.0.0.1"
        );
    }
}
