//! End-to-end token lifecycle tests over the in-memory cache.
//!
//! These cover the session flows that span the JWT layer and the
//! revocation registry together: issue, rotate, revoke, and the
//! single-use password reset path.

use std::sync::Arc;

use uuid::Uuid;

use postforge_api::dto::response::TokenResponse;
use postforge_auth::jwt::decoder::JwtDecoder;
use postforge_auth::jwt::encoder::JwtEncoder;
use postforge_auth::revocation::RevocationRegistry;
use postforge_cache::memory::MemoryCacheProvider;
use postforge_cache::provider::CacheManager;
use postforge_core::config::auth::AuthConfig;
use postforge_core::config::cache::MemoryCacheConfig;

fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "integration-test-secret".to_string(),
        jwt_access_ttl_hours: 24,
        jwt_refresh_ttl_days: 30,
        reset_token_ttl_minutes: 60,
        password_min_length: 8,
        max_failed_attempts: 5,
        lockout_duration_minutes: 30,
    }
}

struct TokenStack {
    encoder: JwtEncoder,
    decoder: JwtDecoder,
    revocation: RevocationRegistry,
}

impl TokenStack {
    fn new() -> Self {
        let config = auth_config();
        let provider = MemoryCacheProvider::new(&MemoryCacheConfig { max_capacity: 1000 });
        let cache = Arc::new(CacheManager::from_provider(Arc::new(provider)));
        Self {
            encoder: JwtEncoder::new(&config),
            decoder: JwtDecoder::new(&config),
            revocation: RevocationRegistry::new(&config, cache),
        }
    }
}

#[tokio::test]
async fn test_issue_and_decode_pair() {
    let stack = TokenStack::new();
    let user_id = Uuid::new_v4();

    let pair = stack
        .encoder
        .generate_token_pair(user_id, "alice@example.com")
        .unwrap();

    let access = stack.decoder.decode_access_token(&pair.access_token).unwrap();
    assert_eq!(access.user_id(), user_id);
    assert_eq!(access.email, "alice@example.com");

    let refresh = stack
        .decoder
        .decode_refresh_token(&pair.refresh_token)
        .unwrap();
    assert_eq!(refresh.user_id(), user_id);

    // Tokens are not interchangeable across types.
    assert!(stack.decoder.decode_access_token(&pair.refresh_token).is_err());
    assert!(stack.decoder.decode_refresh_token(&pair.access_token).is_err());
}

#[tokio::test]
async fn test_back_to_back_pairs_are_distinct() {
    let stack = TokenStack::new();
    let user_id = Uuid::new_v4();

    // Claim timestamps are second-granular; the jti nonce is what keeps
    // pairs minted in the same second from colliding.
    let first = stack
        .encoder
        .generate_token_pair(user_id, "dave@example.com")
        .unwrap();
    let second = stack
        .encoder
        .generate_token_pair(user_id, "dave@example.com")
        .unwrap();

    assert_ne!(first.access_token, second.access_token);
    assert_ne!(first.refresh_token, second.refresh_token);
}

#[tokio::test]
async fn test_token_response_carries_full_pair() {
    let stack = TokenStack::new();
    let user_id = Uuid::new_v4();

    let pair = stack
        .encoder
        .generate_token_pair(user_id, "erin@example.com")
        .unwrap();
    let response = TokenResponse::from(pair);

    assert!(!response.access_token.is_empty());
    assert!(!response.refresh_token.is_empty());
    assert_eq!(response.token_type, "bearer");
    assert!(response.expires_in > 0);
}

#[tokio::test]
async fn test_rotation_invalidates_previous_refresh_token() {
    let stack = TokenStack::new();
    let user_id = Uuid::new_v4();

    let first = stack
        .encoder
        .generate_token_pair(user_id, "bob@example.com")
        .unwrap();
    stack
        .revocation
        .store_refresh_token(user_id, &first.refresh_token)
        .await
        .unwrap();
    assert!(
        stack
            .revocation
            .is_current_refresh_token(user_id, &first.refresh_token)
            .await
            .unwrap()
    );

    // Simulate a refresh: blacklist the old token for its remaining
    // lifetime and store the replacement.
    let claims = stack
        .decoder
        .decode_refresh_token(&first.refresh_token)
        .unwrap();
    stack
        .revocation
        .blacklist_token(&first.refresh_token, claims.remaining_ttl_seconds())
        .await
        .unwrap();

    let second = stack
        .encoder
        .generate_token_pair(user_id, "bob@example.com")
        .unwrap();
    stack
        .revocation
        .store_refresh_token(user_id, &second.refresh_token)
        .await
        .unwrap();

    assert!(
        stack
            .revocation
            .is_blacklisted(&first.refresh_token)
            .await
            .unwrap()
    );
    assert!(
        !stack
            .revocation
            .is_current_refresh_token(user_id, &first.refresh_token)
            .await
            .unwrap()
    );
    assert!(
        stack
            .revocation
            .is_current_refresh_token(user_id, &second.refresh_token)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_logout_blacklists_access_token() {
    let stack = TokenStack::new();
    let user_id = Uuid::new_v4();

    let pair = stack
        .encoder
        .generate_token_pair(user_id, "carol@example.com")
        .unwrap();
    let claims = stack.decoder.decode_access_token(&pair.access_token).unwrap();

    stack
        .revocation
        .blacklist_token(&pair.access_token, claims.remaining_ttl_seconds())
        .await
        .unwrap();
    stack.revocation.revoke_refresh_token(user_id).await.unwrap();

    // The token still decodes. Revocation lives in the registry, not
    // the signature.
    assert!(stack.decoder.decode_access_token(&pair.access_token).is_ok());
    assert!(
        stack
            .revocation
            .is_blacklisted(&pair.access_token)
            .await
            .unwrap()
    );
    assert!(
        !stack
            .revocation
            .is_current_refresh_token(user_id, &pair.refresh_token)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_reset_token_consumed_exactly_once() {
    let stack = TokenStack::new();
    let user_id = Uuid::new_v4();

    let token = stack.revocation.issue_reset_token(user_id).await.unwrap();
    assert_eq!(
        stack.revocation.consume_reset_token(&token).await.unwrap(),
        Some(user_id)
    );
    assert_eq!(stack.revocation.consume_reset_token(&token).await.unwrap(), None);
}

#[tokio::test]
async fn test_wrong_secret_rejected() {
    let stack = TokenStack::new();
    let user_id = Uuid::new_v4();

    let pair = stack
        .encoder
        .generate_token_pair(user_id, "dave@example.com")
        .unwrap();

    let mut other_config = auth_config();
    other_config.jwt_secret = "a-different-secret".to_string();
    let other_decoder = JwtDecoder::new(&other_config);

    assert!(other_decoder.decode_access_token(&pair.access_token).is_err());
}
