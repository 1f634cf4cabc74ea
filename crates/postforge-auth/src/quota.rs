//! Monthly post-credit enforcement.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use postforge_core::error::AppError;
use postforge_core::result::AppResult;
use postforge_database::repositories::UserRepository;
use postforge_entity::user::User;

/// A point-in-time view of a user's monthly usage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Posts consumed this month.
    pub used: i32,
    /// Monthly allowance.
    pub limit: i32,
    /// Credits left this month.
    pub remaining: i32,
    /// Share of the allowance consumed, 0.0 to 100.0.
    pub percentage: f64,
}

impl UsageSnapshot {
    /// Build a snapshot from raw counters.
    pub fn new(used: i32, limit: i32) -> Self {
        let percentage = if limit > 0 {
            (f64::from(used) / f64::from(limit) * 100.0).clamp(0.0, 100.0)
        } else {
            100.0
        };
        Self {
            used,
            limit,
            remaining: (limit - used).max(0),
            percentage,
        }
    }
}

/// Storage operations the gate needs: conditional consumption, refund,
/// and a counter read for error reporting.
#[async_trait]
pub trait CreditStore: Send + Sync + std::fmt::Debug + 'static {
    /// Consume one credit if any remain. Returns the updated
    /// `(used, limit)` pair, or `None` when the user was already at the
    /// limit (or does not exist).
    async fn try_consume_post_credit(&self, user_id: Uuid) -> AppResult<Option<(i32, i32)>>;

    /// Return one credit, flooring at zero.
    async fn release_post_credit(&self, user_id: Uuid) -> AppResult<()>;

    /// Current `(used, limit)` counters, or `None` for an unknown user.
    async fn usage_counters(&self, user_id: Uuid) -> AppResult<Option<(i32, i32)>>;
}

#[async_trait]
impl CreditStore for UserRepository {
    async fn try_consume_post_credit(&self, user_id: Uuid) -> AppResult<Option<(i32, i32)>> {
        UserRepository::try_consume_post_credit(self, user_id).await
    }

    async fn release_post_credit(&self, user_id: Uuid) -> AppResult<()> {
        UserRepository::release_post_credit(self, user_id).await
    }

    async fn usage_counters(&self, user_id: Uuid) -> AppResult<Option<(i32, i32)>> {
        Ok(self
            .find_by_id(user_id)
            .await?
            .map(|u| (u.posts_used_this_month, u.posts_limit)))
    }
}

/// Gate that enforces the monthly post allowance.
///
/// Consumption happens through a conditional increment in the store, so
/// the check and the increment are a single atomic statement and
/// concurrent requests cannot overshoot the limit.
#[derive(Debug, Clone)]
pub struct UsageGate {
    users: Arc<dyn CreditStore>,
}

impl UsageGate {
    /// Create a new usage gate over a credit store.
    pub fn new(users: impl CreditStore) -> Self {
        Self {
            users: Arc::new(users),
        }
    }

    /// Non-consuming pre-check against an already loaded user row.
    ///
    /// Only advisory: the authoritative check is the conditional
    /// increment in [`try_consume`](Self::try_consume).
    pub fn check(&self, user: &User) -> AppResult<()> {
        if user.has_posts_remaining() {
            Ok(())
        } else {
            Err(AppError::quota_exceeded(
                user.posts_used_this_month,
                user.posts_limit,
            ))
        }
    }

    /// Atomically consume one credit, or fail with a quota error.
    pub async fn try_consume(&self, user_id: Uuid) -> AppResult<UsageSnapshot> {
        if let Some((used, limit)) = self.users.try_consume_post_credit(user_id).await? {
            return Ok(UsageSnapshot::new(used, limit));
        }

        // The increment was refused. Re-read the counters to report
        // accurate numbers (or a missing user).
        let (used, limit) = self
            .users
            .usage_counters(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        Err(AppError::quota_exceeded(used, limit))
    }

    /// Return a credit after a failed generation.
    pub async fn refund(&self, user_id: Uuid) -> AppResult<()> {
        self.users.release_post_credit(user_id).await
    }

    /// Current usage for the account dashboard.
    pub async fn usage(&self, user_id: Uuid) -> AppResult<UsageSnapshot> {
        let (used, limit) = self
            .users
            .usage_counters(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        Ok(UsageSnapshot::new(used, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use postforge_core::error::ErrorKind;

    /// In-memory counter store with the same conditional-consume
    /// semantics as the SQL increment.
    #[derive(Debug)]
    struct CounterStore {
        counters: Mutex<(i32, i32)>,
    }

    impl CounterStore {
        fn with_limit(limit: i32) -> Self {
            Self {
                counters: Mutex::new((0, limit)),
            }
        }
    }

    #[async_trait]
    impl CreditStore for CounterStore {
        async fn try_consume_post_credit(&self, _user_id: Uuid) -> AppResult<Option<(i32, i32)>> {
            let mut guard = self.counters.lock().unwrap();
            if guard.0 < guard.1 {
                guard.0 += 1;
                Ok(Some(*guard))
            } else {
                Ok(None)
            }
        }

        async fn release_post_credit(&self, _user_id: Uuid) -> AppResult<()> {
            let mut guard = self.counters.lock().unwrap();
            guard.0 = (guard.0 - 1).max(0);
            Ok(())
        }

        async fn usage_counters(&self, _user_id: Uuid) -> AppResult<Option<(i32, i32)>> {
            Ok(Some(*self.counters.lock().unwrap()))
        }
    }

    #[test]
    fn test_snapshot_remaining() {
        let snap = UsageSnapshot::new(3, 5);
        assert_eq!(snap.remaining, 2);
        assert!((snap.percentage - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snapshot_percentage_caps_at_hundred() {
        // Zero-limit accounts and over-limit counters both read as spent.
        assert!((UsageSnapshot::new(0, 0).percentage - 100.0).abs() < f64::EPSILON);
        assert!((UsageSnapshot::new(7, 5).percentage - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snapshot_never_negative() {
        // A downgrade can leave used above the new limit briefly.
        let snap = UsageSnapshot::new(7, 5);
        assert_eq!(snap.remaining, 0);
    }

    #[tokio::test]
    async fn test_sequential_consumption_never_exceeds_limit() {
        let gate = UsageGate::new(CounterStore::with_limit(3));
        let user_id = Uuid::new_v4();

        for expected_used in 1..=3 {
            let snap = gate.try_consume(user_id).await.unwrap();
            assert_eq!(snap.used, expected_used);
            assert_eq!(snap.limit, 3);
        }

        let err = gate.try_consume(user_id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::QuotaExceeded);
        assert!(err.message.contains("3 of 3"));

        // The refused attempt must not have advanced the counter.
        let snap = gate.usage(user_id).await.unwrap();
        assert_eq!(snap.used, 3);
        assert_eq!(snap.remaining, 0);
    }

    #[tokio::test]
    async fn test_refund_restores_a_credit() {
        let gate = UsageGate::new(CounterStore::with_limit(1));
        let user_id = Uuid::new_v4();

        gate.try_consume(user_id).await.unwrap();
        assert!(gate.try_consume(user_id).await.is_err());

        gate.refund(user_id).await.unwrap();
        let snap = gate.try_consume(user_id).await.unwrap();
        assert_eq!(snap.used, 1);
    }
}
