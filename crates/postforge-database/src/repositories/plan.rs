//! Subscription plan repository implementation.

use sqlx::PgPool;

use postforge_core::error::{AppError, ErrorKind};
use postforge_core::result::AppResult;
use postforge_entity::plan::SubscriptionPlan;
use postforge_entity::user::SubscriptionTier;

/// Repository for subscription plan lookups and seeding.
#[derive(Debug, Clone)]
pub struct PlanRepository {
    pool: PgPool,
}

impl PlanRepository {
    /// Create a new plan repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List all active plans, cheapest first.
    pub async fn find_active(&self) -> AppResult<Vec<SubscriptionPlan>> {
        sqlx::query_as::<_, SubscriptionPlan>(
            r#"
            SELECT * FROM subscription_plans
            WHERE is_active = TRUE
            ORDER BY COALESCE(price_monthly_cents, 0) ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list plans", e))
    }

    /// Find the active plan for a tier.
    pub async fn find_by_tier(&self, tier: SubscriptionTier) -> AppResult<Option<SubscriptionPlan>> {
        sqlx::query_as::<_, SubscriptionPlan>(
            "SELECT * FROM subscription_plans WHERE tier = $1 AND is_active = TRUE",
        )
        .bind(tier)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find plan by tier", e))
    }

    /// Insert a plan if no plan for its tier exists yet. Returns `true`
    /// when a row was inserted.
    pub async fn seed(
        &self,
        tier: SubscriptionTier,
        name: &str,
        price_monthly_cents: Option<i32>,
        posts_per_month: i32,
        features: &serde_json::Value,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO subscription_plans (tier, name, price_monthly_cents, posts_per_month, features)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (tier) DO NOTHING
            "#,
        )
        .bind(tier)
        .bind(name)
        .bind(price_monthly_cents)
        .bind(posts_per_month)
        .bind(features)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to seed plan", e))?;
        Ok(result.rows_affected() > 0)
    }
}
