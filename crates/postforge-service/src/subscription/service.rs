//! Subscription management — plan listing, plan changes, and usage.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use postforge_auth::quota::{UsageGate, UsageSnapshot};
use postforge_core::error::AppError;
use postforge_core::result::AppResult;
use postforge_database::repositories::{PlanRepository, UserRepository};
use postforge_entity::plan::SubscriptionPlan;
use postforge_entity::user::{SubscriptionTier, User};

/// Handles subscription plans and tier changes.
#[derive(Debug, Clone)]
pub struct SubscriptionService {
    /// Plan repository.
    plan_repo: Arc<PlanRepository>,
    /// User repository.
    user_repo: Arc<UserRepository>,
    /// Usage gate, for the account usage view.
    usage_gate: Arc<UsageGate>,
}

impl SubscriptionService {
    /// Creates a new subscription service.
    pub fn new(
        plan_repo: Arc<PlanRepository>,
        user_repo: Arc<UserRepository>,
        usage_gate: Arc<UsageGate>,
    ) -> Self {
        Self {
            plan_repo,
            user_repo,
            usage_gate,
        }
    }

    /// Lists all purchasable plans.
    pub async fn list_plans(&self) -> AppResult<Vec<SubscriptionPlan>> {
        self.plan_repo.find_active().await
    }

    /// Current monthly usage for the account dashboard.
    pub async fn get_usage(&self, user_id: Uuid) -> AppResult<UsageSnapshot> {
        self.usage_gate.usage(user_id).await
    }

    /// Moves the user onto the plan for the given tier.
    ///
    /// Upgrades and downgrades both take effect immediately; on a
    /// downgrade the usage counter is clamped to the new allowance.
    pub async fn change_plan(&self, user_id: Uuid, tier: SubscriptionTier) -> AppResult<User> {
        let plan = self
            .plan_repo
            .find_by_tier(tier)
            .await?
            .ok_or_else(|| AppError::validation(format!("No active plan for tier '{tier}'")))?;

        let user = self
            .user_repo
            .update_tier(user_id, tier, plan.posts_per_month, "active")
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        info!(user_id = %user_id, tier = %tier, "Plan changed");
        Ok(user)
    }

    /// Cancels the paid subscription, dropping the user to the free tier.
    pub async fn cancel(&self, user_id: Uuid) -> AppResult<User> {
        let free_plan = self
            .plan_repo
            .find_by_tier(SubscriptionTier::Free)
            .await?
            .ok_or_else(|| AppError::internal("Free plan is not seeded"))?;

        let user = self
            .user_repo
            .update_tier(
                user_id,
                SubscriptionTier::Free,
                free_plan.posts_per_month,
                "cancelled",
            )
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        info!(user_id = %user_id, "Subscription cancelled");
        Ok(user)
    }

    /// Seeds the default plan rows if they are missing. Idempotent.
    pub async fn seed_default_plans(&self) -> AppResult<()> {
        let defaults = [
            (
                SubscriptionTier::Free,
                "Free",
                None,
                5,
                serde_json::json!(["5 posts per month", "Community support"]),
            ),
            (
                SubscriptionTier::Basic,
                "Basic",
                Some(1500),
                50,
                serde_json::json!(["50 posts per month", "Email support"]),
            ),
            (
                SubscriptionTier::Premium,
                "Premium",
                Some(2900),
                999,
                serde_json::json!([
                    "999 posts per month",
                    "Priority generation",
                    "Priority support"
                ]),
            ),
        ];

        for (tier, name, price, posts, features) in defaults {
            let inserted = self
                .plan_repo
                .seed(tier, name, price, posts, &features)
                .await?;
            if inserted {
                info!(tier = %tier, "Seeded subscription plan");
            }
        }
        Ok(())
    }
}
