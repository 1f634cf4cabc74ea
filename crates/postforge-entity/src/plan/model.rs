//! Subscription plan entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::user::SubscriptionTier;

/// A purchasable subscription plan.
///
/// Plans are seeded at startup and map one-to-one onto tiers. The
/// `posts_per_month` value is copied onto the user row as `posts_limit`
/// whenever the user changes plan.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SubscriptionPlan {
    /// Unique plan identifier.
    pub id: Uuid,
    /// The tier this plan grants.
    pub tier: SubscriptionTier,
    /// Display name, e.g. `"Premium"`.
    pub name: String,
    /// Monthly price in cents. `None` for the free plan.
    pub price_monthly_cents: Option<i32>,
    /// Monthly post allowance.
    pub posts_per_month: i32,
    /// Marketing feature list.
    pub features: serde_json::Value,
    /// Whether the plan can currently be selected.
    pub is_active: bool,
    /// When the plan was created.
    pub created_at: DateTime<Utc>,
}
