//! Subscription plan entity.

pub mod model;

pub use model::SubscriptionPlan;
