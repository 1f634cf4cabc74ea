//! User entity and subscription tier.

pub mod model;
pub mod tier;

pub use model::{CreateUser, UpdateUser, User};
pub use tier::SubscriptionTier;
