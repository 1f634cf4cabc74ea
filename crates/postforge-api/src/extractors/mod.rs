//! Request extractors for the access-control chain.

pub mod auth;

pub use auth::{
    ActiveUser, BasicTier, CurrentUser, PremiumTier, RequireTier, TierRequirement, VerifiedUser,
};
