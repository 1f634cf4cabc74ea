//! Subscription tier enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subscription tiers available in the system.
///
/// Tiers are ordered by rank: Premium > Basic > Free. Access checks
/// compare ranks, so granting an endpoint to Basic automatically admits
/// Premium subscribers as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_tier", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    /// Default tier for new accounts.
    Free,
    /// Entry-level paid tier.
    Basic,
    /// Top paid tier.
    Premium,
}

impl SubscriptionTier {
    /// Return the tier rank (higher = more access).
    pub fn rank(&self) -> u8 {
        match self {
            Self::Free => 1,
            Self::Basic => 2,
            Self::Premium => 3,
        }
    }

    /// Check whether this tier grants at least the given tier's access.
    pub fn at_least(&self, other: SubscriptionTier) -> bool {
        self.rank() >= other.rank()
    }

    /// Return the tier as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Basic => "basic",
            Self::Premium => "premium",
        }
    }
}

impl Default for SubscriptionTier {
    fn default() -> Self {
        Self::Free
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SubscriptionTier {
    type Err = postforge_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "basic" => Ok(Self::Basic),
            "premium" => Ok(Self::Premium),
            _ => Err(postforge_core::AppError::validation(format!(
                "Invalid subscription tier: '{s}'. Expected one of: free, basic, premium"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_ordering() {
        assert!(SubscriptionTier::Premium.at_least(SubscriptionTier::Free));
        assert!(SubscriptionTier::Premium.at_least(SubscriptionTier::Premium));
        assert!(SubscriptionTier::Basic.at_least(SubscriptionTier::Free));
        assert!(!SubscriptionTier::Free.at_least(SubscriptionTier::Basic));
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "premium".parse::<SubscriptionTier>().unwrap(),
            SubscriptionTier::Premium
        );
        assert_eq!(
            "FREE".parse::<SubscriptionTier>().unwrap(),
            SubscriptionTier::Free
        );
        assert!("gold".parse::<SubscriptionTier>().is_err());
    }
}
