//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::tier::SubscriptionTier;

/// A registered user in the PostForge system.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Unique email address, used as the login name.
    pub email: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// First name (optional).
    pub first_name: Option<String>,
    /// Last name (optional).
    pub last_name: Option<String>,
    /// Subscription tier.
    pub tier: SubscriptionTier,
    /// Billing status of the subscription: `"active"` or `"cancelled"`.
    pub subscription_status: String,
    /// Posts consumed in the current billing month.
    pub posts_used_this_month: i32,
    /// Monthly post allowance for the current tier.
    pub posts_limit: i32,
    /// Whether the account is enabled.
    pub is_active: bool,
    /// Whether the email address has been verified.
    pub is_verified: bool,
    /// Number of consecutive failed login attempts.
    pub failed_login_attempts: i32,
    /// Account locked until this time (if locked).
    pub locked_until: Option<DateTime<Utc>>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// Check if the user account is currently locked out.
    pub fn is_locked(&self) -> bool {
        if let Some(locked_until) = self.locked_until {
            return Utc::now() < locked_until;
        }
        false
    }

    /// Check if the user can log in right now.
    pub fn can_login(&self) -> bool {
        self.is_active && !self.is_locked()
    }

    /// Check if the user has post credits remaining this month.
    pub fn has_posts_remaining(&self) -> bool {
        self.posts_used_this_month < self.posts_limit
    }

    /// Full display name, falling back to the email local part.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self
                .email
                .split('@')
                .next()
                .unwrap_or(&self.email)
                .to_string(),
        }
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address.
    pub email: String,
    /// Pre-hashed password.
    pub password_hash: String,
    /// First name (optional).
    pub first_name: Option<String>,
    /// Last name (optional).
    pub last_name: Option<String>,
    /// Initial tier.
    pub tier: SubscriptionTier,
    /// Monthly post allowance for the initial tier.
    pub posts_limit: i32,
}

/// Data for updating an existing user's profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUser {
    /// The user ID to update.
    pub id: Uuid,
    /// New first name.
    pub first_name: Option<String>,
    /// New last name.
    pub last_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "writer@example.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            first_name: None,
            last_name: None,
            tier: SubscriptionTier::Free,
            subscription_status: "active".to_string(),
            posts_used_this_month: 0,
            posts_limit: 5,
            is_active: true,
            is_verified: false,
            failed_login_attempts: 0,
            locked_until: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_lockout_window() {
        let mut user = sample_user();
        assert!(user.can_login());

        user.locked_until = Some(Utc::now() + Duration::minutes(30));
        assert!(user.is_locked());
        assert!(!user.can_login());

        user.locked_until = Some(Utc::now() - Duration::minutes(1));
        assert!(!user.is_locked());
    }

    #[test]
    fn test_posts_remaining() {
        let mut user = sample_user();
        assert!(user.has_posts_remaining());
        user.posts_used_this_month = 5;
        assert!(!user.has_posts_remaining());
    }

    #[test]
    fn test_display_name_fallback() {
        let mut user = sample_user();
        assert_eq!(user.display_name(), "writer");
        user.first_name = Some("Ada".to_string());
        user.last_name = Some("Lovelace".to_string());
        assert_eq!(user.display_name(), "Ada Lovelace");
    }
}
