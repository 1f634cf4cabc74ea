//! Password policy enforcement for new passwords.

use postforge_core::config::auth::AuthConfig;
use postforge_core::error::AppError;

/// Validates password strength against configured policies.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    /// Minimum password length.
    min_length: usize,
}

impl PasswordValidator {
    /// Creates a new validator from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
        }
    }

    /// Validates a password against all configured policies.
    ///
    /// Returns `Ok(())` if the password meets all requirements,
    /// or an error describing the first violation found.
    pub fn validate(&self, password: &str) -> Result<(), AppError> {
        if password.len() < self.min_length {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }

        if !password.chars().any(|c| c.is_uppercase()) {
            return Err(AppError::validation(
                "Password must contain at least one uppercase letter",
            ));
        }

        if !password.chars().any(|c| c.is_lowercase()) {
            return Err(AppError::validation(
                "Password must contain at least one lowercase letter",
            ));
        }

        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(AppError::validation(
                "Password must contain at least one digit",
            ));
        }

        // The character-class rules above are the policy. The entropy
        // estimate is advisory only; a passing password is never rejected
        // on score alone.
        let estimate = zxcvbn::zxcvbn(password, &[]);
        if estimate.score() < zxcvbn::Score::Three {
            tracing::warn!(score = ?estimate.score(), "Accepted password has a low entropy estimate");
        }

        Ok(())
    }

    /// Validates that a new password differs from the old one.
    pub fn validate_not_same(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        if old_password == new_password {
            return Err(AppError::validation(
                "New password must be different from the current password",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> PasswordValidator {
        PasswordValidator { min_length: 8 }
    }

    #[test]
    fn test_rejects_short() {
        assert!(validator().validate("Ab1!").is_err());
    }

    #[test]
    fn test_rejects_missing_classes() {
        assert!(validator().validate("alllowercase1").is_err());
        assert!(validator().validate("ALLUPPERCASE1").is_err());
        assert!(validator().validate("NoDigitsHere").is_err());
    }

    #[test]
    fn test_accepts_strong() {
        assert!(validator().validate("Tr4vels-through-Mordor").is_ok());
    }

    #[test]
    fn test_accepts_minimal_policy_password() {
        // Meets length plus all three character classes; a low entropy
        // estimate must not reject it.
        assert!(validator().validate("Passw0rd1").is_ok());
    }
}
