//! User self-service operations — profile viewing and password changes.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use postforge_auth::password::{PasswordHasher, PasswordValidator};
use postforge_core::error::AppError;
use postforge_core::result::AppResult;
use postforge_database::repositories::user::UserRepository;
use postforge_entity::user::User;
use postforge_entity::user::model::UpdateUser;

/// Handles user self-service operations.
#[derive(Debug, Clone)]
pub struct UserService {
    /// User repository.
    user_repo: Arc<UserRepository>,
    /// Password hasher.
    hasher: Arc<PasswordHasher>,
    /// Password validator.
    validator: Arc<PasswordValidator>,
}

/// Data for updating a user's own profile.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UpdateProfileRequest {
    /// New first name (optional).
    pub first_name: Option<String>,
    /// New last name (optional).
    pub last_name: Option<String>,
}

impl UserService {
    /// Creates a new user service.
    pub fn new(
        user_repo: Arc<UserRepository>,
        hasher: Arc<PasswordHasher>,
        validator: Arc<PasswordValidator>,
    ) -> Self {
        Self {
            user_repo,
            hasher,
            validator,
        }
    }

    /// Gets the user's full profile.
    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<User> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Updates the user's profile fields.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        req: UpdateProfileRequest,
    ) -> AppResult<User> {
        if let Some(first_name) = &req.first_name {
            if first_name.trim().is_empty() {
                return Err(AppError::validation("First name cannot be empty"));
            }
        }
        if let Some(last_name) = &req.last_name {
            if last_name.trim().is_empty() {
                return Err(AppError::validation("Last name cannot be empty"));
            }
        }

        let updated = self
            .user_repo
            .update_profile(&UpdateUser {
                id: user_id,
                first_name: req.first_name,
                last_name: req.last_name,
            })
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        info!(user_id = %user_id, "Profile updated");
        Ok(updated)
    }

    /// Changes the user's password.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let user = self.get_profile(user_id).await?;

        // Verify current password
        let valid = self
            .hasher
            .verify_password(current_password, &user.password_hash)?;
        if !valid {
            return Err(AppError::unauthorized("Current password is incorrect"));
        }

        // Validate new password
        self.validator.validate(new_password)?;
        self.validator
            .validate_not_same(current_password, new_password)?;

        // Hash and store
        let new_hash = self.hasher.hash_password(new_password)?;
        self.user_repo.update_password(user_id, &new_hash).await?;

        info!(user_id = %user_id, "Password changed");
        Ok(())
    }
}
