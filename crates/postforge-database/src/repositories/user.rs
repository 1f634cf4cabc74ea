//! User repository implementation.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use postforge_core::error::{AppError, ErrorKind};
use postforge_core::result::AppResult;
use postforge_entity::user::model::{CreateUser, UpdateUser};
use postforge_entity::user::{SubscriptionTier, User};

/// Repository for user CRUD and quota operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))
    }

    /// Find a user by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by email", e)
            })
    }

    /// Insert a new user row.
    pub async fn create(&self, user: &CreateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, tier, posts_limit)
            VALUES (LOWER($1), $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.tier)
        .bind(user.posts_limit)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict("A user with this email already exists")
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to create user", e)
            }
        })
    }

    /// Update profile fields.
    pub async fn update_profile(&self, update: &UpdateUser) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(update.id)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update user", e))
    }

    /// Replace the stored password hash.
    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update password", e))?;
        Ok(())
    }

    /// Mark the user's email as verified.
    pub async fn mark_verified(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE users SET is_verified = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark verified", e))?;
        Ok(())
    }

    /// Record a successful login: clear the failure counter and lockout.
    pub async fn record_login_success(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET failed_login_attempts = 0,
                locked_until = NULL,
                last_login_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record login", e))?;
        Ok(())
    }

    /// Record a failed login attempt, locking the account once the
    /// threshold is crossed. Returns the new failure count.
    pub async fn record_login_failure(
        &self,
        id: Uuid,
        max_attempts: i32,
        lockout_minutes: u64,
    ) -> AppResult<i32> {
        let locked_until = Utc::now() + Duration::minutes(lockout_minutes as i64);
        let count: i32 = sqlx::query_scalar(
            r#"
            UPDATE users
            SET failed_login_attempts = failed_login_attempts + 1,
                locked_until = CASE
                    WHEN failed_login_attempts + 1 >= $2 THEN $3
                    ELSE locked_until
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING failed_login_attempts
            "#,
        )
        .bind(id)
        .bind(max_attempts)
        .bind(locked_until)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record login failure", e)
        })?;
        Ok(count)
    }

    /// Move the user onto a new tier and allowance.
    ///
    /// Usage is clamped to the new limit so a downgrade cannot leave the
    /// user with a negative remaining balance.
    pub async fn update_tier(
        &self,
        id: Uuid,
        tier: SubscriptionTier,
        posts_limit: i32,
        subscription_status: &str,
    ) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET tier = $2,
                posts_limit = $3,
                posts_used_this_month = LEAST(posts_used_this_month, $3),
                subscription_status = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tier)
        .bind(posts_limit)
        .bind(subscription_status)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update tier", e))
    }

    /// Atomically consume one post credit.
    ///
    /// The `WHERE` clause makes the increment conditional, so two
    /// concurrent requests can never push usage past the limit. Returns
    /// the updated `(used, limit)` pair, or `None` when the user was
    /// already at their limit (or does not exist).
    pub async fn try_consume_post_credit(&self, id: Uuid) -> AppResult<Option<(i32, i32)>> {
        sqlx::query_as::<_, (i32, i32)>(
            r#"
            UPDATE users
            SET posts_used_this_month = posts_used_this_month + 1,
                updated_at = NOW()
            WHERE id = $1 AND posts_used_this_month < posts_limit
            RETURNING posts_used_this_month, posts_limit
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to consume post credit", e))
    }

    /// Return a post credit, used when generation fails after the credit
    /// was consumed.
    pub async fn release_post_credit(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET posts_used_this_month = GREATEST(posts_used_this_month - 1, 0),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to release post credit", e))?;
        Ok(())
    }

    /// Zero the monthly usage counter for every user. Intended to be run
    /// by an external scheduler at the start of each billing month.
    pub async fn reset_monthly_usage(&self) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE users SET posts_used_this_month = 0, updated_at = NOW()",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to reset monthly usage", e)
        })?;
        Ok(result.rows_affected())
    }

    /// Delete a user and all owned rows (posts cascade).
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete user", e))?;
        Ok(result.rows_affected() > 0)
    }
}

/// Check whether a sqlx error is a Postgres unique constraint violation.
fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505")
    )
}
