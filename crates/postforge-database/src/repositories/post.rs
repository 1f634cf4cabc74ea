//! Blog post repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use postforge_core::error::{AppError, ErrorKind};
use postforge_core::result::AppResult;
use postforge_core::types::pagination::{PageRequest, PageResponse};
use postforge_entity::post::{BlogPost, CreatePost, PostStatus};

/// Repository for blog post rows and status transitions.
#[derive(Debug, Clone)]
pub struct PostRepository {
    pool: PgPool,
}

impl PostRepository {
    /// Create a new post repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a post by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<BlogPost>> {
        sqlx::query_as::<_, BlogPost>("SELECT * FROM blog_posts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find post", e))
    }

    /// List a user's posts with pagination, newest first.
    pub async fn find_by_user(
        &self,
        user_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<BlogPost>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blog_posts WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count posts", e))?;

        let posts = sqlx::query_as::<_, BlogPost>(
            r#"
            SELECT * FROM blog_posts
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list posts", e))?;

        Ok(PageResponse::new(
            posts,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    /// Insert a new pending post.
    pub async fn create(&self, post: &CreatePost) -> AppResult<BlogPost> {
        sqlx::query_as::<_, BlogPost>(
            r#"
            INSERT INTO blog_posts (user_id, title, topic, word_count)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(post.user_id)
        .bind(&post.title)
        .bind(&post.topic)
        .bind(post.word_count)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create post", e))
    }

    /// Move a post to `Generating`.
    pub async fn mark_generating(&self, id: Uuid) -> AppResult<()> {
        self.set_status(id, PostStatus::Generating).await
    }

    /// Commit generated content, moving the post to `Committed`.
    pub async fn commit_content(&self, id: Uuid, content: &str) -> AppResult<Option<BlogPost>> {
        sqlx::query_as::<_, BlogPost>(
            r#"
            UPDATE blog_posts
            SET content = $2,
                status = 'committed',
                error_message = NULL,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit post", e))
    }

    /// Mark a post as failed with an error detail.
    pub async fn mark_failed(&self, id: Uuid, error_message: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE blog_posts
            SET status = 'failed', error_message = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error_message)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark post failed", e))?;
        Ok(())
    }

    /// Delete a post owned by the given user. Returns `false` when no
    /// matching row exists.
    pub async fn delete_owned(&self, id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete post", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_status(&self, id: Uuid, status: PostStatus) -> AppResult<()> {
        sqlx::query("UPDATE blog_posts SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update post status", e)
            })?;
        Ok(())
    }
}
