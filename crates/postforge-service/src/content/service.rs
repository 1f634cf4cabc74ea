//! Post generation service — quota-gated creation and the post
//! lifecycle state machine.

use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use postforge_auth::quota::UsageGate;
use postforge_core::error::AppError;
use postforge_core::result::AppResult;
use postforge_core::types::pagination::{PageRequest, PageResponse};
use postforge_database::repositories::PostRepository;
use postforge_entity::post::{BlogPost, CreatePost};

use super::generator::GeneratorClient;

/// Data for a new post generation request.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreatePostRequest {
    /// Post title.
    pub title: String,
    /// Topic prompt.
    pub topic: String,
    /// Requested word count (defaults to 500).
    pub word_count: Option<i32>,
}

/// Orchestrates post generation against the usage gate and generator.
#[derive(Debug, Clone)]
pub struct PostService {
    /// Post repository.
    post_repo: Arc<PostRepository>,
    /// Usage gate for monthly credits.
    usage_gate: Arc<UsageGate>,
    /// Generation client.
    generator: Arc<GeneratorClient>,
}

impl PostService {
    /// Creates a new post service.
    pub fn new(
        post_repo: Arc<PostRepository>,
        usage_gate: Arc<UsageGate>,
        generator: Arc<GeneratorClient>,
    ) -> Self {
        Self {
            post_repo,
            usage_gate,
            generator,
        }
    }

    /// Generates a new post for the user.
    ///
    /// A post credit is consumed up front through the atomic gate; if
    /// generation ultimately fails the credit is refunded and the post is
    /// left in the `failed` state.
    pub async fn create_post(&self, user_id: Uuid, req: CreatePostRequest) -> AppResult<BlogPost> {
        let title = req.title.trim();
        let topic = req.topic.trim();
        if title.is_empty() {
            return Err(AppError::validation("Title cannot be empty"));
        }
        if topic.is_empty() {
            return Err(AppError::validation("Topic cannot be empty"));
        }
        let word_count = req.word_count.unwrap_or(500);
        if !(100..=5000).contains(&word_count) {
            return Err(AppError::validation(
                "Word count must be between 100 and 5000",
            ));
        }

        // The quota check and increment are one atomic statement; a
        // refused increment means the month's allowance is spent.
        let usage = self.usage_gate.try_consume(user_id).await?;

        let post = self
            .post_repo
            .create(&CreatePost {
                user_id,
                title: title.to_string(),
                topic: topic.to_string(),
                word_count,
            })
            .await?;

        self.post_repo.mark_generating(post.id).await?;

        match self.generator.generate(title, topic, word_count).await {
            Ok(content) => {
                let committed = self
                    .post_repo
                    .commit_content(post.id, &content)
                    .await?
                    .ok_or_else(|| AppError::internal("Post vanished during generation"))?;
                info!(
                    user_id = %user_id,
                    post_id = %post.id,
                    used = usage.used,
                    limit = usage.limit,
                    "Post generated"
                );
                Ok(committed)
            }
            Err(e) => {
                error!(user_id = %user_id, post_id = %post.id, error = %e, "Generation failed");
                self.post_repo.mark_failed(post.id, &e.to_string()).await?;
                // Failed generations do not count against the allowance.
                self.usage_gate.refund(user_id).await?;
                Err(e)
            }
        }
    }

    /// Re-runs generation for an existing post.
    ///
    /// Consumes a fresh credit exactly like a new post; the credit is
    /// refunded when the rerun fails.
    pub async fn regenerate_post(&self, user_id: Uuid, post_id: Uuid) -> AppResult<BlogPost> {
        let post = self.get_post(user_id, post_id).await?;
        if !post.status.is_terminal() {
            return Err(AppError::conflict("Post generation is still in progress"));
        }

        self.usage_gate.try_consume(user_id).await?;
        self.post_repo.mark_generating(post.id).await?;

        match self
            .generator
            .generate(&post.title, &post.topic, post.word_count)
            .await
        {
            Ok(content) => {
                let committed = self
                    .post_repo
                    .commit_content(post.id, &content)
                    .await?
                    .ok_or_else(|| AppError::internal("Post vanished during generation"))?;
                info!(user_id = %user_id, post_id = %post.id, "Post regenerated");
                Ok(committed)
            }
            Err(e) => {
                error!(user_id = %user_id, post_id = %post.id, error = %e, "Regeneration failed");
                self.post_repo.mark_failed(post.id, &e.to_string()).await?;
                self.usage_gate.refund(user_id).await?;
                Err(e)
            }
        }
    }

    /// Fetches a post, enforcing ownership.
    pub async fn get_post(&self, user_id: Uuid, post_id: Uuid) -> AppResult<BlogPost> {
        let post = self
            .post_repo
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found"))?;
        if post.user_id != user_id {
            // Not-found rather than forbidden, so post IDs cannot be probed.
            return Err(AppError::not_found("Post not found"));
        }
        Ok(post)
    }

    /// Lists the user's posts, newest first.
    pub async fn list_posts(
        &self,
        user_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<BlogPost>> {
        self.post_repo.find_by_user(user_id, page).await
    }

    /// Deletes one of the user's posts.
    pub async fn delete_post(&self, user_id: Uuid, post_id: Uuid) -> AppResult<()> {
        let deleted = self.post_repo.delete_owned(post_id, user_id).await?;
        if !deleted {
            return Err(AppError::not_found("Post not found"));
        }
        info!(user_id = %user_id, post_id = %post_id, "Post deleted");
        Ok(())
    }
}
