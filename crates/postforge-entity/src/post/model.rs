//! Blog post entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::PostStatus;

/// A generated blog post owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BlogPost {
    /// Unique post identifier.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Post title.
    pub title: String,
    /// Topic prompt supplied by the user.
    pub topic: String,
    /// Generated body. Empty until the post is committed.
    pub content: String,
    /// Requested word count.
    pub word_count: i32,
    /// Generation lifecycle state.
    pub status: PostStatus,
    /// Error detail when the post failed.
    pub error_message: Option<String>,
    /// When the post was created.
    pub created_at: DateTime<Utc>,
    /// When the post was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to start generating a new post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePost {
    /// Owning user.
    pub user_id: Uuid,
    /// Post title.
    pub title: String,
    /// Topic prompt.
    pub topic: String,
    /// Requested word count.
    pub word_count: i32,
}
