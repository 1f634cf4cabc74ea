//! Post generation status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a generated post.
///
/// Posts move `Pending -> Generating -> Committed` on success, or end in
/// `Failed` when generation gives up. A failed post does not consume a
/// post credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "post_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    /// Accepted but not yet started.
    Pending,
    /// Generation request in flight.
    Generating,
    /// Content stored and credit consumed.
    Committed,
    /// Generation failed, no credit consumed.
    Failed,
}

impl PostStatus {
    /// Whether the post is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::Failed)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Generating => "generating",
            Self::Committed => "committed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
