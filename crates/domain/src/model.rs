//! Domain models and value objects

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A stored micro-post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Unique post ID, assigned at creation, immutable
    pub id: Uuid,
    /// Identity-directory ID of the author, immutable once created
    pub author_id: String,
    /// Text payload, non-empty after trimming
    pub content: String,
    /// When the post was created, drives display order (newest first)
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Public profile projection of an identity-directory user
///
/// Owned and mutated entirely by the external directory; re-fetched per
/// request, never stored durably here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Identity-directory user ID
    pub id: String,
    /// Display handle, absent when the user never picked one
    pub username: Option<String>,
    /// Avatar URL
    pub profile_image_url: String,
}

/// One feed row: a post paired with its resolved author
///
/// Transient, produced per request and discarded with the response.
/// `author` is `None` when the directory did not resolve the post's
/// author id; the presentation layer renders a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub post: Post,
    pub author: Option<Author>,
}

/// The authenticated principal attempting an operation
///
/// Extracted at the request boundary and passed explicitly into
/// operations; reads without a caller are anonymous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// Identity-directory user ID of the caller
    pub user_id: String,
}

impl CallerIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}
