//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::model::{Author, Post};

/// Upper bound on posts returned by any list call
pub const FEED_LIMIT: usize = 100;

/// Error type for post store operations
#[derive(Debug, Error)]
pub enum PostStoreError {
    #[error("Post not found: {0}")]
    NotFound(Uuid),
    #[error("Content must not be empty")]
    EmptyContent,
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for the durable post store
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Most recent posts, newest first, at most [`FEED_LIMIT`]
    async fn list_recent(&self) -> Result<Vec<Post>, PostStoreError>;

    /// Single post lookup
    async fn get_by_id(&self, id: Uuid) -> Result<Post, PostStoreError>;

    /// All posts by one author, same ordering and cap as `list_recent`
    async fn list_by_author(&self, author_id: &str) -> Result<Vec<Post>, PostStoreError>;

    /// Insert a new post, assigning its ID and creation time
    async fn create(&self, author_id: &str, content: &str) -> Result<Post, PostStoreError>;
}

/// Error type for identity directory operations
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limited, retry after: {0:?}")]
    RateLimited(Option<std::time::Duration>),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Directory unavailable: {0}")]
    Unavailable(String),
}

/// Port for the external identity directory
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Resolve up to [`FEED_LIMIT`] user IDs in one batched call.
    ///
    /// IDs the directory does not recognize are absent from the returned
    /// map; callers treat a missing entry as "author unknown", not as an
    /// error.
    async fn resolve(&self, ids: &[String]) -> Result<HashMap<String, Author>, IdentityError>;

    /// Look up a single user by display handle
    async fn find_by_username(&self, username: &str) -> Result<Option<Author>, IdentityError>;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
