//! In-memory post store for testing and offline mode

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chirp_domain::{Clock, FEED_LIMIT, Post, PostStore, PostStoreError};
use uuid::Uuid;

/// In-memory post store implementation
pub struct InMemoryPostStore {
    posts: RwLock<Vec<Post>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryPostStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            posts: RwLock::new(vec![]),
            clock,
        }
    }

    /// Create a store seeded with posts
    pub fn with_posts(clock: Arc<dyn Clock>, posts: Vec<Post>) -> Self {
        Self {
            posts: RwLock::new(posts),
            clock,
        }
    }

    fn sorted_newest_first(mut posts: Vec<Post>) -> Vec<Post> {
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        posts.truncate(FEED_LIMIT);
        posts
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn list_recent(&self) -> Result<Vec<Post>, PostStoreError> {
        let posts = self
            .posts
            .read()
            .map_err(|e| PostStoreError::Database(e.to_string()))?;
        Ok(Self::sorted_newest_first(posts.clone()))
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Post, PostStoreError> {
        let posts = self
            .posts
            .read()
            .map_err(|e| PostStoreError::Database(e.to_string()))?;
        posts
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(PostStoreError::NotFound(id))
    }

    async fn list_by_author(&self, author_id: &str) -> Result<Vec<Post>, PostStoreError> {
        let posts = self
            .posts
            .read()
            .map_err(|e| PostStoreError::Database(e.to_string()))?;
        let by_author: Vec<Post> = posts
            .iter()
            .filter(|p| p.author_id == author_id)
            .cloned()
            .collect();
        Ok(Self::sorted_newest_first(by_author))
    }

    async fn create(&self, author_id: &str, content: &str) -> Result<Post, PostStoreError> {
        if content.trim().is_empty() {
            return Err(PostStoreError::EmptyContent);
        }

        let post = Post {
            id: Uuid::new_v4(),
            author_id: author_id.to_string(),
            content: content.to_string(),
            created_at: self.clock.now(),
        };

        let mut posts = self
            .posts
            .write()
            .map_err(|e| PostStoreError::Database(e.to_string()))?;
        posts.push(post.clone());

        Ok(post)
    }
}
