//! Feed assembly use case
//!
//! Posts and authors live in disjoint systems, so the join happens here:
//! fetch the ordered posts, resolve the distinct author ids in one batched
//! directory call, and zip the two back together in post order.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    model::{Author, FeedEntry, Post},
    ports::{IdentityDirectory, PostStore, PostStoreError},
};

/// Errors from feed assembly
///
/// Identity-directory failures are absent on purpose: author resolution
/// degrades to `author: None` instead of failing the feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Post not found")]
    NotFound,
    #[error("Post store error: {0}")]
    Store(String),
}

impl From<PostStoreError> for FeedError {
    fn from(err: PostStoreError) -> Self {
        match err {
            PostStoreError::NotFound(_) => FeedError::NotFound,
            other => FeedError::Store(other.to_string()),
        }
    }
}

/// Joins posts to their authors by id
pub struct FeedUseCase<P, I>
where
    P: PostStore + ?Sized,
    I: IdentityDirectory + ?Sized,
{
    posts: Arc<P>,
    identities: Arc<I>,
}

impl<P, I> FeedUseCase<P, I>
where
    P: PostStore + ?Sized,
    I: IdentityDirectory + ?Sized,
{
    pub fn new(posts: Arc<P>, identities: Arc<I>) -> Self {
        Self { posts, identities }
    }

    /// Global feed: the most recent posts with resolved authors
    pub async fn global_feed(&self) -> Result<Vec<FeedEntry>, FeedError> {
        let posts = self.posts.list_recent().await?;
        Ok(self.assemble(posts).await)
    }

    /// Profile feed: one author's posts, newest first
    pub async fn feed_for_author(&self, author_id: &str) -> Result<Vec<FeedEntry>, FeedError> {
        let posts = self.posts.list_by_author(author_id).await?;
        Ok(self.assemble(posts).await)
    }

    /// Single post with its resolved author
    pub async fn entry_for_post(&self, id: Uuid) -> Result<FeedEntry, FeedError> {
        let post = self.posts.get_by_id(id).await?;
        let authors = self.resolve_authors(std::slice::from_ref(&post)).await;
        let author = authors.get(&post.author_id).cloned();
        Ok(FeedEntry { post, author })
    }

    /// Pair each post with its author, preserving input order exactly
    async fn assemble(&self, posts: Vec<Post>) -> Vec<FeedEntry> {
        let authors = self.resolve_authors(&posts).await;

        posts
            .into_iter()
            .map(|post| {
                let author = authors.get(&post.author_id).cloned();
                FeedEntry { post, author }
            })
            .collect()
    }

    /// One batched directory call for the distinct author ids.
    ///
    /// An empty post list never reaches the directory, and a failed
    /// resolution yields an empty map so the feed still renders.
    async fn resolve_authors(&self, posts: &[Post]) -> HashMap<String, Author> {
        if posts.is_empty() {
            return HashMap::new();
        }

        let mut ids: Vec<String> = Vec::new();
        for post in posts {
            if !ids.contains(&post.author_id) {
                ids.push(post.author_id.clone());
            }
        }

        match self.identities.resolve(&ids).await {
            Ok(authors) => authors,
            Err(e) => {
                tracing::warn!(error = %e, "Identity resolution failed, serving feed without authors");
                HashMap::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::IdentityError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use time::OffsetDateTime;

    struct FakePostStore {
        posts: Vec<Post>,
    }

    #[async_trait]
    impl PostStore for FakePostStore {
        async fn list_recent(&self) -> Result<Vec<Post>, PostStoreError> {
            Ok(self.posts.clone())
        }

        async fn get_by_id(&self, id: Uuid) -> Result<Post, PostStoreError> {
            self.posts
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or(PostStoreError::NotFound(id))
        }

        async fn list_by_author(&self, author_id: &str) -> Result<Vec<Post>, PostStoreError> {
            Ok(self
                .posts
                .iter()
                .filter(|p| p.author_id == author_id)
                .cloned()
                .collect())
        }

        async fn create(&self, _author_id: &str, _content: &str) -> Result<Post, PostStoreError> {
            unimplemented!("not used by feed tests")
        }
    }

    /// Records every `resolve` call and answers from a fixed set of users
    struct RecordingDirectory {
        users: Vec<Author>,
        calls: Mutex<Vec<Vec<String>>>,
        fail: bool,
    }

    impl RecordingDirectory {
        fn with_users(users: Vec<Author>) -> Self {
            Self {
                users,
                calls: Mutex::new(vec![]),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                users: vec![],
                calls: Mutex::new(vec![]),
                fail: true,
            }
        }

        fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl IdentityDirectory for RecordingDirectory {
        async fn resolve(
            &self,
            ids: &[String],
        ) -> Result<HashMap<String, Author>, IdentityError> {
            self.calls.lock().unwrap().push(ids.to_vec());

            if self.fail {
                return Err(IdentityError::Unavailable("directory down".to_string()));
            }

            Ok(self
                .users
                .iter()
                .filter(|u| ids.contains(&u.id))
                .cloned()
                .map(|u| (u.id.clone(), u))
                .collect())
        }

        async fn find_by_username(
            &self,
            username: &str,
        ) -> Result<Option<Author>, IdentityError> {
            Ok(self
                .users
                .iter()
                .find(|u| u.username.as_deref() == Some(username))
                .cloned())
        }
    }

    fn post(id: u128, author_id: &str, content: &str, at: i64) -> Post {
        Post {
            id: Uuid::from_u128(id),
            author_id: author_id.to_string(),
            content: content.to_string(),
            created_at: OffsetDateTime::from_unix_timestamp(at).unwrap(),
        }
    }

    fn author(id: &str, username: &str) -> Author {
        Author {
            id: id.to_string(),
            username: Some(username.to_string()),
            profile_image_url: format!("https://img.example.com/{}.png", id),
        }
    }

    #[tokio::test]
    async fn test_duplicate_author_ids_resolved_once_deduplicated() {
        let store = Arc::new(FakePostStore {
            posts: vec![
                post(1, "a", "one", 3),
                post(2, "b", "two", 2),
                post(3, "a", "three", 1),
            ],
        });
        let directory = Arc::new(RecordingDirectory::with_users(vec![
            author("a", "alice"),
            author("b", "bob"),
        ]));
        let usecase = FeedUseCase::new(store, directory.clone());

        let entries = usecase.global_feed().await.unwrap();

        assert_eq!(entries.len(), 3);
        let calls = directory.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_output_order_matches_input_order() {
        let posts = vec![
            post(1, "b", "newest", 3),
            post(2, "a", "middle", 2),
            post(3, "b", "oldest", 1),
        ];
        let store = Arc::new(FakePostStore {
            posts: posts.clone(),
        });
        let directory = Arc::new(RecordingDirectory::with_users(vec![
            author("a", "alice"),
            author("b", "bob"),
        ]));
        let usecase = FeedUseCase::new(store, directory);

        let entries = usecase.global_feed().await.unwrap();

        let ids: Vec<Uuid> = entries.iter().map(|e| e.post.id).collect();
        let expected: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_empty_feed_skips_directory_call() {
        let store = Arc::new(FakePostStore { posts: vec![] });
        let directory = Arc::new(RecordingDirectory::with_users(vec![]));
        let usecase = FeedUseCase::new(store, directory.clone());

        let entries = usecase.global_feed().await.unwrap();

        assert!(entries.is_empty());
        assert!(directory.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unresolved_author_yields_none_not_error() {
        let store = Arc::new(FakePostStore {
            posts: vec![post(1, "a", "known", 2), post(2, "ghost", "unknown", 1)],
        });
        let directory = Arc::new(RecordingDirectory::with_users(vec![author("a", "alice")]));
        let usecase = FeedUseCase::new(store, directory);

        let entries = usecase.global_feed().await.unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].author.as_ref().and_then(|a| a.username.as_deref()),
            Some("alice")
        );
        assert!(entries[1].author.is_none());
    }

    #[tokio::test]
    async fn test_directory_failure_degrades_instead_of_dropping_posts() {
        let store = Arc::new(FakePostStore {
            posts: vec![post(1, "a", "one", 2), post(2, "b", "two", 1)],
        });
        let directory = Arc::new(RecordingDirectory::failing());
        let usecase = FeedUseCase::new(store, directory);

        let entries = usecase.global_feed().await.unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.author.is_none()));
    }

    #[tokio::test]
    async fn test_entry_for_post_resolves_author() {
        let store = Arc::new(FakePostStore {
            posts: vec![post(7, "a", "hello", 1)],
        });
        let directory = Arc::new(RecordingDirectory::with_users(vec![author("a", "alice")]));
        let usecase = FeedUseCase::new(store, directory);

        let entry = usecase.entry_for_post(Uuid::from_u128(7)).await.unwrap();

        assert_eq!(entry.post.content, "hello");
        assert_eq!(
            entry.author.and_then(|a| a.username),
            Some("alice".to_string())
        );
    }

    #[tokio::test]
    async fn test_entry_for_missing_post_is_not_found() {
        let store = Arc::new(FakePostStore { posts: vec![] });
        let directory = Arc::new(RecordingDirectory::with_users(vec![]));
        let usecase = FeedUseCase::new(store, directory.clone());

        let result = usecase.entry_for_post(Uuid::from_u128(9)).await;

        assert!(matches!(result, Err(FeedError::NotFound)));
        assert!(directory.calls().is_empty());
    }

    #[tokio::test]
    async fn test_feed_for_author_only_returns_their_posts() {
        let store = Arc::new(FakePostStore {
            posts: vec![
                post(1, "a", "mine", 3),
                post(2, "b", "theirs", 2),
                post(3, "a", "also mine", 1),
            ],
        });
        let directory = Arc::new(RecordingDirectory::with_users(vec![author("a", "alice")]));
        let usecase = FeedUseCase::new(store, directory);

        let entries = usecase.feed_for_author("a").await.unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.post.author_id == "a"));
    }
}
