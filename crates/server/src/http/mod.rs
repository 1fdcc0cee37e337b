//! HTTP layer exposing the remote-procedure operations
//!
//! Route names mirror the operation names callers know
//! (`posts.getAll`, `posts.create`, ...). Reads are anonymous;
//! `posts.create` requires the caller header set by the auth proxy.

mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::CALLER_HEADER;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use chirp_domain::{
    IdentityDirectory, PostStore,
    cache::QueryCache,
    model::FeedEntry,
    usecases::{ComposeConfig, ComposeUseCase, FeedUseCase},
};

/// Shared state for all request handlers
#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<FeedUseCase<dyn PostStore, dyn IdentityDirectory>>,
    pub compose: Arc<ComposeUseCase<dyn PostStore>>,
    pub identities: Arc<dyn IdentityDirectory>,
    pub feed_cache: Arc<QueryCache<Vec<FeedEntry>>>,
}

impl AppState {
    pub fn new(
        posts: Arc<dyn PostStore>,
        identities: Arc<dyn IdentityDirectory>,
        compose_config: ComposeConfig,
    ) -> Self {
        Self {
            feed: Arc::new(FeedUseCase::new(posts.clone(), identities.clone())),
            compose: Arc::new(ComposeUseCase::new(posts, compose_config)),
            identities,
            feed_cache: Arc::new(QueryCache::new()),
        }
    }
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/posts.getAll", get(handlers::get_all))
        .route("/api/posts.getPostById", get(handlers::get_post_by_id))
        .route(
            "/api/posts.getPostsByUserId",
            get(handlers::get_posts_by_user_id),
        )
        .route("/api/posts.create", post(handlers::create_post))
        .route(
            "/api/profile.getUserByUsername",
            get(handlers::get_user_by_username),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chirp_adapters::{identity::StubIdentityDirectory, post_store::InMemoryPostStore};
    use chirp_domain::{Author, Post, SystemClock};
    use serde_json::Value;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn author(id: &str, username: &str) -> Author {
        Author {
            id: id.to_string(),
            username: Some(username.to_string()),
            profile_image_url: format!("https://img.example.com/{}.png", id),
        }
    }

    fn seeded_post(id: u128, author_id: &str, content: &str, at: i64) -> Post {
        Post {
            id: Uuid::from_u128(id),
            author_id: author_id.to_string(),
            content: content.to_string(),
            created_at: OffsetDateTime::from_unix_timestamp(at).unwrap(),
        }
    }

    fn test_state(posts: Vec<Post>, users: Vec<Author>, compose_config: ComposeConfig) -> AppState {
        AppState::new(
            Arc::new(InMemoryPostStore::with_posts(Arc::new(SystemClock), posts)),
            Arc::new(StubIdentityDirectory::with_users(users)),
            compose_config,
        )
    }

    fn relaxed_compose() -> ComposeConfig {
        ComposeConfig {
            rate_limit_per_minute: None,
            ..Default::default()
        }
    }

    async fn spawn(state: AppState) -> String {
        let app = router(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_get_all_returns_newest_first_with_authors() {
        let base = spawn(test_state(
            vec![
                seeded_post(1, "a", "hi", 100),
                seeded_post(2, "b", "yo", 200),
            ],
            vec![author("a", "alice"), author("b", "bob")],
            relaxed_compose(),
        ))
        .await;

        let body: Value = reqwest::get(format!("{}/api/posts.getAll", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        let entries = body.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["post"]["content"], "yo");
        assert_eq!(entries[0]["author"]["username"], "bob");
        assert_eq!(entries[1]["post"]["content"], "hi");
        assert_eq!(entries[1]["author"]["username"], "alice");
    }

    #[tokio::test]
    async fn test_get_all_renders_unknown_author_as_null() {
        let base = spawn(test_state(
            vec![seeded_post(1, "ghost", "👻", 100)],
            vec![],
            relaxed_compose(),
        ))
        .await;

        let body: Value = reqwest::get(format!("{}/api/posts.getAll", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body[0]["post"]["content"], "👻");
        assert!(body[0]["author"].is_null());
    }

    #[tokio::test]
    async fn test_get_post_by_id_found_and_not_found() {
        let base = spawn(test_state(
            vec![seeded_post(7, "a", "hello", 100)],
            vec![author("a", "alice")],
            relaxed_compose(),
        ))
        .await;

        let found = reqwest::get(format!(
            "{}/api/posts.getPostById?id={}",
            base,
            Uuid::from_u128(7)
        ))
        .await
        .unwrap();
        assert_eq!(found.status(), 200);
        let entry: Value = found.json().await.unwrap();
        assert_eq!(entry["author"]["username"], "alice");

        let missing = reqwest::get(format!(
            "{}/api/posts.getPostById?id={}",
            base,
            Uuid::from_u128(999)
        ))
        .await
        .unwrap();
        assert_eq!(missing.status(), 404);
    }

    #[tokio::test]
    async fn test_posts_by_user_id_empty_is_ok() {
        let base = spawn(test_state(vec![], vec![], relaxed_compose())).await;

        let response = reqwest::get(format!("{}/api/posts.getPostsByUserId?userId=u1", base))
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_create_requires_caller_header() {
        let base = spawn(test_state(vec![], vec![], relaxed_compose())).await;

        let response = reqwest::Client::new()
            .post(format!("{}/api/posts.create", base))
            .json(&serde_json::json!({ "content": "👍" }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 401);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_and_non_emoji_content() {
        let base = spawn(test_state(vec![], vec![], relaxed_compose())).await;
        let client = reqwest::Client::new();

        for content in ["   ", "plain text"] {
            let response = client
                .post(format!("{}/api/posts.create", base))
                .header(CALLER_HEADER, "u1")
                .json(&serde_json::json!({ "content": content }))
                .send()
                .await
                .unwrap();

            assert_eq!(response.status(), 400, "content {:?}", content);
        }
    }

    #[tokio::test]
    async fn test_create_then_get_all_observes_the_write() {
        let base = spawn(test_state(
            vec![seeded_post(1, "a", "hi", 100)],
            vec![author("a", "alice"), author("u1", "uma")],
            relaxed_compose(),
        ))
        .await;
        let client = reqwest::Client::new();

        // Populate the cache first so the create must invalidate it
        let before: Value = client
            .get(format!("{}/api/posts.getAll", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(before.as_array().unwrap().len(), 1);

        let created = client
            .post(format!("{}/api/posts.create", base))
            .header(CALLER_HEADER, "u1")
            .json(&serde_json::json!({ "content": "👍" }))
            .send()
            .await
            .unwrap();
        assert_eq!(created.status(), 200);
        let post: Value = created.json().await.unwrap();
        assert_eq!(post["author_id"], "u1");

        let after: Value = client
            .get(format!("{}/api/posts.getAll", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let entries = after.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(
            entries
                .iter()
                .any(|e| e["post"]["content"] == "👍" && e["author"]["username"] == "uma")
        );
    }

    #[tokio::test]
    async fn test_create_rate_limit_maps_to_429() {
        let base = spawn(test_state(
            vec![],
            vec![],
            ComposeConfig {
                rate_limit_per_minute: Some(2),
                ..Default::default()
            },
        ))
        .await;
        let client = reqwest::Client::new();

        for _ in 0..2 {
            let ok = client
                .post(format!("{}/api/posts.create", base))
                .header(CALLER_HEADER, "u1")
                .json(&serde_json::json!({ "content": "🎉" }))
                .send()
                .await
                .unwrap();
            assert_eq!(ok.status(), 200);
        }

        let limited = client
            .post(format!("{}/api/posts.create", base))
            .header(CALLER_HEADER, "u1")
            .json(&serde_json::json!({ "content": "🎉" }))
            .send()
            .await
            .unwrap();
        assert_eq!(limited.status(), 429);
    }

    #[tokio::test]
    async fn test_get_user_by_username_found_and_not_found() {
        let base = spawn(test_state(
            vec![],
            vec![author("a", "alice")],
            relaxed_compose(),
        ))
        .await;

        let found = reqwest::get(format!(
            "{}/api/profile.getUserByUsername?username=alice",
            base
        ))
        .await
        .unwrap();
        assert_eq!(found.status(), 200);
        let profile: Value = found.json().await.unwrap();
        assert_eq!(profile["id"], "a");

        let missing = reqwest::get(format!(
            "{}/api/profile.getUserByUsername?username=nobody",
            base
        ))
        .await
        .unwrap();
        assert_eq!(missing.status(), 404);
        let error: Value = missing.json().await.unwrap();
        assert_eq!(error["error"], "Not found");
    }
}
