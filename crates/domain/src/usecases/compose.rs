//! Post composition use case
//!
//! Validates new post content and writes it to the store under the
//! authenticated caller's identity. Validation rejects before any write.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use regex::Regex;

use crate::{
    model::{CallerIdentity, Post},
    ports::{PostStore, PostStoreError},
};

/// Configuration for the compose use case
#[derive(Debug, Clone)]
pub struct ComposeConfig {
    /// Maximum content length in characters
    pub max_chars: usize,
    /// Restrict content to emoji, the product's signature constraint
    pub emoji_only: bool,
    /// Max posts per caller per minute (None = unlimited)
    pub rate_limit_per_minute: Option<u32>,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            max_chars: 280,
            emoji_only: true,
            rate_limit_per_minute: Some(3),
        }
    }
}

/// Errors from post composition
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("Sign in to post")]
    Unauthenticated,
    #[error("{0}")]
    Validation(String),
    #[error("Too many posts, slow down")]
    RateLimited,
    #[error("Post store error: {0}")]
    Store(String),
}

impl From<PostStoreError> for ComposeError {
    fn from(err: PostStoreError) -> Self {
        match err {
            PostStoreError::EmptyContent => {
                ComposeError::Validation("content must not be empty".to_string())
            }
            other => ComposeError::Store(other.to_string()),
        }
    }
}

/// Validates and writes new posts
pub struct ComposeUseCase<P>
where
    P: PostStore + ?Sized,
{
    posts: Arc<P>,
    config: ComposeConfig,
    emoji_pattern: Regex,
    rate_limiter: CallerRateLimiter,
}

impl<P> ComposeUseCase<P>
where
    P: PostStore + ?Sized,
{
    pub fn new(posts: Arc<P>, config: ComposeConfig) -> Self {
        // Pictographic or emoji-component code points only (keycaps, ZWJ
        // sequences, skin tones).
        let emoji_pattern = Regex::new(r"^(?:\p{Extended_Pictographic}|\p{Emoji_Component})+$")
            .expect("emoji pattern is valid");

        let rate_limiter = CallerRateLimiter::new(config.rate_limit_per_minute);

        Self {
            posts,
            config,
            emoji_pattern,
            rate_limiter,
        }
    }

    /// Validate `raw_content` and persist it for `caller`.
    ///
    /// Absent caller identity fails before any other check, and no
    /// validation failure reaches the store.
    pub async fn submit(
        &self,
        caller: Option<&CallerIdentity>,
        raw_content: &str,
    ) -> Result<Post, ComposeError> {
        let Some(caller) = caller else {
            return Err(ComposeError::Unauthenticated);
        };

        let content = raw_content.trim();
        if content.is_empty() {
            return Err(ComposeError::Validation(
                "content must not be empty".to_string(),
            ));
        }

        if content.chars().count() > self.config.max_chars {
            return Err(ComposeError::Validation(format!(
                "content exceeds {} characters",
                self.config.max_chars
            )));
        }

        if self.config.emoji_only && !self.emoji_pattern.is_match(content) {
            return Err(ComposeError::Validation(
                "only emojis are allowed".to_string(),
            ));
        }

        if !self.rate_limiter.try_acquire(&caller.user_id) {
            tracing::warn!(user_id = %caller.user_id, "Post rate limit exceeded");
            return Err(ComposeError::RateLimited);
        }

        let post = self.posts.create(&caller.user_id, content).await?;

        tracing::info!(
            post_id = %post.id,
            author_id = %post.author_id,
            "Created post"
        );

        Ok(post)
    }
}

/// Per-caller posting limiter over a fixed one-minute window
#[derive(Debug)]
struct CallerRateLimiter {
    per_minute: Option<u32>,
    windows: Mutex<HashMap<String, Window>>,
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

impl CallerRateLimiter {
    fn new(per_minute: Option<u32>) -> Self {
        Self {
            per_minute,
            windows: Mutex::new(HashMap::new()),
        }
    }

    fn try_acquire(&self, caller: &str) -> bool {
        let Some(limit) = self.per_minute else {
            return true;
        };

        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let window = windows.entry(caller.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(window.started) >= Duration::from_secs(60) {
            window.started = now;
            window.count = 0;
        }

        if window.count >= limit {
            return false;
        }

        window.count += 1;
        true
    }
}
