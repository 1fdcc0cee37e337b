//! Request handlers for the remote-procedure operations

use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
};
use chirp_domain::cache::keys;
use chirp_domain::model::{Author, CallerIdentity, FeedEntry, Post};
use serde::Deserialize;
use uuid::Uuid;

use super::AppState;
use super::error::ApiError;

/// Header set by the fronting auth proxy for authenticated requests
pub const CALLER_HEADER: &str = "x-caller-id";

fn caller_identity(headers: &HeaderMap) -> Option<CallerIdentity> {
    headers
        .get(CALLER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(CallerIdentity::new)
}

pub async fn get_all(State(state): State<AppState>) -> Result<Json<Vec<FeedEntry>>, ApiError> {
    if let Some(entries) = state.feed_cache.get(keys::GET_ALL) {
        tracing::debug!(key = keys::GET_ALL, "Serving feed from cache");
        return Ok(Json(entries));
    }

    let entries = state.feed.global_feed().await?;
    state.feed_cache.put(keys::GET_ALL, entries.clone());

    Ok(Json(entries))
}

#[derive(Debug, Deserialize)]
pub struct PostByIdQuery {
    pub id: Uuid,
}

pub async fn get_post_by_id(
    State(state): State<AppState>,
    Query(query): Query<PostByIdQuery>,
) -> Result<Json<FeedEntry>, ApiError> {
    let entry = state.feed.entry_for_post(query.id).await?;
    Ok(Json(entry))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostsByUserQuery {
    pub user_id: String,
}

pub async fn get_posts_by_user_id(
    State(state): State<AppState>,
    Query(query): Query<PostsByUserQuery>,
) -> Result<Json<Vec<FeedEntry>>, ApiError> {
    let key = keys::posts_by_user(&query.user_id);

    if let Some(entries) = state.feed_cache.get(&key) {
        tracing::debug!(key = %key, "Serving profile feed from cache");
        return Ok(Json(entries));
    }

    let entries = state.feed.feed_for_author(&query.user_id).await?;
    state.feed_cache.put(key, entries.clone());

    Ok(Json(entries))
}

#[derive(Debug, Deserialize)]
pub struct CreatePostBody {
    pub content: String,
}

pub async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreatePostBody>,
) -> Result<Json<Post>, ApiError> {
    let caller = caller_identity(&headers);
    let post = state.compose.submit(caller.as_ref(), &body.content).await?;

    // The new post makes the cached list views stale; drop them before
    // replying so the caller's next read observes their own write.
    state.feed_cache.invalidate(keys::GET_ALL);
    state.feed_cache.invalidate(&keys::posts_by_user(&post.author_id));

    Ok(Json(post))
}

#[derive(Debug, Deserialize)]
pub struct UserByUsernameQuery {
    pub username: String,
}

pub async fn get_user_by_username(
    State(state): State<AppState>,
    Query(query): Query<UserByUsernameQuery>,
) -> Result<Json<Author>, ApiError> {
    match state.identities.find_by_username(&query.username).await? {
        Some(author) => Ok(Json(author)),
        None => Err(ApiError::NotFound),
    }
}
