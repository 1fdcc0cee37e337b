//! API error type and status mapping

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chirp_domain::IdentityError;
use chirp_domain::usecases::{ComposeError, FeedError};
use serde_json::json;
use thiserror::Error;

/// Error surfaced to API callers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Sign in to post")]
    Unauthenticated,
    #[error("Not found")]
    NotFound,
    #[error("Too many posts, slow down")]
    RateLimited,
    #[error("Upstream unavailable")]
    Upstream(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };

        // Upstream detail is logged, not leaked to the caller
        if let ApiError::Upstream(detail) = &self {
            tracing::error!(detail = %detail, "Upstream failure");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<FeedError> for ApiError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::NotFound => ApiError::NotFound,
            FeedError::Store(detail) => ApiError::Upstream(detail),
        }
    }
}

impl From<ComposeError> for ApiError {
    fn from(err: ComposeError) -> Self {
        match err {
            ComposeError::Unauthenticated => ApiError::Unauthenticated,
            ComposeError::Validation(message) => ApiError::Validation(message),
            ComposeError::RateLimited => ApiError::RateLimited,
            ComposeError::Store(detail) => ApiError::Upstream(detail),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}
