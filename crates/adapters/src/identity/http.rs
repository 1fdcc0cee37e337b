//! HTTP identity directory adapter
//!
//! Client for the external directory of record for user profiles. The
//! directory may silently omit ids it does not recognize from batch
//! lookups; that is surfaced as a missing map entry, never as an error.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chirp_domain::{Author, FEED_LIMIT, IdentityDirectory, IdentityError};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use time::OffsetDateTime;

const RETRY_DELAY: Duration = Duration::from_millis(300);

/// Options for the HTTP directory client
#[derive(Debug, Clone)]
pub struct HttpDirectoryOptions {
    /// Per-request timeout
    pub timeout: Duration,
    /// Extra attempts after a transport error or 5xx (4xx never retries)
    pub retries: u32,
}

impl Default for HttpDirectoryOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retries: 1,
        }
    }
}

/// Identity directory client over HTTP
pub struct HttpIdentityDirectory {
    client: Client,
    api_token: SecretString,
    base_url: String,
    retries: u32,
}

impl HttpIdentityDirectory {
    pub fn new(api_token: SecretString, base_url: String, options: HttpDirectoryOptions) -> Self {
        let client = Client::builder()
            .timeout(options.timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_token,
            base_url,
            retries: options.retries,
        }
    }

    async fn get_with_retries(&self, url: &str) -> Result<reqwest::Response, IdentityError> {
        let mut attempt = 0;
        loop {
            match self.get(url).await {
                Ok(response) => return Ok(response),
                Err(err) if attempt < self.retries && is_retryable(&err) => {
                    attempt += 1;
                    tracing::debug!(error = %err, attempt, "Retrying identity directory call");
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// One GET with the hard failures mapped; 404 and other client
    /// statuses are left for the caller to interpret.
    async fn get(&self, url: &str) -> Result<reqwest::Response, IdentityError> {
        let response = self
            .client
            .get(url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_token.expose_secret()),
            )
            .send()
            .await
            .map_err(|e| IdentityError::Network(e.to_string()))?;

        if response.status() == 401 {
            return Err(IdentityError::Auth("Invalid API token".to_string()));
        }

        if response.status() == 429 {
            let retry_after = response
                .headers()
                .get("x-rate-limit-reset")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(|ts| {
                    let now = OffsetDateTime::now_utc().unix_timestamp() as u64;
                    Duration::from_secs(ts.saturating_sub(now))
                });
            return Err(IdentityError::RateLimited(retry_after));
        }

        if response.status().is_server_error() {
            return Err(IdentityError::Unavailable(format!(
                "Directory returned {}",
                response.status()
            )));
        }

        Ok(response)
    }
}

#[derive(Deserialize)]
struct UserListResponse {
    data: Vec<UserRecord>,
}

#[derive(Deserialize)]
struct UserRecord {
    id: String,
    username: Option<String>,
    profile_image_url: String,
}

impl UserRecord {
    fn into_author(self) -> Author {
        Author {
            id: self.id,
            username: self.username,
            profile_image_url: self.profile_image_url,
        }
    }
}

#[async_trait]
impl IdentityDirectory for HttpIdentityDirectory {
    async fn resolve(&self, ids: &[String]) -> Result<HashMap<String, Author>, IdentityError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ids = if ids.len() > FEED_LIMIT {
            tracing::warn!(
                requested = ids.len(),
                "Truncating identity batch to {}",
                FEED_LIMIT
            );
            &ids[..FEED_LIMIT]
        } else {
            ids
        };

        let url = format!(
            "{}/v1/users?ids={}&limit={}",
            self.base_url,
            ids.join(","),
            FEED_LIMIT
        );

        let response = self.get_with_retries(&url).await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Api(format!(
                "Failed to resolve users: {}",
                body
            )));
        }

        let users: UserListResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Api(e.to_string()))?;

        tracing::debug!(
            requested = ids.len(),
            resolved = users.data.len(),
            "Resolved identity batch"
        );

        Ok(users
            .data
            .into_iter()
            .map(|u| (u.id.clone(), u.into_author()))
            .collect())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Author>, IdentityError> {
        let url = format!("{}/v1/users/by/username/{}", self.base_url, username);

        let response = self.get_with_retries(&url).await?;

        if response.status() == 404 {
            return Ok(None);
        }

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Api(format!(
                "Failed to look up user: {}",
                body
            )));
        }

        let user: UserRecord = response
            .json()
            .await
            .map_err(|e| IdentityError::Api(e.to_string()))?;

        Ok(Some(user.into_author()))
    }
}

fn is_retryable(err: &IdentityError) -> bool {
    matches!(
        err,
        IdentityError::Network(_) | IdentityError::Unavailable(_)
    )
}
