//! Identity directory adapters

mod http;

pub use http::{HttpDirectoryOptions, HttpIdentityDirectory};

use std::collections::HashMap;

use async_trait::async_trait;
use chirp_domain::{Author, IdentityDirectory, IdentityError};

/// Stub identity directory for testing and offline mode
pub struct StubIdentityDirectory {
    users: Vec<Author>,
}

impl StubIdentityDirectory {
    /// Create an empty stub
    pub fn empty() -> Self {
        Self { users: vec![] }
    }

    /// Create a stub with predefined users
    pub fn with_users(users: Vec<Author>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl IdentityDirectory for StubIdentityDirectory {
    async fn resolve(&self, ids: &[String]) -> Result<HashMap<String, Author>, IdentityError> {
        Ok(self
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .map(|u| (u.id.clone(), u))
            .collect())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Author>, IdentityError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.username.as_deref() == Some(username))
            .cloned())
    }
}
