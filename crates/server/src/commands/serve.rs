//! Serve command - run the HTTP API server

use anyhow::{Context, Result};
use chirp_adapters::{
    identity::{HttpDirectoryOptions, HttpIdentityDirectory, StubIdentityDirectory},
    post_store::{InMemoryPostStore, SqlitePostStore},
};
use chirp_domain::{
    Author, IdentityDirectory, PostStore, SystemClock, usecases::ComposeConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::args::ServeArgs;
use crate::config::{AppConfig, load_api_token};
use crate::http;

pub async fn execute(args: ServeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let bind_addr = args
        .bind
        .clone()
        .unwrap_or_else(|| config.server.bind_addr.clone());

    tracing::info!(
        bind_addr = %bind_addr,
        offline = args.offline,
        db_path = %config.store.db_path.display(),
        identity_base_url = %config.identity.base_url,
        "Starting chirp server"
    );

    let clock = Arc::new(SystemClock);

    // Build dependencies
    let (post_store, identity_directory): (Arc<dyn PostStore>, Arc<dyn IdentityDirectory>) =
        if args.offline {
            tracing::warn!("Offline mode: posts are not persisted and profiles are canned");
            (
                Arc::new(InMemoryPostStore::new(clock)),
                Arc::new(StubIdentityDirectory::with_users(demo_users())),
            )
        } else {
            let store = SqlitePostStore::new(&config.store.db_path, clock)
                .await
                .context("Failed to initialize SQLite post store")?;

            let api_token = load_api_token(&config.identity.api_token_env)?;
            let directory = HttpIdentityDirectory::new(
                api_token,
                config.identity.base_url.clone(),
                HttpDirectoryOptions {
                    timeout: Duration::from_secs(config.identity.timeout_secs),
                    retries: config.identity.retries,
                },
            );

            (Arc::new(store), Arc::new(directory))
        };

    let compose_config = ComposeConfig {
        max_chars: config.compose.max_chars,
        emoji_only: config.compose.emoji_only,
        rate_limit_per_minute: rate_limit_from_config(config.compose.rate_limit_per_minute),
    };

    let state = http::AppState::new(post_store, identity_directory, compose_config);
    let app = http::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("chirp server stopped");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}

fn rate_limit_from_config(value: u32) -> Option<u32> {
    if value == 0 { None } else { Some(value) }
}

fn demo_users() -> Vec<Author> {
    vec![
        Author {
            id: "demo_alice".to_string(),
            username: Some("alice".to_string()),
            profile_image_url: "https://img.example.com/alice.png".to_string(),
        },
        Author {
            id: "demo_bob".to_string(),
            username: Some("bob".to_string()),
            profile_image_url: "https://img.example.com/bob.png".to_string(),
        },
    ]
}
