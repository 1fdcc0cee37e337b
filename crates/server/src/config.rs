//! Configuration loading and management

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub compose: ComposeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_identity_base_url")]
    pub base_url: String,

    #[serde(default = "default_identity_token_env")]
    pub api_token_env: String,

    #[serde(default = "default_identity_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_identity_retries")]
    pub retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeConfig {
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    #[serde(default = "default_true")]
    pub emoji_only: bool,

    /// 0 disables rate limiting
    #[serde(default = "default_rate_limit_per_minute")]
    pub rate_limit_per_minute: u32,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./chirp.sqlite")
}

fn default_identity_base_url() -> String {
    "https://identity.example.com".to_string()
}

fn default_identity_token_env() -> String {
    "CHIRP_IDENTITY_TOKEN".to_string()
}

fn default_identity_timeout() -> u64 {
    30
}

fn default_identity_retries() -> u32 {
    1
}

fn default_max_chars() -> usize {
    280
}

fn default_true() -> bool {
    true
}

fn default_rate_limit_per_minute() -> u32 {
    3
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            base_url: default_identity_base_url(),
            api_token_env: default_identity_token_env(),
            timeout_secs: default_identity_timeout(),
            retries: default_identity_retries(),
        }
    }
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            emoji_only: default_true(),
            rate_limit_per_minute: default_rate_limit_per_minute(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("CHIRP")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# chirp configuration

[general]
log_level = "info"

[server]
bind_addr = "127.0.0.1:8080"

[store]
db_path = "./chirp.sqlite"

[identity]
base_url = "https://identity.example.com"
api_token_env = "CHIRP_IDENTITY_TOKEN"
timeout_secs = 30
retries = 1

[compose]
max_chars = 280
emoji_only = true
# 0 disables rate limiting
rate_limit_per_minute = 3
"#
        .to_string()
    }
}

/// Read a secret from the environment variable named in config
pub fn load_api_token(env_var: &str) -> Result<SecretString> {
    std::env::var(env_var)
        .map(SecretString::from)
        .with_context(|| format!("Environment variable {} not set", env_var))
}
