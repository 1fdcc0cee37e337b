//! Doctor command - validate configuration and show status

use anyhow::Result;
use chirp_adapters::post_store::SqlitePostStore;
use chirp_domain::{PostStore, SystemClock};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::args::DoctorArgs;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    store: CheckResult,
    identity: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        store: CheckResult::error("Not checked"),
        identity: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    // Check config
    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.store = check_store(&config.store.db_path).await;
        report.identity = check_identity(config);
    }

    // Determine overall status
    let checks = [&report.config, &report.store, &report.identity];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    // Output report
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

async fn check_store(db_path: &Path) -> CheckResult {
    match SqlitePostStore::new(db_path, Arc::new(SystemClock)).await {
        Ok(store) => match store.list_recent().await {
            Ok(posts) => CheckResult::ok(format!("Post store ready: {}", db_path.display()))
                .with_details(serde_json::json!({ "recent_posts": posts.len() })),
            Err(e) => CheckResult::error(format!("Post store query failed: {}", e)),
        },
        Err(e) => CheckResult::error(format!("Failed to open post store: {}", e)),
    }
}

fn check_identity(config: &AppConfig) -> CheckResult {
    let base_url = &config.identity.base_url;
    if base_url.trim().is_empty() {
        return CheckResult::error("Identity base_url is empty");
    }

    let env_var = &config.identity.api_token_env;
    if env_var.is_empty() {
        return CheckResult::error("No API token env var configured");
    }

    // Check whether the token env var is set without revealing the value
    match std::env::var(env_var) {
        Ok(val) if !val.is_empty() => CheckResult::ok(format!(
            "Directory: {}, API token: {} (set)",
            base_url, env_var
        )),
        _ => CheckResult::warn(format!(
            "Directory: {}, API token: {} (not set)",
            base_url, env_var
        )),
    }
}

fn print_report(report: &DoctorReport) {
    println!("chirp Doctor Report");
    println!("===================");
    println!();

    print_check("Config", &report.config);
    print_check("Post Store", &report.store);
    print_check("Identity Directory", &report.identity);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall == "ok" {
        println!();
        println!("Ready to run! Try: chirp serve");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}
