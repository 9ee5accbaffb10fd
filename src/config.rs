// src/config.rs
//! TOML configuration: site identity, feed list and run limits.
//!
//! Path resolution follows env-var-then-fallback:
//!   1) $MOLTSTREET_FEEDS_PATH
//!   2) config/feeds.toml

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::article::Category;

pub const ENV_FEEDS_PATH: &str = "MOLTSTREET_FEEDS_PATH";
pub const DEFAULT_FEEDS_PATH: &str = "config/feeds.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct SiteInfo {
    pub name: String,
    pub url: String,
    pub description: String,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
    #[serde(default = "default_category")]
    pub category: Category,
    /// Cap on items taken per fetch, newest first.
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Limits {
    #[serde(default = "default_max_articles")]
    pub max_articles_per_run: usize,
    /// Parallel generation calls in flight at once.
    #[serde(default = "default_synth_concurrency")]
    pub synth_concurrency: usize,
    #[serde(default = "default_fetch_retries")]
    pub fetch_retries: u32,
    #[serde(default = "default_fetch_backoff_ms")]
    pub fetch_backoff_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_articles_per_run: default_max_articles(),
            synth_concurrency: default_synth_concurrency(),
            fetch_retries: default_fetch_retries(),
            fetch_backoff_ms: default_fetch_backoff_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub site: SiteInfo,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub feeds: Vec<FeedConfig>,
}

fn default_language() -> String {
    "en".to_string()
}
fn default_category() -> Category {
    Category::General
}
fn default_max_items() -> usize {
    10
}
fn default_max_articles() -> usize {
    50
}
fn default_synth_concurrency() -> usize {
    4
}
fn default_fetch_retries() -> u32 {
    3
}
fn default_fetch_backoff_ms() -> u64 {
    500
}
fn default_request_timeout_secs() -> u64 {
    10
}

pub fn load_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let cfg: AppConfig =
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    Ok(cfg)
}

/// Load config using env var + fallback path.
pub fn load_default() -> Result<AppConfig> {
    if let Ok(p) = std::env::var(ENV_FEEDS_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!("{ENV_FEEDS_PATH} points to non-existent path"));
        }
        return load_from(&pb);
    }
    load_from(Path::new(DEFAULT_FEEDS_PATH))
}
