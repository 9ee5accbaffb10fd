// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::article::Category;

/// One normalized feed entry. Transient: lives only between fetch and
/// generate, then either becomes an article or is discarded.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FeedItem {
    /// Stable identity: truncated SHA-256 over feed name + entry key.
    pub id: String,
    pub feed: String,
    pub category: Category,
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published: Option<DateTime<Utc>>,
}

/// Stable identity for a feed entry, scoped to its feed. `key` is the
/// entry's GUID, falling back to link, falling back to title.
pub fn item_id(feed_name: &str, key: &str) -> String {
    let digest = Sha256::digest(format!("{feed_name}:{key}").as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..16].to_string()
}

#[async_trait::async_trait]
pub trait FeedProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<FeedItem>>;
    fn name(&self) -> &str;
}
