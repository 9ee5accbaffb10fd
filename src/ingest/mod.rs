// src/ingest/mod.rs
//! Feed ingestion: fetch all configured feeds (concurrently), normalize
//! entries, and triage them against the dedup ledger. A failing feed never
//! aborts ingestion of its siblings.

pub mod rss;
pub mod types;

use tokio::task::JoinSet;

use crate::ledger::Ledger;
use crate::ingest::types::{FeedItem, FeedProvider};

/// Cap applied to item summaries after normalization.
pub const SUMMARY_MAX_CHARS: usize = 500;

/// Normalize text pulled out of a feed: decode HTML entities, strip tags,
/// fold curly quotes to ASCII, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

#[derive(Debug, Default)]
pub struct FetchReport {
    /// Items absent from the ledger, in original feed/item order.
    pub new_items: Vec<FeedItem>,
    /// Items dropped because the ledger already resolved them.
    pub seen: usize,
    /// (feed name, reason) for feeds that failed this run.
    pub failed_feeds: Vec<(String, String)>,
}

/// Fetch all providers concurrently and triage the merged item list through
/// the ledger. Items keep provider order, then in-feed order.
pub async fn run_fetch(providers: Vec<Box<dyn FeedProvider>>, ledger: &Ledger) -> FetchReport {
    let n = providers.len();
    let mut set: JoinSet<(usize, String, anyhow::Result<Vec<FeedItem>>)> = JoinSet::new();
    for (idx, provider) in providers.into_iter().enumerate() {
        set.spawn(async move {
            let name = provider.name().to_string();
            let result = provider.fetch_latest().await;
            (idx, name, result)
        });
    }

    let mut slots: Vec<Option<Vec<FeedItem>>> = (0..n).map(|_| None).collect();
    let mut failed_feeds = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((idx, name, Ok(items))) => {
                tracing::info!(feed = %name, count = items.len(), "fetched feed");
                slots[idx] = Some(items);
            }
            Ok((_, name, Err(e))) => {
                tracing::warn!(feed = %name, error = %e, "feed unavailable");
                failed_feeds.push((name, e.to_string()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "feed fetch task panicked");
                failed_feeds.push(("<unknown>".to_string(), e.to_string()));
            }
        }
    }

    let merged: Vec<FeedItem> = slots.into_iter().flatten().flatten().collect();
    let total = merged.len();
    let new_items = ledger.ingest(merged);
    FetchReport {
        seen: total - new_items.len(),
        new_items,
        failed_feeds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_tags_and_entities() {
        let s = "  <p>Fed&nbsp;holds &ldquo;steady&rdquo;</p>  ";
        assert_eq!(normalize_text(s), "Fed holds \"steady\"");
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize_text("a\n\n  b\tc"), "a b c");
    }
}
