// src/ingest/rss.rs
//! Feed source adapter: fetches one RSS 2.0 or Atom feed over HTTP and
//! parses it into normalized `FeedItem`s. Any failure is scoped to the one
//! feed; the caller decides how to report it.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use crate::article::Category;
use crate::config::{FeedConfig, Limits};
use crate::ingest::types::{item_id, FeedItem, FeedProvider};
use crate::ingest::{normalize_text, SUMMARY_MAX_CHARS};

// ---- RSS 2.0 wire shapes ----

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}
#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    guid: Option<Guid>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}
#[derive(Debug, Deserialize)]
struct Guid {
    #[serde(rename = "$text")]
    value: Option<String>,
}

// ---- Atom wire shapes ----

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}
#[derive(Debug, Deserialize)]
struct AtomEntry {
    id: Option<String>,
    title: Option<AtomText>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
    summary: Option<AtomText>,
}
#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text")]
    value: Option<String>,
}
#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

fn parse_rfc2822_utc(ts: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
}

fn parse_rfc3339_utc(ts: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(ts)
        .ok()
        .map(|dt| dt.with_timezone(&chrono::Utc))
}

pub struct RssFeedProvider {
    name: String,
    category: Category,
    max_items: usize,
    mode: Mode,
}

enum Mode {
    /// Embedded XML, used by tests and offline runs.
    Fixture(String),
    Http {
        url: String,
        client: reqwest::Client,
        retries: u32,
        backoff: Duration,
    },
}

impl RssFeedProvider {
    pub fn from_config(cfg: &FeedConfig, limits: &Limits) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("moltstreet-pipeline/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(limits.request_timeout_secs))
            .build()
            .context("building http client")?;
        Ok(Self {
            name: cfg.name.clone(),
            category: cfg.category,
            max_items: cfg.max_items,
            mode: Mode::Http {
                url: cfg.url.clone(),
                client,
                retries: limits.fetch_retries,
                backoff: Duration::from_millis(limits.fetch_backoff_ms),
            },
        })
    }

    pub fn from_fixture_str(name: &str, category: Category, xml: &str) -> Self {
        Self {
            name: name.to_string(),
            category,
            max_items: 10,
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    fn parse_items(&self, xml: &str) -> Result<Vec<FeedItem>> {
        // Feeds routinely embed HTML entities the XML parser rejects.
        let xml = scrub_html_entities_for_xml(xml);
        if looks_like_atom(&xml) {
            self.parse_atom(&xml)
        } else {
            self.parse_rss(&xml)
        }
    }

    fn parse_rss(&self, xml: &str) -> Result<Vec<FeedItem>> {
        let rss: Rss = from_str(xml).with_context(|| format!("parsing rss xml for '{}'", self.name))?;
        let mut out = Vec::new();
        for it in rss.channel.items.into_iter().take(self.max_items) {
            let title = normalize_text(it.title.as_deref().unwrap_or_default());
            if title.is_empty() {
                continue;
            }
            let link = it.link.clone().unwrap_or_default();
            let key = it
                .guid
                .as_ref()
                .and_then(|g| g.value.clone())
                .filter(|v| !v.is_empty())
                .or_else(|| it.link.clone().filter(|l| !l.is_empty()))
                .unwrap_or_else(|| title.clone());
            out.push(FeedItem {
                id: item_id(&self.name, &key),
                feed: self.name.clone(),
                category: self.category,
                title,
                link,
                summary: cap_summary(it.description.as_deref().unwrap_or_default()),
                published: it.pub_date.as_deref().and_then(parse_rfc2822_utc),
            });
        }
        Ok(out)
    }

    fn parse_atom(&self, xml: &str) -> Result<Vec<FeedItem>> {
        let feed: AtomFeed =
            from_str(xml).with_context(|| format!("parsing atom xml for '{}'", self.name))?;
        let mut out = Vec::new();
        for entry in feed.entries.into_iter().take(self.max_items) {
            let title =
                normalize_text(entry.title.as_ref().and_then(|t| t.value.as_deref()).unwrap_or(""));
            if title.is_empty() {
                continue;
            }
            // Prefer rel="alternate" (or unmarked) links over self/edit.
            let link = entry
                .links
                .iter()
                .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
                .and_then(|l| l.href.clone())
                .unwrap_or_default();
            let key = entry
                .id
                .clone()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| if link.is_empty() { title.clone() } else { link.clone() });
            let published = entry
                .published
                .as_deref()
                .or(entry.updated.as_deref())
                .and_then(parse_rfc3339_utc);
            out.push(FeedItem {
                id: item_id(&self.name, &key),
                feed: self.name.clone(),
                category: self.category,
                title,
                link,
                summary: cap_summary(
                    entry.summary.as_ref().and_then(|s| s.value.as_deref()).unwrap_or(""),
                ),
                published,
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl FeedProvider for RssFeedProvider {
    async fn fetch_latest(&self) -> Result<Vec<FeedItem>> {
        match &self.mode {
            Mode::Fixture(xml) => self.parse_items(xml),
            Mode::Http {
                url,
                client,
                retries,
                backoff,
            } => {
                let body = fetch_with_backoff(client, url, *retries, *backoff).await?;
                self.parse_items(&body)
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// GET with bounded retries and exponential backoff. Gives up for this run
/// after the last attempt; the feed comes back next run.
async fn fetch_with_backoff(
    client: &reqwest::Client,
    url: &str,
    retries: u32,
    base_backoff: Duration,
) -> Result<String> {
    let mut delay = base_backoff;
    let mut last_err = None;
    for attempt in 0..=retries {
        let result = async {
            let resp = client.get(url).send().await?.error_for_status()?;
            resp.text().await
        }
        .await;
        match result {
            Ok(body) => return Ok(body),
            Err(e) => {
                tracing::warn!(url, attempt, error = %e, "feed fetch attempt failed");
                last_err = Some(e);
                if attempt < retries {
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
            }
        }
    }
    match last_err {
        Some(e) => Err(e).with_context(|| format!("fetching {url}")),
        None => bail!("fetching {url}: no attempts made"),
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

fn looks_like_atom(xml: &str) -> bool {
    match (xml.find("<feed"), xml.find("<rss")) {
        (Some(f), Some(r)) => f < r,
        (Some(_), None) => true,
        _ => false,
    }
}

fn cap_summary(raw: &str) -> String {
    let mut s = normalize_text(raw);
    if s.chars().count() > SUMMARY_MAX_CHARS {
        s = s.chars().take(SUMMARY_MAX_CHARS).collect();
    }
    s
}
