// src/pipeline.rs
//! Stage drivers behind the CLI: fetch, generate, build. Each stage is a
//! single-writer batch pass; invocations are assumed externally serialized.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::fsutil::write_atomic;
use crate::ingest::rss::RssFeedProvider;
use crate::ingest::types::{FeedItem, FeedProvider};
use crate::ingest::{run_fetch, FetchReport};
use crate::ledger::Ledger;
use crate::site::{self, BuildReport};
use crate::store::ArticleStore;
use crate::synth::client::DynGenerationClient;
use crate::synth::{run_generate, SynthReport};

/// Where the run keeps its working state and output.
#[derive(Debug, Clone)]
pub struct WorkPaths {
    pub data_dir: PathBuf,
    pub content_dir: PathBuf,
    pub out_dir: PathBuf,
}

impl WorkPaths {
    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join("ledger.json")
    }

    pub fn pending_path(&self) -> PathBuf {
        self.data_dir.join("pending.json")
    }
}

pub fn save_pending(path: &Path, items: &[FeedItem]) -> Result<()> {
    let json = serde_json::to_string_pretty(items).context("serializing pending items")?;
    write_atomic(path, &json)
}

pub fn load_pending(path: &Path) -> Result<Vec<FeedItem>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Fetch stage: poll all configured feeds, triage against the ledger, and
/// replace the pending-items file with whatever is new this run.
pub async fn fetch_stage(cfg: &AppConfig, paths: &WorkPaths) -> Result<FetchReport> {
    let mut providers: Vec<Box<dyn FeedProvider>> = Vec::with_capacity(cfg.feeds.len());
    for feed in &cfg.feeds {
        providers.push(Box::new(RssFeedProvider::from_config(feed, &cfg.limits)?));
    }
    fetch_stage_with(providers, paths).await
}

/// Same as `fetch_stage` but with caller-supplied providers (tests use
/// fixture-backed ones).
pub async fn fetch_stage_with(
    providers: Vec<Box<dyn FeedProvider>>,
    paths: &WorkPaths,
) -> Result<FetchReport> {
    let ledger = Ledger::open(&paths.ledger_path())?;
    let report = run_fetch(providers, &ledger).await;
    save_pending(&paths.pending_path(), &report.new_items)?;
    tracing::info!(
        new = report.new_items.len(),
        seen = report.seen,
        failed_feeds = report.failed_feeds.len(),
        "fetch stage finished"
    );
    Ok(report)
}

/// Generate stage: synthesize pending items into articles. Per-item
/// failures are counted, never fatal; the pending file keeps only items
/// still unresolved afterwards (transient failures and overflow).
pub async fn generate_stage_with(
    client: DynGenerationClient,
    cfg: &AppConfig,
    paths: &WorkPaths,
) -> Result<SynthReport> {
    let mut ledger = Ledger::open(&paths.ledger_path())?;
    let mut store = ArticleStore::open(&paths.content_dir)?;

    // Re-triage: the pending file may predate the current ledger state.
    let pending = ledger.ingest(load_pending(&paths.pending_path())?);
    let batch: Vec<FeedItem> = pending
        .iter()
        .take(cfg.limits.max_articles_per_run)
        .cloned()
        .collect();

    let report = run_generate(client, batch, &mut store, &mut ledger, &cfg.limits).await?;

    let remaining: Vec<FeedItem> = pending
        .into_iter()
        .filter(|it| !ledger.contains(&it.id))
        .collect();
    save_pending(&paths.pending_path(), &remaining)?;

    tracing::info!(
        published = report.published.len(),
        transient = report.transient,
        malformed = report.malformed,
        "generate stage finished"
    );
    Ok(report)
}

/// Build stage: read-only pass over the committed store.
pub fn build_stage(cfg: &AppConfig, paths: &WorkPaths) -> Result<BuildReport> {
    let store = ArticleStore::open(&paths.content_dir)?;
    let articles = store.load_all()?;
    let report = site::build(articles, &cfg.site, &paths.out_dir)?;
    tracing::info!(
        articles = report.articles,
        files = report.files,
        out = %paths.out_dir.display(),
        "build stage finished"
    );
    Ok(report)
}
