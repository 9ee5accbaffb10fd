// tests/pipeline_e2e.rs
//! Whole-pipeline runs against fixture feeds and mock generation clients:
//! idempotence, partial feed failure, and per-item retry semantics.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use moltstreet_pipeline::article::Category;
use moltstreet_pipeline::config::AppConfig;
use moltstreet_pipeline::ingest::rss::RssFeedProvider;
use moltstreet_pipeline::ingest::types::FeedProvider;
use moltstreet_pipeline::ledger::{Ledger, Outcome};
use moltstreet_pipeline::pipeline::{
    build_stage, fetch_stage_with, generate_stage_with, WorkPaths,
};
use moltstreet_pipeline::store::ArticleStore;
use moltstreet_pipeline::synth::client::{DynGenerationClient, GenerationClient, MockClient};

const FED_RSS: &str = include_str!("fixtures/fed_rss.xml");
const WIRE_ATOM: &str = include_str!("fixtures/wire_atom.xml");
const MALFORMED: &str = include_str!("fixtures/malformed.xml");

fn test_config() -> AppConfig {
    toml::from_str(
        r#"
[site]
name = "Molt Street Journal"
url = "https://moltstreetjournal.test"
description = "Financial news for humans and agents"
"#,
    )
    .unwrap()
}

fn work_paths(root: &std::path::Path) -> WorkPaths {
    WorkPaths {
        data_dir: root.join("data"),
        content_dir: root.join("content/articles"),
        out_dir: root.join("site"),
    }
}

fn fixture_providers() -> Vec<Box<dyn FeedProvider>> {
    vec![
        Box::new(RssFeedProvider::from_fixture_str("Fed", Category::Macro, FED_RSS)),
        Box::new(RssFeedProvider::from_fixture_str("Wire", Category::Markets, WIRE_ATOM)),
    ]
}

/// Always fails the service call: every item is a transient failure.
struct DownClient;

#[async_trait]
impl GenerationClient for DownClient {
    async fn generate(&self, _system: &str, _prompt: &str) -> Result<String> {
        anyhow::bail!("connection timed out")
    }
    fn provider_name(&self) -> &'static str {
        "down"
    }
}

/// Returns text that is not a valid article document.
struct GarbageClient;

#[async_trait]
impl GenerationClient for GarbageClient {
    async fn generate(&self, _system: &str, _prompt: &str) -> Result<String> {
        Ok("Sorry, I cannot help with that.".to_string())
    }
    fn provider_name(&self) -> &'static str {
        "garbage"
    }
}

#[tokio::test]
async fn fetch_generate_twice_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = test_config();
    let paths = work_paths(tmp.path());
    let client: DynGenerationClient = Arc::new(MockClient::canned());

    let fetch1 = fetch_stage_with(fixture_providers(), &paths).await.unwrap();
    assert_eq!(fetch1.new_items.len(), 5);
    assert!(fetch1.failed_feeds.is_empty());

    let gen1 = generate_stage_with(Arc::clone(&client), &cfg, &paths)
        .await
        .unwrap();
    assert_eq!(gen1.published.len(), 5);

    // Identical snapshot, second pass: nothing new anywhere.
    let fetch2 = fetch_stage_with(fixture_providers(), &paths).await.unwrap();
    assert!(fetch2.new_items.is_empty());
    assert_eq!(fetch2.seen, 5);

    let gen2 = generate_stage_with(client, &cfg, &paths).await.unwrap();
    assert!(gen2.published.is_empty());

    // Colliding mock titles were disambiguated, never overwritten.
    let store = ArticleStore::open(&paths.content_dir).unwrap();
    assert_eq!(store.len(), 5);
    assert!(store.contains_slug("mock-market-briefing"));
    assert!(store.contains_slug("mock-market-briefing-5"));
}

#[tokio::test]
async fn one_broken_feed_does_not_block_the_others() {
    let tmp = tempfile::tempdir().unwrap();
    let paths = work_paths(tmp.path());

    let providers: Vec<Box<dyn FeedProvider>> = vec![
        Box::new(RssFeedProvider::from_fixture_str("Broken", Category::General, MALFORMED)),
        Box::new(RssFeedProvider::from_fixture_str("Wire", Category::Markets, WIRE_ATOM)),
    ];
    let report = fetch_stage_with(providers, &paths).await.unwrap();

    assert_eq!(report.failed_feeds.len(), 1);
    assert_eq!(report.failed_feeds[0].0, "Broken");
    assert_eq!(report.new_items.len(), 2);
    assert!(report.new_items.iter().all(|i| i.feed == "Wire"));
}

#[tokio::test]
async fn transient_failures_are_retried_on_the_next_run() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = test_config();
    let paths = work_paths(tmp.path());

    fetch_stage_with(fixture_providers(), &paths).await.unwrap();

    let down: DynGenerationClient = Arc::new(DownClient);
    let gen1 = generate_stage_with(down, &cfg, &paths).await.unwrap();
    assert_eq!(gen1.transient, 5);
    assert!(gen1.published.is_empty());

    // No tombstones: the ledger stays empty and the items stay pending.
    let ledger = Ledger::open(&paths.ledger_path()).unwrap();
    assert!(ledger.is_empty());

    let ok: DynGenerationClient = Arc::new(MockClient::canned());
    let gen2 = generate_stage_with(ok, &cfg, &paths).await.unwrap();
    assert_eq!(gen2.published.len(), 5);
}

#[tokio::test]
async fn malformed_output_is_tombstoned_not_retried() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = test_config();
    let paths = work_paths(tmp.path());

    let fetch1 = fetch_stage_with(fixture_providers(), &paths).await.unwrap();
    let first_id = fetch1.new_items[0].id.clone();

    let garbage: DynGenerationClient = Arc::new(GarbageClient);
    let gen1 = generate_stage_with(garbage, &cfg, &paths).await.unwrap();
    assert_eq!(gen1.malformed, 5);

    let ledger = Ledger::open(&paths.ledger_path()).unwrap();
    assert!(matches!(ledger.outcome(&first_id), Some(Outcome::Skipped { .. })));

    // Re-fetching the same snapshot finds nothing new: tombstoned items are
    // never resubmitted.
    let fetch2 = fetch_stage_with(fixture_providers(), &paths).await.unwrap();
    assert!(fetch2.new_items.is_empty());

    let ok: DynGenerationClient = Arc::new(MockClient::canned());
    let gen2 = generate_stage_with(ok, &cfg, &paths).await.unwrap();
    assert!(gen2.published.is_empty());
}

#[tokio::test]
async fn max_articles_per_run_limits_the_batch_and_keeps_the_rest_pending() {
    let tmp = tempfile::tempdir().unwrap();
    let mut cfg = test_config();
    cfg.limits.max_articles_per_run = 2;
    let paths = work_paths(tmp.path());

    fetch_stage_with(fixture_providers(), &paths).await.unwrap();

    let client: DynGenerationClient = Arc::new(MockClient::canned());
    let gen1 = generate_stage_with(Arc::clone(&client), &cfg, &paths)
        .await
        .unwrap();
    assert_eq!(gen1.published.len(), 2);

    // Overflow stays queued for the next generate invocation.
    let gen2 = generate_stage_with(Arc::clone(&client), &cfg, &paths)
        .await
        .unwrap();
    assert_eq!(gen2.published.len(), 2);
    let gen3 = generate_stage_with(client, &cfg, &paths).await.unwrap();
    assert_eq!(gen3.published.len(), 1);
}

#[tokio::test]
async fn full_run_builds_a_site_from_fixture_feeds() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = test_config();
    let paths = work_paths(tmp.path());

    fetch_stage_with(fixture_providers(), &paths).await.unwrap();
    let client: DynGenerationClient = Arc::new(MockClient::canned());
    generate_stage_with(client, &cfg, &paths).await.unwrap();
    let report = build_stage(&cfg, &paths).unwrap();

    assert_eq!(report.articles, 5);
    assert!(paths.out_dir.join("index.html").exists());
    assert!(paths.out_dir.join("index.json").exists());
    assert!(paths
        .out_dir
        .join("articles/2026/01/01/mock-market-briefing.html")
        .exists());
    assert!(paths
        .out_dir
        .join("articles/2026/01/01/mock-market-briefing.md")
        .exists());
}
