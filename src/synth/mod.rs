// src/synth/mod.rs
//! Article synthesis orchestrator: one feed item in, one validated article
//! out (or a per-item failure). Generation calls run in parallel up to a
//! cap; commits to the store and ledger are serialized and atomic per item.

pub mod client;
pub mod prompt;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::article::{slugify, Article, Category, Source};
use crate::config::Limits;
use crate::error::SynthesisFailure;
use crate::frontmatter;
use crate::ingest::types::FeedItem;
use crate::ledger::{Ledger, Outcome};
use crate::store::ArticleStore;
use crate::synth::client::DynGenerationClient;

/// A parsed, validated generation result. Everything an `Article` has
/// except the slug, which is assigned at commit time against the store.
#[derive(Debug, Clone)]
pub struct Draft {
    pub title: String,
    pub date: DateTime<Utc>,
    pub category: Category,
    pub reporter: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub sources: Vec<Source>,
    pub body: String,
}

#[derive(Debug, Deserialize)]
struct DraftHeader {
    title: String,
    date: DateTime<Utc>,
    category: Category,
    reporter: String,
    summary: String,
    tags: Vec<String>,
    sources: Vec<Source>,
}

/// Parse and validate a generation response. Fails closed: any missing or
/// ill-typed required field rejects the whole document as malformed.
pub fn parse_draft(text: &str) -> Result<Draft, SynthesisFailure> {
    let malformed = |e: String| SynthesisFailure::Malformed(e);
    let (fm_raw, body) = frontmatter::split(text).map_err(|e| malformed(e.to_string()))?;
    let h: DraftHeader =
        serde_yaml::from_str(fm_raw).map_err(|e| malformed(format!("front matter: {e}")))?;
    if h.title.trim().is_empty() {
        return Err(malformed("empty title".into()));
    }
    if h.sources.is_empty() {
        return Err(malformed("no sources; provenance is mandatory".into()));
    }
    let body = body.trim_end().to_string();
    if body.is_empty() {
        return Err(malformed("empty body".into()));
    }
    Ok(Draft {
        title: h.title,
        date: h.date,
        category: h.category,
        reporter: h.reporter,
        summary: h.summary,
        tags: h.tags,
        sources: h.sources,
        body,
    })
}

/// One item through the generation service. Service errors are transient
/// (no ledger entry, retried next run); validation errors are malformed.
pub async fn synthesize(
    client: &dyn client::GenerationClient,
    item: &FeedItem,
) -> Result<Draft, SynthesisFailure> {
    let user_prompt = prompt::build_prompt(item);
    let text = client
        .generate(prompt::SYSTEM_PROMPT, &user_prompt)
        .await
        .map_err(|e| SynthesisFailure::Transient(e.to_string()))?;
    parse_draft(&text)
}

#[derive(Debug, Default)]
pub struct SynthReport {
    pub published: Vec<String>,
    pub transient: usize,
    pub malformed: usize,
}

/// Run synthesis for a batch of new items. Generation is parallel up to
/// `limits.synth_concurrency`; the commit phase below is a single-mutator
/// loop so slug uniqueness and ledger appends stay serialized. The ledger
/// is persisted after every commit so an aborted run loses nothing.
pub async fn run_generate(
    client: DynGenerationClient,
    items: Vec<FeedItem>,
    store: &mut ArticleStore,
    ledger: &mut Ledger,
    limits: &Limits,
) -> Result<SynthReport> {
    let n = items.len();
    let semaphore = Arc::new(Semaphore::new(limits.synth_concurrency.max(1)));
    let mut set: JoinSet<(usize, Result<Draft, SynthesisFailure>)> = JoinSet::new();

    for (idx, item) in items.iter().cloned().enumerate() {
        let client = Arc::clone(&client);
        let semaphore = Arc::clone(&semaphore);
        set.spawn(async move {
            // Semaphore is never closed while tasks run.
            let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
            (idx, synthesize(client.as_ref(), &item).await)
        });
    }

    let mut slots: Vec<Option<Result<Draft, SynthesisFailure>>> = (0..n).map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        let (idx, result) = joined.context("synthesis task panicked")?;
        slots[idx] = Some(result);
    }

    // Commit phase: original item order, single mutator.
    let mut report = SynthReport::default();
    for (item, slot) in items.iter().zip(slots.into_iter()) {
        match slot {
            Some(Ok(draft)) => {
                let slug = store.reserve_slug(&slugify(&draft.title));
                let article = Article {
                    slug: slug.clone(),
                    title: draft.title,
                    date: draft.date,
                    category: draft.category,
                    reporter: draft.reporter,
                    summary: draft.summary,
                    tags: draft.tags,
                    sources: draft.sources,
                    body: draft.body,
                };
                store.insert(&article)?;
                ledger.record(&item.id, Outcome::Published { slug: slug.clone() });
                ledger.persist()?;
                tracing::info!(item = %item.id, slug = %slug, "published article");
                report.published.push(slug);
            }
            Some(Err(SynthesisFailure::Malformed(reason))) => {
                tracing::warn!(item = %item.id, %reason, "malformed generation output; tombstoning");
                ledger.record(&item.id, Outcome::Skipped { reason });
                ledger.persist()?;
                report.malformed += 1;
            }
            Some(Err(SynthesisFailure::Transient(reason))) => {
                tracing::warn!(item = %item.id, %reason, "transient generation failure; will retry next run");
                report.transient += 1;
            }
            None => {
                report.transient += 1;
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_draft_accepts_well_formed_document() {
        let doc = client::MockClient::canned().response;
        let draft = parse_draft(&doc).unwrap();
        assert_eq!(draft.category, Category::Markets);
        assert_eq!(draft.sources.len(), 1);
        assert_eq!(draft.body, "Mock article body.");
    }

    #[test]
    fn parse_draft_rejects_missing_fence() {
        assert!(matches!(
            parse_draft("no front matter here"),
            Err(SynthesisFailure::Malformed(_))
        ));
    }

    #[test]
    fn parse_draft_rejects_bad_category() {
        let doc = client::MockClient::canned()
            .response
            .replace("category: markets", "category: astrology");
        assert!(matches!(parse_draft(&doc), Err(SynthesisFailure::Malformed(_))));
    }

    #[test]
    fn parse_draft_rejects_empty_body() {
        let doc = client::MockClient::canned()
            .response
            .replace("Mock article body.", "");
        assert!(matches!(parse_draft(&doc), Err(SynthesisFailure::Malformed(_))));
    }
}
