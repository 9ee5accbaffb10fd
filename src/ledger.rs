// src/ledger.rs
//! Dedup ledger: which feed-item identities have already been resolved, and
//! how. Monotonically growing; an identity present here is never resubmitted
//! to synthesis. Transient synthesis failures are deliberately *not*
//! recorded, so those items come back on the next run.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::fsutil::write_atomic;
use crate::ingest::types::FeedItem;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The item produced an article with this slug.
    Published { slug: String },
    /// The item was permanently resolved without an article (e.g. the
    /// generated output failed validation). Not retried.
    Skipped { reason: String },
}

#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    // BTreeMap keeps the persisted file diff-stable across runs.
    entries: BTreeMap<String, Outcome>,
}

impl Ledger {
    /// Open the ledger at `path`; a missing file is an empty ledger.
    pub fn open(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading ledger {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("parsing ledger {}", path.display()))?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn outcome(&self, id: &str) -> Option<&Outcome> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pure set difference against the ledger, order-preserving. Repeats of
    /// the same identity within one batch are also collapsed to the first.
    pub fn ingest(&self, items: Vec<FeedItem>) -> Vec<FeedItem> {
        let mut seen_this_batch: HashSet<String> = HashSet::new();
        items
            .into_iter()
            .filter(|it| !self.contains(&it.id) && seen_this_batch.insert(it.id.clone()))
            .collect()
    }

    /// Commit an identity with its outcome. Later records for the same
    /// identity replace earlier ones (append-or-update).
    pub fn record(&mut self, id: &str, outcome: Outcome) {
        self.entries.insert(id.to_string(), outcome);
    }

    /// Persist atomically. Called per committed item so a mid-run abort
    /// loses no progress.
    pub fn persist(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries).context("serializing ledger")?;
        write_atomic(&self.path, &json)
    }
}
