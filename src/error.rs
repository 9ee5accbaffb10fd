// src/error.rs
//! Pipeline error taxonomy.
//!
//! Per-feed and per-item failures are non-fatal: they are caught at their own
//! boundary, counted and logged, and never stop sibling work. Only structural
//! conflicts inside the site builder abort a stage.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A single feed could not be fetched or parsed this run. The feed is
    /// retried on the next scheduled run; other feeds are unaffected.
    #[error("feed '{feed}' unavailable: {reason}")]
    FeedUnavailable { feed: String, reason: String },

    /// Two articles mapped to the same output path. This indicates a
    /// corrupted store and fails the build stage.
    #[error("structural conflict: duplicate output path {0}")]
    BuildStructuralConflict(PathBuf),
}

/// Per-item synthesis failure. Transient failures leave no ledger entry so
/// the item is retried on the next run; malformed output is tombstoned
/// because resubmitting the same input is expected to fail identically.
#[derive(Debug, Error)]
pub enum SynthesisFailure {
    #[error("transient generation failure: {0}")]
    Transient(String),

    #[error("malformed generation output: {0}")]
    Malformed(String),
}
