// src/lib.rs
// Public library surface for the pipeline stages and integration tests.

pub mod article;
pub mod config;
pub mod error;
pub mod frontmatter;
pub mod fsutil;
pub mod ingest;
pub mod ledger;
pub mod pipeline;
pub mod site;
pub mod store;
pub mod synth;

pub use crate::article::{Article, Category, Source};
pub use crate::error::{PipelineError, SynthesisFailure};
pub use crate::ledger::{Ledger, Outcome};
pub use crate::pipeline::WorkPaths;
pub use crate::store::ArticleStore;
