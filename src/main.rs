//! Molt Street Journal pipeline binary entrypoint.
//!
//! Three-stage batch job: `fetch` pulls RSS/Atom feeds through the dedup
//! ledger, `generate` synthesizes articles for new items, `build` emits the
//! static dual-view site. `run` chains all three. Per-feed and per-item
//! failures are reported as counts and exit zero; only fatal conditions
//! (unreadable config, corrupt ledger, structural build conflicts) exit
//! non-zero.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use moltstreet_pipeline::config;
use moltstreet_pipeline::pipeline::{build_stage, fetch_stage, generate_stage_with, WorkPaths};
use moltstreet_pipeline::synth::client::build_client;

#[derive(Parser)]
#[command(name = "moltstreet-pipeline", version, about)]
struct Cli {
    /// Config file (default: $MOLTSTREET_FEEDS_PATH, then config/feeds.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Working state directory (ledger, pending items)
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    /// Article store root
    #[arg(long, global = true, default_value = "content/articles")]
    content_dir: PathBuf,

    /// Static site output directory
    #[arg(long, global = true, default_value = "site")]
    out_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch configured feeds and queue new items
    Fetch,
    /// Synthesize articles for queued items
    Generate,
    /// Build the static site from the article store
    Build,
    /// Fetch, generate and build in one invocation
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env in local runs; no-op elsewhere.
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) => config::load_from(path)?,
        None => config::load_default()?,
    };
    let paths = WorkPaths {
        data_dir: cli.data_dir.clone(),
        content_dir: cli.content_dir.clone(),
        out_dir: cli.out_dir.clone(),
    };

    match cli.command {
        Command::Fetch => {
            fetch_stage(&cfg, &paths).await?;
        }
        Command::Generate => {
            let client = build_client()?;
            generate_stage_with(client, &cfg, &paths).await?;
        }
        Command::Build => {
            build_stage(&cfg, &paths)?;
        }
        Command::Run => {
            fetch_stage(&cfg, &paths).await?;
            let client = build_client()?;
            generate_stage_with(client, &cfg, &paths).await?;
            build_stage(&cfg, &paths)?;
        }
    }
    Ok(())
}
