//! # hncrawl
//!
//! A polling archiver for Hacker News discussions. Each pass reads the
//! ranked front page, archives the discussion page of every story not seen
//! before, and downloads every resource linked from inside that
//! discussion's comments.
//!
//! ## Features
//!
//! - Bounded-concurrency downloading: one counting semaphore caps in-flight
//!   requests across the front page, discussion pages, and comment links
//! - Content-aware, collision-free file names for downloaded resources
//! - A durable ledger (`parsed.json`) making polling idempotent across
//!   restarts
//! - Partial-failure tolerance: a dead link or a failed story never aborts
//!   a pass
//!
//! ## Usage
//!
//! ```sh
//! hncrawl -o ./downloads          # poll every 30s until interrupted
//! hncrawl --once -n 10            # archive the top 10 stories, then exit
//! ```
//!
//! ## Architecture
//!
//! The pipeline is sequential per article and parallel within one:
//! 1. **Polling**: fetch the front page, extract ranked story rows
//! 2. **Archiving**: per new story, fetch + persist its discussion page
//! 3. **Fan-out**: download comment-linked resources under the shared gate
//! 4. **Ledger**: record the story, flush the full mapping once per pass

use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod archive;
mod cli;
mod error;
mod fetch;
mod ledger;
mod models;
mod parse;
mod poll;
mod store;
mod utils;

use cli::Cli;
use fetch::{GatedFetcher, HttpFetcher};
use ledger::Ledger;
use poll::PollOptions;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // Parse CLI first so the -d flag can pick the default log level
    let args = Cli::parse();

    // --- Tracing init ---
    let default_level = if args.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("hncrawl starting up");
    debug!(?args, "Parsed CLI arguments");

    // Early check: ensure the output dir is writable before any network work
    if let Err(e) = ensure_writable_dir(&args.output).await {
        tracing::error!(
            path = %args.output,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // --- HTTP client: per-request budget, identity, optional proxy ---
    let mut builder = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .user_agent(concat!("hncrawl/", env!("CARGO_PKG_VERSION")));
    if let Some(proxy) = &args.proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
        info!(%proxy, "Using upstream proxy");
    }
    let client = builder.build()?;
    let fetcher = GatedFetcher::new(HttpFetcher::new(client), args.max_tasks);
    info!(
        max_tasks = args.max_tasks,
        timeout_secs = args.timeout,
        "Fetcher ready"
    );

    let output = PathBuf::from(&args.output);
    let mut ledger = Ledger::load(output.join(ledger::LEDGER_FILE)).await;

    // --- Shutdown wiring: finish the current article, flush, exit ---
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for interrupt signal");
        }
        info!("Interrupt received; finishing current article then stopping");
        let _ = shutdown_tx.send(true);
    });

    let opts = PollOptions {
        max_candidates: args.numbers,
        interval: Duration::from_secs(args.sleep),
        once: args.once,
        output,
    };
    poll::run(&opts, &fetcher, &mut ledger, shutdown_rx).await;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        archived_total = ledger.len(),
        "Execution complete"
    );

    Ok(())
}
