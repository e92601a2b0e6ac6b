//! The polling loop driving passes over the front page.
//!
//! Each pass fetches the front page, takes the top candidates in rank
//! order, and drives the archiver over the ones not yet in the ledger —
//! sequentially, so concurrency lives inside the archiver's link fan-out
//! and the ledger is only ever touched from this task. The ledger is
//! flushed once per pass, after the candidate list is exhausted or a
//! shutdown cut the pass short.
//!
//! The loop stops when the front page cannot be fetched or yields no
//! stories (the source is unreachable or changed shape — blind retries
//! won't help), when single-pass mode completes, or when shutdown is
//! requested. A front-page failure exits before flushing, leaving the
//! previous snapshot untouched.

use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use crate::archive::{self, ArchiveOutcome, SITE_URL};
use crate::fetch::{Fetch, FetchOutcome};
use crate::ledger::Ledger;
use crate::parse;

/// Orchestration options consumed by [`run`].
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// How many top front-page stories to consider each pass.
    pub max_candidates: usize,
    /// Delay between passes in continuous mode.
    pub interval: Duration,
    /// Run a single pass and exit.
    pub once: bool,
    /// Root directory of the archive.
    pub output: PathBuf,
}

/// Drive polling passes until the source stops yielding stories, shutdown
/// is requested, or single-pass mode completes.
///
/// The `shutdown` receiver flips to `true` at most once; it is observed
/// between articles and during the inter-pass sleep, and an early stop
/// still flushes whatever the current pass completed.
#[instrument(level = "info", skip_all)]
pub async fn run<F: Fetch>(
    opts: &PollOptions,
    fetcher: &F,
    ledger: &mut Ledger,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(url = SITE_URL, "Root");
    let mut pass = 0u64;

    loop {
        pass += 1;
        debug!(pass, "Polling front page");

        let page = match fetcher.fetch(SITE_URL).await {
            FetchOutcome::Success { bytes, .. } => bytes,
            FetchOutcome::Failure { reason } => {
                error!(%reason, "Front page not retrieved; stopping");
                break;
            }
        };
        let entries = match parse::front_page(&String::from_utf8_lossy(&page)) {
            Ok(entries) => entries,
            Err(e) => {
                error!(error = %e, "Front page yielded no stories; stopping");
                break;
            }
        };

        let mut archived = 0usize;
        let mut skipped = 0usize;
        let mut failed = 0usize;
        for entry in entries.iter().take(opts.max_candidates) {
            if *shutdown.borrow() {
                info!("Shutdown requested; ending pass early");
                break;
            }
            match archive::archive(entry, ledger, fetcher, &opts.output).await {
                ArchiveOutcome::Archived(summary) => {
                    ledger.record(entry.id.clone(), summary);
                    archived += 1;
                }
                ArchiveOutcome::Skipped => skipped += 1,
                ArchiveOutcome::Failed(e) => {
                    warn!(id = %entry.id, error = %e, "Article not archived this pass");
                    failed += 1;
                }
            }
        }

        if let Err(e) = ledger.flush().await {
            error!(error = %e, "Failed to flush ledger");
        }
        info!(
            pass,
            archived,
            skipped,
            failed,
            total = ledger.len(),
            "End cycle"
        );

        if opts.once || *shutdown.borrow() {
            break;
        }

        info!(secs = opts.interval.as_secs(), "Waiting before next pass");
        tokio::select! {
            _ = sleep(opts.interval) => {}
            _ = shutdown.changed() => {
                info!("Shutdown requested during sleep");
                break;
            }
        }
        debug!("Repeat");
    }
}
