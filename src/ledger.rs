//! Durable ledger of already-archived stories.
//!
//! The ledger is what makes polling idempotent: a story id present in it is
//! never fetched again. It is loaded once at startup, mutated in memory as
//! stories are archived, and flushed as a full snapshot once per traversal
//! pass — a crash mid-pass loses at most that pass's progress and never
//! corrupts previously committed entries.
//!
//! On disk the ledger is a single JSON object mapping story id to
//! [`ArticleSummary`]. Entries are kept in a `BTreeMap` and the summary
//! struct has a fixed field order, so an unchanged mapping re-serializes to
//! byte-identical output.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

use crate::error::CrawlError;
use crate::models::ArticleSummary;
use crate::store;

/// File name of the ledger snapshot inside the output directory.
pub const LEDGER_FILE: &str = "parsed.json";

/// Mapping from story id to its archived summary, bound to the snapshot
/// path it loads from and flushes to.
#[derive(Debug)]
pub struct Ledger {
    entries: BTreeMap<String, ArticleSummary>,
    path: PathBuf,
}

impl Ledger {
    /// Load the ledger from `path`.
    ///
    /// A missing file means a first run and yields an empty ledger. A
    /// corrupt or unreadable file also yields an empty ledger with a
    /// warning — archiving everything again is recoverable, crashing at
    /// startup is not.
    #[instrument(level = "info", skip_all)]
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ledger unreadable; starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ledger unreadable; starting empty");
                BTreeMap::new()
            }
        };
        info!(path = %path.display(), count = entries.len(), "Loaded ledger");
        Self { entries, path }
    }

    /// An empty ledger bound to `path`.
    #[cfg(test)]
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            entries: BTreeMap::new(),
            path: path.into(),
        }
    }

    /// Whether `id` has already been archived.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Record an archived story. In-memory only; call [`Ledger::flush`] to
    /// persist.
    pub fn record(&mut self, id: String, summary: ArticleSummary) {
        self.entries.insert(id, summary);
    }

    /// Number of archived stories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the full mapping, overwriting the previous snapshot.
    pub async fn flush(&self) -> Result<(), CrawlError> {
        let json = serde_json::to_vec(&self.entries).map_err(io::Error::other)?;
        store::save(&self.path, &json).await?;
        Ok(())
    }
}
