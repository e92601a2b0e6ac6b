//! Idempotent persistence of byte blobs to the archive directory.
//!
//! One entry point, [`save`]: write a blob at a path, creating missing
//! ancestor directories first. Writes go through `tokio::fs`, so the
//! destination handle is opened and released inside the call on every exit
//! path, including write errors.

use std::io;
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument};

/// Write `bytes` at `path`, creating missing ancestor directories.
///
/// Directory creation uses `create_dir_all`, which treats an
/// already-existing directory as success — concurrent saves of sibling
/// files sharing a parent cannot fail each other's creation step.
/// An existing file at `path` is overwritten.
///
/// # Errors
///
/// Returns the underlying I/O error if directory creation or the write
/// itself fails.
#[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
pub async fn save(path: impl AsRef<Path>, bytes: &[u8]) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, bytes).await?;
    debug!(bytes = bytes.len(), "Wrote blob");
    Ok(())
}
