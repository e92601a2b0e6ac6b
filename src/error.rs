//! Failure taxonomy for units of crawl work.
//!
//! Each variant corresponds to one class of failure and carries the policy
//! the orchestration applies to it:
//!
//! | Variant | Scope | Policy |
//! |---------|-------|--------|
//! | [`CrawlError::Network`] | one fetch | logged; the item is absent this pass |
//! | [`CrawlError::Parse`] | front page or one article | front page stops the loop; an article stays a future candidate |
//! | [`CrawlError::Persistence`] | one write | logged; never aborts the traversal |
//!
//! There is no retry anywhere: an item that failed simply never entered the
//! ledger and becomes eligible again on the next poll.

use thiserror::Error;

/// Why one unit of crawl work could not be completed.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Non-200 status, transport error, or timeout.
    #[error("network failure: {0}")]
    Network(String),

    /// An expected structural element was absent from the markup.
    #[error("parse failure: {0}")]
    Parse(String),

    /// An I/O error while writing to storage.
    #[error("persistence failure: {0}")]
    Persistence(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_class_and_detail() {
        let e = CrawlError::Network("status 503".to_string());
        assert_eq!(e.to_string(), "network failure: status 503");

        let e = CrawlError::Parse("no story rows".to_string());
        assert_eq!(e.to_string(), "parse failure: no story rows");
    }

    #[test]
    fn test_io_error_converts_to_persistence() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let e: CrawlError = io.into();
        assert!(matches!(e, CrawlError::Persistence(_)));
        assert!(e.to_string().starts_with("persistence failure:"));
    }
}
