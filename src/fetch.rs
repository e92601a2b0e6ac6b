//! Bounded HTTP fetching with a global concurrency gate.
//!
//! Every download in the crawler — the front page, discussion pages, and
//! comment-linked resources — goes through one [`Fetch`] implementation, so
//! a single counting semaphore bounds the number of simultaneously in-flight
//! requests across all call sites.
//!
//! # Architecture
//!
//! The module uses a trait-based design for flexibility:
//! - [`Fetch`]: core trait defining a single bounded GET
//! - [`HttpFetcher`]: issues real requests via `reqwest` and classifies the
//!   outcome
//! - [`GatedFetcher`]: decorator that adds the concurrency gate to any
//!   [`Fetch`] implementation
//!
//! # Outcome classification
//!
//! HTTP status 200 yields [`FetchOutcome::Success`] with the raw body and a
//! normalized content kind. Any other status, transport error, timeout, or
//! failure while reading the body yields [`FetchOutcome::Failure`] with a
//! human-readable reason. Nothing escapes the fetcher boundary as an error
//! or panic.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

use crate::utils::truncate_for_log;

/// Normalized classification of a fetched body, derived from the
/// `Content-Type` response header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// `text/html`, with or without parameters.
    Html,
    /// Everything else, including responses without a `Content-Type`.
    Other,
}

impl ContentKind {
    /// Classify a `Content-Type` header value.
    pub fn from_content_type(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim_start().to_ascii_lowercase().starts_with("text/html") => {
                ContentKind::Html
            }
            _ => ContentKind::Other,
        }
    }
}

/// Tagged result of one network attempt. Exactly one of the two variants,
/// never both.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Status 200; the full body was read.
    Success {
        /// Raw response body.
        bytes: Vec<u8>,
        /// Normalized content classification.
        kind: ContentKind,
    },
    /// Anything else: non-200 status, transport error, or timeout.
    Failure {
        /// Human-readable reason, suitable for logging.
        reason: String,
    },
}

impl FetchOutcome {
    /// True for the `Success` variant.
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }
}

/// Trait for issuing a single bounded GET.
///
/// Implementors classify every outcome into a [`FetchOutcome`]; callers
/// never see a transport error directly. The orchestration and the archiver
/// are generic over this trait so tests can inject canned responses.
pub trait Fetch {
    /// Download `url` and classify the outcome.
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

/// Fetcher issuing real HTTP requests.
///
/// The per-request wall-clock budget and the optional upstream proxy are
/// configured on the [`reqwest::Client`] it wraps, so every call site gets
/// the same limits.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Wrap a preconfigured client.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> FetchOutcome {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                return FetchOutcome::Failure {
                    reason: describe_error(&e),
                };
            }
        };

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return FetchOutcome::Failure {
                reason: format!("status {status}"),
            };
        }

        let kind = ContentKind::from_content_type(
            response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
        );

        match response.bytes().await {
            Ok(bytes) => {
                debug!(bytes = bytes.len(), ?kind, "Fetched");
                FetchOutcome::Success {
                    bytes: bytes.to_vec(),
                    kind,
                }
            }
            Err(e) => {
                warn!(error = %e, "Body read failed");
                FetchOutcome::Failure {
                    reason: describe_error(&e),
                }
            }
        }
    }
}

/// Render a transport error as a short reason string.
fn describe_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "timed out".to_string()
    } else {
        truncate_for_log(&e.to_string(), 200)
    }
}

/// Decorator that adds the global concurrency gate to any [`Fetch`]
/// implementation.
///
/// A permit is acquired before delegating to the inner fetcher and released
/// when the call returns, on success and failure alike — the permit is held
/// by a guard that releases on drop, so no outcome can leak a slot.
pub struct GatedFetcher<F> {
    /// The fetcher doing the actual work.
    inner: F,
    /// Counting semaphore shared by every call through this fetcher.
    permits: Arc<Semaphore>,
}

impl<F: Fetch> GatedFetcher<F> {
    /// Gate `inner` behind at most `max_concurrent` simultaneous calls.
    pub fn new(inner: F, max_concurrent: usize) -> Self {
        Self {
            inner,
            permits: Arc::new(Semaphore::new(max_concurrent)),
        }
    }
}

impl<F: Fetch> Fetch for GatedFetcher<F> {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        // acquire() only fails if the semaphore is closed, which never
        // happens here; the permit drops at the end of the call.
        let _permit = self
            .permits
            .acquire()
            .await
            .expect("fetch gate unexpectedly closed");
        self.inner.fetch(url).await
    }
}
