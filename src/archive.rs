//! Per-article archive workflow.
//!
//! Given one front-page story, the archiver fetches its discussion page,
//! persists the raw bytes, walks the comment tree, and downloads every
//! resource linked from comment bodies — all through the shared fetch gate.
//! The result is a directory per story:
//!
//! ```text
//! {output}/{id}/index.html              raw discussion page
//! {output}/{id}/comments/{file}         one file per fetched comment link
//! {output}/{id}/comments/index.json     comment id → [[fileName, sourceUrl], …]
//! ```
//!
//! Per-link failures are logged and skipped; they never abort the article.
//! The whole article fails only when its discussion page cannot be fetched
//! or does not parse as a discussion page, in which case the story stays a
//! candidate for the next poll.

use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

use crate::error::CrawlError;
use crate::fetch::{ContentKind, Fetch, FetchOutcome};
use crate::ledger::Ledger;
use crate::models::{ArticleSummary, CommentIndex, CommentLinkRecord, FrontPageEntry};
use crate::{parse, store, utils};

/// Root of the source site; the front page lives here and item pages hang
/// off it as `item?id=<id>`.
pub const SITE_URL: &str = "https://news.ycombinator.com/";

/// Discussion page URL for a story id.
pub fn item_url(id: &str) -> String {
    format!("{SITE_URL}item?id={id}")
}

/// Result of driving one story through the archive workflow.
#[derive(Debug)]
pub enum ArchiveOutcome {
    /// Discussion page archived; the summary is ready for the ledger.
    Archived(ArticleSummary),
    /// Story already present in the ledger; no network work was issued.
    Skipped,
    /// The story could not be archived this pass and is not recorded.
    Failed(CrawlError),
}

/// One comment link queued for download.
struct LinkJob {
    comment_id: String,
    /// Position of the link within its comment, in discovery order.
    seq: usize,
    url: String,
}

/// Collision-free file name for a fetched comment resource.
///
/// HTML gets `{commentId}_{seq}.html`; anything else keeps the resource's
/// base name as a hint: `{commentId}_{seq}_{baseName}`. Uniqueness follows
/// from comment ids being unique within an article and `seq` within a
/// comment.
fn link_file_name(comment_id: &str, seq: usize, source_url: &str, kind: ContentKind) -> String {
    match kind {
        ContentKind::Html => format!("{comment_id}_{seq}.html"),
        ContentKind::Other => {
            let base = utils::base_name(source_url);
            if base.is_empty() {
                format!("{comment_id}_{seq}")
            } else {
                format!("{comment_id}_{seq}_{base}")
            }
        }
    }
}

/// Archive one front-page story.
///
/// Fetches the discussion page, persists it, then fans out downloads for
/// every comment-linked resource under the fetcher's shared gate. Comment
/// link lists in the resulting index preserve markup discovery order even
/// though downloads complete in arbitrary order.
///
/// The ledger is consulted before any network work: an already-archived
/// story returns [`ArchiveOutcome::Skipped`] without issuing a request.
#[instrument(level = "info", skip_all, fields(id = %entry.id))]
pub async fn archive<F: Fetch>(
    entry: &FrontPageEntry,
    ledger: &Ledger,
    fetcher: &F,
    output: &Path,
) -> ArchiveOutcome {
    if ledger.contains(&entry.id) {
        debug!("Already archived; skipping");
        return ArchiveOutcome::Skipped;
    }

    let url = item_url(&entry.id);
    let page = match fetcher.fetch(&url).await {
        FetchOutcome::Success { bytes, .. } => bytes,
        FetchOutcome::Failure { reason } => {
            return ArchiveOutcome::Failed(CrawlError::Network(format!("{url}: {reason}")));
        }
    };

    let article_dir = output.join(&entry.id);
    if let Err(e) = store::save(article_dir.join("index.html"), &page).await {
        // The page itself was fetched; losing the raw snapshot costs this
        // pass only and must not retract the archive.
        warn!(error = %e, "Failed to persist discussion page");
    }

    info!(title = %entry.title, href = %entry.href, "News");
    let summary = ArticleSummary {
        title: entry.title.clone(),
        url,
    };

    let html = String::from_utf8_lossy(&page);
    let threads = match parse::comment_threads(&html) {
        Ok(threads) => threads,
        Err(e) => return ArchiveOutcome::Failed(e),
    };

    let mut jobs = Vec::new();
    for thread in &threads {
        // threads with no outbound links produce no files and no index entry
        for (seq, link) in thread.links.iter().enumerate() {
            jobs.push(LinkJob {
                comment_id: thread.id.clone(),
                seq,
                url: link.clone(),
            });
        }
    }
    if jobs.is_empty() {
        debug!("No comment links to download");
        return ArchiveOutcome::Archived(summary);
    }

    let comments_dir = article_dir.join("comments");
    let job_count = jobs.len();
    debug!(links = job_count, "Downloading comment-linked resources");

    // Fan out every link at once; the fetcher's gate is the actual bound on
    // in-flight requests.
    let fetched: Vec<Option<(String, usize, CommentLinkRecord)>> = stream::iter(jobs)
        .map(|job| {
            let comments_dir = comments_dir.clone();
            async move {
                match fetcher.fetch(&job.url).await {
                    FetchOutcome::Success { bytes, kind } => {
                        let file_name = link_file_name(&job.comment_id, job.seq, &job.url, kind);
                        match store::save(comments_dir.join(&file_name), &bytes).await {
                            Ok(()) => {
                                info!(comment = %job.comment_id, url = %utils::truncate_for_log(&job.url, 200), file = %file_name, "Comm");
                                Some((
                                    job.comment_id,
                                    job.seq,
                                    CommentLinkRecord(file_name, job.url),
                                ))
                            }
                            Err(e) => {
                                warn!(comment = %job.comment_id, error = %e, "Failed to persist comment resource");
                                None
                            }
                        }
                    }
                    FetchOutcome::Failure { reason } => {
                        info!(comment = %job.comment_id, url = %utils::truncate_for_log(&job.url, 200), %reason, "Comm link not retrieved");
                        None
                    }
                }
            }
        })
        .buffer_unordered(job_count)
        .collect()
        .await;

    // Re-establish discovery order per comment; downloads completed in
    // whatever order the network produced.
    let mut per_comment: BTreeMap<String, Vec<(usize, CommentLinkRecord)>> = BTreeMap::new();
    for (comment_id, seq, record) in fetched.into_iter().flatten() {
        per_comment.entry(comment_id).or_default().push((seq, record));
    }
    let mut index = CommentIndex::new();
    for (comment_id, mut records) in per_comment {
        records.sort_by_key(|(seq, _)| *seq);
        index.insert(
            comment_id,
            records.into_iter().map(|(_, record)| record).collect(),
        );
    }

    if !index.is_empty() {
        match serde_json::to_vec(&index) {
            Ok(json) => {
                if let Err(e) = store::save(comments_dir.join("index.json"), &json).await {
                    warn!(error = %e, "Failed to persist comment index");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize comment index"),
        }
    }

    ArchiveOutcome::Archived(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::stub::StubFetcher;

    const ITEM_WITH_COMMENTS: &str = r#"
        <html><body>
        <table class="fatitem">
          <tr class="athing" id="200"><td>
            <span class="titleline"><a href="https://example.com/story">Story</a></span>
          </td></tr>
        </table>
        <table class="comment-tree">
          <tr class="athing comtr" id="2001"><td>
            <span class="commtext"><a href="https://example.com/x">x</a>
            <a href="https://example.com/slow">slow</a></span>
          </td></tr>
          <tr class="athing comtr" id="2002"><td>
            <span class="commtext">nothing linked</span>
          </td></tr>
        </table>
        </body></html>"#;

    const ITEM_WITHOUT_COMMENTS: &str = r#"
        <html><body>
        <table class="fatitem">
          <tr class="athing" id="201"><td>
            <span class="titleline"><a href="https://example.com/s">Quiet</a></span>
          </td></tr>
        </table>
        </body></html>"#;

    fn entry(id: &str, title: &str) -> FrontPageEntry {
        FrontPageEntry {
            id: id.to_string(),
            title: title.to_string(),
            href: format!("https://example.com/{id}"),
        }
    }

    #[test]
    fn test_item_url() {
        assert_eq!(
            item_url("8863"),
            "https://news.ycombinator.com/item?id=8863"
        );
    }

    #[test]
    fn test_link_file_name_html() {
        assert_eq!(
            link_file_name("2001", 0, "https://example.com/page", ContentKind::Html),
            "2001_0.html"
        );
    }

    #[test]
    fn test_link_file_name_other_keeps_base_name() {
        assert_eq!(
            link_file_name(
                "2001",
                1,
                "https://example.com/paper.pdf?dl=1",
                ContentKind::Other
            ),
            "2001_1_paper.pdf"
        );
    }

    #[test]
    fn test_link_file_name_other_without_base_name() {
        assert_eq!(
            link_file_name("2001", 2, "https://example.com", ContentKind::Other),
            "2001_2"
        );
    }

    #[tokio::test]
    async fn test_archive_skips_story_already_in_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = Ledger::empty(dir.path().join("parsed.json"));
        ledger.record(
            "101".to_string(),
            ArticleSummary {
                title: "Seen".to_string(),
                url: item_url("101"),
            },
        );
        let fetcher = StubFetcher::new();

        let outcome = archive(&entry("101", "Seen"), &ledger, &fetcher, dir.path()).await;

        assert!(matches!(outcome, ArchiveOutcome::Skipped));
        assert_eq!(fetcher.request_count(), 0);
    }

    #[tokio::test]
    async fn test_archive_fails_when_discussion_page_unreachable() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::empty(dir.path().join("parsed.json"));
        let fetcher = StubFetcher::new().failing(&item_url("300"), "status 503 Service Unavailable");

        let outcome = archive(&entry("300", "Down"), &ledger, &fetcher, dir.path()).await;

        assert!(matches!(
            outcome,
            ArchiveOutcome::Failed(CrawlError::Network(_))
        ));
        assert!(!dir.path().join("300").exists());
    }

    #[tokio::test]
    async fn test_archive_fails_on_page_that_is_not_a_discussion() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::empty(dir.path().join("parsed.json"));
        let fetcher =
            StubFetcher::new().html(&item_url("301"), "<html><body>gone</body></html>");

        let outcome = archive(&entry("301", "Odd"), &ledger, &fetcher, dir.path()).await;

        assert!(matches!(
            outcome,
            ArchiveOutcome::Failed(CrawlError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_archive_story_without_comments() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::empty(dir.path().join("parsed.json"));
        let fetcher = StubFetcher::new().html(&item_url("201"), ITEM_WITHOUT_COMMENTS);

        let outcome = archive(&entry("201", "Quiet"), &ledger, &fetcher, dir.path()).await;

        let ArchiveOutcome::Archived(summary) = outcome else {
            panic!("expected Archived");
        };
        assert_eq!(summary.title, "Quiet");
        assert_eq!(summary.url, item_url("201"));
        assert!(dir.path().join("201").join("index.html").exists());
        assert!(!dir.path().join("201").join("comments").exists());
        // exactly one request: the discussion page itself
        assert_eq!(fetcher.request_count(), 1);
    }

    #[tokio::test]
    async fn test_archive_mixed_link_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::empty(dir.path().join("parsed.json"));
        let fetcher = StubFetcher::new()
            .html(&item_url("200"), ITEM_WITH_COMMENTS)
            .html("https://example.com/x", "<html>x</html>")
            .failing("https://example.com/slow", "timed out");

        let outcome = archive(&entry("200", "Story"), &ledger, &fetcher, dir.path()).await;

        assert!(matches!(outcome, ArchiveOutcome::Archived(_)));

        let comments = dir.path().join("200").join("comments");
        assert!(comments.join("2001_0.html").exists());
        // the timed-out link produced no file
        assert!(!comments.join("2001_1.html").exists());

        let index: CommentIndex =
            serde_json::from_slice(&std::fs::read(comments.join("index.json")).unwrap()).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(
            index["2001"],
            vec![CommentLinkRecord(
                "2001_0.html".to_string(),
                "https://example.com/x".to_string()
            )]
        );
        // the linkless comment has no entry
        assert!(!index.contains_key("2002"));
    }

    #[tokio::test]
    async fn test_archive_index_preserves_discovery_order() {
        let page = r#"
            <html><body>
            <table class="fatitem"><tr class="athing" id="400"><td></td></tr></table>
            <table class="comment-tree">
              <tr class="athing comtr" id="4001"><td>
                <span class="commtext">
                  <a href="https://example.com/first">1</a>
                  <a href="https://example.com/data.bin">2</a>
                  <a href="https://example.com/third">3</a>
                </span>
              </td></tr>
            </table>
            </body></html>"#;
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::empty(dir.path().join("parsed.json"));
        let fetcher = StubFetcher::new()
            .html(&item_url("400"), page)
            .html("https://example.com/first", "<html>1</html>")
            .other("https://example.com/data.bin", b"\x00\x01")
            .html("https://example.com/third", "<html>3</html>");

        let outcome = archive(&entry("400", "Ordered"), &ledger, &fetcher, dir.path()).await;
        assert!(matches!(outcome, ArchiveOutcome::Archived(_)));

        let comments = dir.path().join("400").join("comments");
        let index: CommentIndex =
            serde_json::from_slice(&std::fs::read(comments.join("index.json")).unwrap()).unwrap();
        let files: Vec<&str> = index["4001"].iter().map(|r| r.0.as_str()).collect();
        assert_eq!(files, vec!["4001_0.html", "4001_1_data.bin", "4001_2.html"]);
        let urls: Vec<&str> = index["4001"].iter().map(|r| r.1.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/first",
                "https://example.com/data.bin",
                "https://example.com/third"
            ]
        );
        assert!(comments.join("4001_1_data.bin").exists());
    }
}
