//! HTML extraction for the front page and discussion pages.
//!
//! Parsing is pure: bytes in, structured data out, no I/O. The selectors
//! are the one place the crawler knows anything about the source site's
//! markup — story rows are `tr.athing` with the story id in the `id`
//! attribute, headlines live in `span.titleline > a`, and discussion pages
//! carry their comments in `table.comment-tree` with the body text of each
//! comment in `span.commtext`.
//!
//! Structural failures (no story rows, no item header table) are reported
//! as [`CrawlError::Parse`] values for the caller to act on; a missing
//! comment tree is not a failure, because comments are optional.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use crate::error::CrawlError;
use crate::models::{CommentThread, FrontPageEntry};

static STORY_ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr.athing").unwrap());
static TITLE_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("span.titleline > a").unwrap());
static ITEM_HEADER: Lazy<Selector> = Lazy::new(|| Selector::parse("table.fatitem").unwrap());
static COMMENT_TREE: Lazy<Selector> = Lazy::new(|| Selector::parse("table.comment-tree").unwrap());
static COMMENT_ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr.athing").unwrap());
static COMMENT_TEXT: Lazy<Selector> = Lazy::new(|| Selector::parse("span.commtext").unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Extract the ranked story list from front-page markup.
///
/// Returns the stories in site rank order (document order). Rows missing an
/// id or a headline link are skipped.
///
/// # Errors
///
/// [`CrawlError::Parse`] when no story rows are present at all — the page
/// is not the expected front page, or the site changed shape.
pub fn front_page(html: &str) -> Result<Vec<FrontPageEntry>, CrawlError> {
    let document = Html::parse_document(html);

    let mut entries = Vec::new();
    for row in document.select(&STORY_ROW) {
        let Some(id) = row.value().attr("id") else {
            continue;
        };
        let Some(link) = row.select(&TITLE_LINK).next() else {
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        entries.push(FrontPageEntry {
            id: id.to_string(),
            title: link.text().collect::<String>().trim().to_string(),
            href: href.to_string(),
        });
    }

    if entries.is_empty() {
        return Err(CrawlError::Parse(
            "no story rows on front page".to_string(),
        ));
    }
    Ok(entries)
}

/// Extract the comment tree from discussion-page markup.
///
/// Each returned thread carries the outbound link URLs found in its body
/// text, in discovery order. Comments without body text (deleted or
/// flagged) and comments whose body has no anchors yield empty link lists;
/// the archiver skips those. A page without a comment tree yields an empty
/// vector — absence of comments is not a failure.
///
/// # Errors
///
/// [`CrawlError::Parse`] when the item header table is missing, meaning the
/// bytes are not a discussion page at all.
pub fn comment_threads(html: &str) -> Result<Vec<CommentThread>, CrawlError> {
    let document = Html::parse_document(html);

    if document.select(&ITEM_HEADER).next().is_none() {
        return Err(CrawlError::Parse(
            "item header table missing from discussion page".to_string(),
        ));
    }

    let Some(tree) = document.select(&COMMENT_TREE).next() else {
        return Ok(Vec::new());
    };

    let mut threads = Vec::new();
    for row in tree.select(&COMMENT_ROW) {
        let Some(id) = row.value().attr("id") else {
            continue;
        };
        let links = row
            .select(&COMMENT_TEXT)
            .next()
            .map(|body| {
                body.select(&ANCHOR)
                    .filter_map(|a| a.value().attr("href"))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        threads.push(CommentThread {
            id: id.to_string(),
            links,
        });
    }
    Ok(threads)
}
