//! Data models for front-page stories and their archived artifacts.
//!
//! This module defines the core data structures used throughout the crawler:
//! - [`FrontPageEntry`]: one ranked story row as parsed from the front page
//! - [`ArticleSummary`]: the durable record of an archived story
//! - [`CommentThread`]: one comment node and the outbound links in its body
//! - [`CommentLinkRecord`] / [`CommentIndex`]: attribution of downloaded
//!   resources back to the comments that linked them
//!
//! The on-disk shapes are fixed: the ledger maps story ids to
//! [`ArticleSummary`] objects, and each article's `comments/index.json` maps
//! comment ids to lists of `[fileName, sourceUrl]` pairs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One ranked story row from the front page.
///
/// Parsed eagerly into owned data so that it can outlive the document it
/// came from and travel across await points.
///
/// # Fields
///
/// * `id` - The site-assigned story id, stable across polls
/// * `title` - The story headline
/// * `href` - The story's outbound target URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontPageEntry {
    /// Site-assigned story id (the `id` attribute of the row).
    pub id: String,
    /// Headline text.
    pub title: String,
    /// Outbound target URL of the headline link.
    pub href: String,
}

/// The durable record of an archived story, written to the ledger.
///
/// Immutable once recorded. `url` is the discussion page URL
/// (`…/item?id=<id>`), not the story's outbound target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSummary {
    /// Story headline at the time it was archived.
    pub title: String,
    /// Discussion page URL.
    pub url: String,
}

/// One comment node plus the outbound links found in its body text.
///
/// `links` preserves markup discovery order and may be empty (a deleted
/// comment without body text, or a body with no anchors); empty threads
/// produce no files and no index entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentThread {
    /// Comment id, unique within the article.
    pub id: String,
    /// Outbound link URLs in the order they appear in the comment body.
    pub links: Vec<String>,
}

/// One fetched resource attributed to a comment: `(file name, source URL)`.
///
/// Serialized as a two-element JSON array, which is the shape stored in each
/// article's `comments/index.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentLinkRecord(pub String, pub String);

/// Mapping from comment id to the resources fetched for that comment,
/// in link discovery order. Built fresh per article and written once.
pub type CommentIndex = BTreeMap<String, Vec<CommentLinkRecord>>;
