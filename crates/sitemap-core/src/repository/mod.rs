//! Read-only views of the site's content.
//!
//! The generator never owns content. It asks a [`ContentRepository`] for
//! dated posts and an [`ArchiveRepository`] for undated archive pages (terms
//! and authors). [`CatalogRepository`] implements both over a JSON catalog
//! exported from the host site.

mod catalog;

use std::collections::BTreeMap;

pub use catalog::{Catalog, CatalogRepository};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, SitemapDate};

/// Publication state of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    /// Publicly visible.
    #[default]
    Published,
    /// Not yet published.
    Draft,
    /// Scheduled for future publication.
    Future,
    /// Visible only to authorised users.
    Private,
    /// Moved to trash.
    Trash,
}

impl ContentStatus {
    /// Whether items in this state belong in a sitemap.
    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Self::Published)
    }
}

/// An image attached to a content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Absolute image URL.
    pub url: String,
    /// Image title.
    #[serde(default)]
    pub title: Option<String>,
    /// Image caption.
    #[serde(default)]
    pub caption: Option<String>,
}

/// One dated piece of content (a post).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Stable identifier.
    pub id: u64,
    /// Permalink.
    pub url: String,
    /// Publication date in the site's calendar; selects the partition.
    pub date: SitemapDate,
    /// Last modification time.
    pub modified: DateTime<Utc>,
    /// Publication state.
    #[serde(default)]
    pub status: ContentStatus,
    /// Attached images.
    #[serde(default)]
    pub images: Vec<ImageRecord>,
}

/// A taxonomy term archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRecord {
    /// Stable identifier.
    pub id: u64,
    /// Taxonomy slug (`category`, `post_tag`, ...).
    pub taxonomy: String,
    /// Archive URL.
    pub url: String,
    /// Number of published items in the term.
    #[serde(default)]
    pub count: u64,
    /// Modification time of the newest item in the term.
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
}

/// An author archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRecord {
    /// Stable identifier.
    pub id: u64,
    /// Archive URL.
    pub url: String,
    /// Number of published items by the author.
    #[serde(default)]
    pub post_count: u64,
    /// Modification time of the author's newest item.
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
}

/// Queries over dated content.
///
/// Every method only considers publicly visible items. "No content" is an
/// empty answer, never an error.
pub trait ContentRepository: Send + Sync {
    /// Distinct dates holding at least one item, ascending.
    fn dates_with_content(&self) -> Result<Vec<SitemapDate>>;

    /// Distinct dates holding an item modified strictly after `since`,
    /// ascending.
    fn dates_modified_since(&self, since: DateTime<Utc>) -> Result<Vec<SitemapDate>>;

    /// Identifiers of the items published on `date`, at most `limit`, in a
    /// stable order.
    fn content_ids_for_date(&self, date: SitemapDate, limit: usize) -> Result<Vec<u64>>;

    /// Load items by identifier, preserving the requested order and skipping
    /// unknown identifiers.
    fn load_items(&self, ids: &[u64]) -> Result<Vec<ContentItem>>;

    /// Latest modification time among the items published on `date`.
    fn max_modified_for_date(&self, date: SitemapDate) -> Result<Option<DateTime<Utc>>>;

    /// Images attached to the items with the given permalinks.
    fn images_for_urls(&self, urls: &[&str]) -> Result<BTreeMap<String, Vec<ImageRecord>>>;
}

/// Queries over undated archive pages.
pub trait ArchiveRepository: Send + Sync {
    /// Non-empty terms of `taxonomy`, ordered by identifier.
    fn terms(&self, taxonomy: &str, offset: usize, limit: usize) -> Result<Vec<TermRecord>>;

    /// Number of non-empty terms of `taxonomy`.
    fn term_count(&self, taxonomy: &str) -> Result<u64>;

    /// Authors with published items, ordered by identifier.
    fn authors(&self, offset: usize, limit: usize) -> Result<Vec<AuthorRecord>>;

    /// Number of authors with published items.
    fn author_count(&self) -> Result<u64>;
}
