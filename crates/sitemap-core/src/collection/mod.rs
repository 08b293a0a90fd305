//! Collections capped at the sitemap protocol's entry ceiling.
//!
//! Both [`UrlSet`] and [`SitemapIndexCollection`] share one capacity
//! discipline with a fixed policy per operation:
//!
//! - **Construction truncates.** [`Bounded::new`] and
//!   [`Bounded::with_limit`] keep the first `limit` entries and log how many
//!   were dropped. Construction is used when aggregating repository output,
//!   where the tail of an oversized result is expected to spill into a later
//!   build.
//! - **Mutation fails.** [`Bounded::add`] on a full collection returns
//!   [`Error::ResourceLimited`](crate::Error::ResourceLimited) and leaves the
//!   collection untouched. Callers that add one entry at a time are
//!   expected to check [`Bounded::is_full`].
//!
//! ```rust
//! use sitemap_core::{UrlEntry, UrlSet};
//!
//! let entries = (0..3)
//!     .map(|i| UrlEntry::new(format!("https://example.com/{i}")))
//!     .collect::<Result<Vec<_>, _>>()?;
//!
//! let mut set = UrlSet::with_limit(entries, 2);
//! assert_eq!(set.count(), 2);
//! assert!(set.add(UrlEntry::new("https://example.com/3")?).is_err());
//! # Ok::<(), sitemap_core::Error>(())
//! ```

mod xml;

use serde::Serialize;

use crate::{Error, Result, SitemapIndexEntry, UrlEntry};

/// The sitemap protocol's per-file entry ceiling.
pub const DEFAULT_MAX_ENTRIES: usize = 50_000;

/// An ordered collection that never holds more than its limit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bounded<T> {
    entries: Vec<T>,
    limit: usize,
}

/// Page entries for one sitemap file.
pub type UrlSet = Bounded<UrlEntry>;

/// Sitemap file references for one sitemap index.
pub type SitemapIndexCollection = Bounded<SitemapIndexEntry>;

impl<T> Bounded<T> {
    /// Build a collection at the protocol limit, truncating the excess.
    #[must_use]
    pub fn new(entries: Vec<T>) -> Self {
        Self::with_limit(entries, DEFAULT_MAX_ENTRIES)
    }

    /// Build a collection with a custom limit, truncating the excess.
    ///
    /// The limit is clamped to `1..=DEFAULT_MAX_ENTRIES`.
    #[must_use]
    pub fn with_limit(mut entries: Vec<T>, limit: usize) -> Self {
        let limit = limit.clamp(1, DEFAULT_MAX_ENTRIES);
        if entries.len() > limit {
            tracing::warn!(
                dropped = entries.len() - limit,
                limit,
                "Truncating sitemap collection to its entry limit"
            );
            entries.truncate(limit);
        }
        Self { entries, limit }
    }

    /// An empty collection at the protocol limit.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            entries: Vec::new(),
            limit: DEFAULT_MAX_ENTRIES,
        }
    }

    /// Append one entry, failing when the collection is full.
    pub fn add(&mut self, entry: T) -> Result<()> {
        if self.is_full() {
            return Err(Error::ResourceLimited(format!(
                "sitemap collection is full ({} entries)",
                self.limit
            )));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Number of entries held.
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Whether the collection holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether [`Self::add`] would fail.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.limit
    }

    /// The entry ceiling for this collection.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Free slots before the collection is full.
    #[must_use]
    pub fn remaining_capacity(&self) -> usize {
        self.limit.saturating_sub(self.entries.len())
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    /// Consume the collection, yielding its entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<T> {
        self.entries
    }
}

impl<T> Default for Bounded<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a, T> IntoIterator for &'a Bounded<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl UrlSet {
    /// Render as a `<urlset>` document.
    pub fn to_xml(&self) -> Result<String> {
        xml::write_urlset(self.entries())
    }

    /// Whether any entry carries image metadata.
    #[must_use]
    pub fn has_images(&self) -> bool {
        self.iter().any(|entry| !entry.images().is_empty())
    }
}

impl SitemapIndexCollection {
    /// Render as a `<sitemapindex>` document.
    pub fn to_xml(&self) -> Result<String> {
        xml::write_index(self.entries())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn entries(n: usize) -> Vec<UrlEntry> {
        (0..n)
            .map(|i| UrlEntry::new(format!("https://example.com/p/{i}")).unwrap())
            .collect()
    }

    #[test]
    fn test_constructor_truncates_at_protocol_limit() {
        // Given: More entries than the protocol allows
        let oversized = entries(DEFAULT_MAX_ENTRIES + 7);

        // When: Constructing the set
        let set = UrlSet::new(oversized);

        // Then: The first 50,000 are kept, in order
        assert_eq!(set.count(), DEFAULT_MAX_ENTRIES);
        assert!(set.is_full());
        assert_eq!(set.entries()[0].loc(), "https://example.com/p/0");
        assert_eq!(
            set.entries()[DEFAULT_MAX_ENTRIES - 1].loc(),
            format!("https://example.com/p/{}", DEFAULT_MAX_ENTRIES - 1)
        );
    }

    #[test]
    fn test_add_past_protocol_limit_fails() {
        // Given: A set filled to exactly the limit
        let mut set = UrlSet::new(entries(DEFAULT_MAX_ENTRIES));
        assert_eq!(set.remaining_capacity(), 0);

        // When: Adding one more entry
        let err = set.add(UrlEntry::new("https://example.com/extra").unwrap()).unwrap_err();

        // Then: The add fails and the set is unchanged
        assert!(matches!(err, Error::ResourceLimited(_)));
        assert_eq!(set.count(), DEFAULT_MAX_ENTRIES);
    }

    #[test]
    fn test_add_until_full() {
        let mut set = UrlSet::with_limit(Vec::new(), 2);
        set.add(UrlEntry::new("https://example.com/a").unwrap()).unwrap();
        assert!(!set.is_full());
        set.add(UrlEntry::new("https://example.com/b").unwrap()).unwrap();
        assert!(set.is_full());
        assert!(set.add(UrlEntry::new("https://example.com/c").unwrap()).is_err());
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(UrlSet::with_limit(Vec::new(), 0).limit(), 1);
        assert_eq!(UrlSet::with_limit(Vec::new(), 1_000_000).limit(), DEFAULT_MAX_ENTRIES);
    }

    #[test]
    fn test_index_collection_shares_discipline() {
        let refs: Vec<SitemapIndexEntry> = (0..5)
            .map(|i| {
                SitemapIndexEntry::new(format!("https://example.com/sitemap-{i}.xml"), None)
                    .unwrap()
            })
            .collect();
        let mut index = SitemapIndexCollection::with_limit(refs, 3);
        assert_eq!(index.count(), 3);
        let extra = SitemapIndexEntry::new("https://example.com/sitemap-x.xml", None).unwrap();
        assert!(matches!(index.add(extra), Err(Error::ResourceLimited(_))));
    }

    #[test]
    fn test_empty_default() {
        let set = UrlSet::default();
        assert!(set.is_empty());
        assert_eq!(set.limit(), DEFAULT_MAX_ENTRIES);
        assert!(!set.has_images());
    }
}
