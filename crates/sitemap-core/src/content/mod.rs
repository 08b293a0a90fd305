//! Content providers turn repository rows into bounded URL collections.
//!
//! Three roles:
//!
//! - [`DateContentProvider`] builds the collection for one date partition
//!   ([`PostsProvider`]).
//! - [`PaginatedContentProvider`] builds undated archive pages one page at a
//!   time ([`TaxonomyProvider`], [`AuthorsProvider`]).
//! - [`UrlEnhancer`] decorates entries another provider produced
//!   ([`ImageEnhancer`]).
//!
//! Each provider owns a [`UrlPolicy`] deciding which URLs to skip and which
//! `changefreq`/`priority` to emit. "No results" is always an empty
//! collection.

mod authors;
mod images;
mod posts;
mod taxonomy;

use std::fmt;
use std::sync::Arc;

pub use authors::AuthorsProvider;
pub use images::ImageEnhancer;
pub use posts::{DEFAULT_POSTS_PER_SITEMAP, PostsProvider};
pub use taxonomy::TaxonomyProvider;

use crate::{ChangeFrequency, DEFAULT_MAX_ENTRIES, Result, SitemapDate, UrlEntry, UrlSet};

/// Provider of the URL collection for one date partition.
pub trait DateContentProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// URLs belonging to `date`.
    fn urls_for_date(&self, date: SitemapDate) -> Result<UrlSet>;
}

/// Provider of undated archive URLs split into pages.
///
/// Pages are numbered from 1.
pub trait PaginatedContentProvider: Send + Sync {
    /// Identifier used in sitemap file names (`sitemap-{name}-{page}.xml`).
    fn name(&self) -> &str;

    /// URLs on `page`, `per_page` at a time.
    fn urls(&self, page: usize, per_page: usize) -> Result<UrlSet>;

    /// Total number of URLs across all pages.
    fn total_count(&self) -> Result<u64>;

    /// Number of non-empty pages at `per_page` URLs each.
    fn page_count(&self, per_page: usize) -> Result<usize> {
        let per_page = clamp_per_page(per_page) as u64;
        let total = self.total_count()?;
        Ok(usize::try_from(total.div_ceil(per_page)).unwrap_or(usize::MAX))
    }

    /// Whether this provider contributes to the sitemap index.
    fn is_enabled(&self) -> bool;
}

/// Post-processor attaching extra data to existing entries.
///
/// Implementations return a new vector of the same length and order. Entries
/// that cannot be enhanced are returned unchanged.
pub trait UrlEnhancer: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Enhanced copies of `entries`.
    fn enhance(&self, entries: &[UrlEntry]) -> Result<Vec<UrlEntry>>;
}

type SkipFn = dyn Fn(&str) -> bool + Send + Sync;
type ChangeFreqFn = dyn Fn(&str) -> Option<ChangeFrequency> + Send + Sync;
type PriorityFn = dyn Fn(&str) -> Option<f32> + Send + Sync;

/// Per-provider rules for skipping URLs and filling in hints.
///
/// ```rust
/// use sitemap_core::ChangeFrequency;
/// use sitemap_core::content::UrlPolicy;
///
/// let policy = UrlPolicy::new(Some(ChangeFrequency::Monthly), Some(0.7))
///     .with_skip(|url| url.ends_with("/private"))
///     .with_priority(|url| url.contains("/featured/").then_some(1.0));
///
/// assert!(policy.should_skip("https://example.com/private"));
/// assert!(!policy.should_skip("https://example.com/public"));
/// ```
#[derive(Clone)]
pub struct UrlPolicy {
    skip: Option<Arc<SkipFn>>,
    changefreq: Arc<ChangeFreqFn>,
    priority: Arc<PriorityFn>,
}

impl fmt::Debug for UrlPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlPolicy")
            .field("skip", &self.skip.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for UrlPolicy {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl UrlPolicy {
    /// A policy emitting the same hints for every URL and skipping nothing.
    #[must_use]
    pub fn new(changefreq: Option<ChangeFrequency>, priority: Option<f32>) -> Self {
        Self {
            skip: None,
            changefreq: Arc::new(move |_| changefreq),
            priority: Arc::new(move |_| priority),
        }
    }

    /// Exclude URLs for which `skip` returns `true`.
    #[must_use]
    pub fn with_skip(mut self, skip: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.skip = Some(Arc::new(skip));
        self
    }

    /// Compute `changefreq` per URL.
    #[must_use]
    pub fn with_changefreq(
        mut self,
        changefreq: impl Fn(&str) -> Option<ChangeFrequency> + Send + Sync + 'static,
    ) -> Self {
        self.changefreq = Arc::new(changefreq);
        self
    }

    /// Compute `priority` per URL.
    #[must_use]
    pub fn with_priority(
        mut self,
        priority: impl Fn(&str) -> Option<f32> + Send + Sync + 'static,
    ) -> Self {
        self.priority = Arc::new(priority);
        self
    }

    /// Whether `url` is excluded.
    #[must_use]
    pub fn should_skip(&self, url: &str) -> bool {
        self.skip.as_ref().is_some_and(|skip| skip(url))
    }

    /// Fill in hints the entry does not already carry.
    ///
    /// Fails when the priority function yields a value outside `0.0..=1.0`.
    pub fn apply(&self, mut entry: UrlEntry) -> Result<UrlEntry> {
        if entry.changefreq().is_none() {
            if let Some(changefreq) = (self.changefreq)(entry.loc()) {
                entry = entry.with_changefreq(changefreq);
            }
        }
        if entry.priority().is_none() {
            if let Some(priority) = (self.priority)(entry.loc()) {
                entry = entry.with_priority(priority)?;
            }
        }
        Ok(entry)
    }
}

pub(crate) fn clamp_per_page(per_page: usize) -> usize {
    per_page.clamp(1, DEFAULT_MAX_ENTRIES)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Error;

    struct Fixed(u64);

    impl PaginatedContentProvider for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        fn urls(&self, _page: usize, _per_page: usize) -> Result<UrlSet> {
            Ok(UrlSet::empty())
        }
        fn total_count(&self) -> Result<u64> {
            Ok(self.0)
        }
        fn is_enabled(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_page_count_rounds_up() {
        assert_eq!(Fixed(0).page_count(10).unwrap(), 0);
        assert_eq!(Fixed(10).page_count(10).unwrap(), 1);
        assert_eq!(Fixed(11).page_count(10).unwrap(), 2);
        // per_page of zero is treated as one
        assert_eq!(Fixed(3).page_count(0).unwrap(), 3);
    }

    #[test]
    fn test_policy_fills_missing_hints_only() {
        // Given: A policy with constant defaults
        let policy = UrlPolicy::new(Some(ChangeFrequency::Monthly), Some(0.7));

        // When: Applying it to a bare entry and to one with its own hints
        let bare = policy
            .apply(UrlEntry::new("https://example.com/a").unwrap())
            .unwrap();
        let explicit = policy
            .apply(
                UrlEntry::new("https://example.com/b")
                    .unwrap()
                    .with_changefreq(ChangeFrequency::Daily)
                    .with_priority(0.2)
                    .unwrap(),
            )
            .unwrap();

        // Then: Defaults fill gaps but never override
        assert_eq!(bare.changefreq(), Some(ChangeFrequency::Monthly));
        assert_eq!(bare.priority(), Some(0.7));
        assert_eq!(explicit.changefreq(), Some(ChangeFrequency::Daily));
        assert_eq!(explicit.priority(), Some(0.2));
    }

    #[test]
    fn test_policy_with_invalid_priority_fails() {
        let policy = UrlPolicy::default().with_priority(|_| Some(1.5));
        let err = policy
            .apply(UrlEntry::new("https://example.com/a").unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidEntry(_)));
    }

    #[test]
    fn test_default_policy_is_inert() {
        let policy = UrlPolicy::default();
        let entry = policy
            .apply(UrlEntry::new("https://example.com/a").unwrap())
            .unwrap();
        assert!(!policy.should_skip("https://example.com/a"));
        assert_eq!(entry.changefreq(), None);
        assert_eq!(entry.priority(), None);
    }
}
