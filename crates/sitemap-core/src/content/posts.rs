use std::sync::Arc;

use tracing::{debug, warn};

use super::{DateContentProvider, UrlPolicy, clamp_per_page};
use crate::repository::ContentRepository;
use crate::{Result, SitemapDate, UrlEntry, UrlSet};

/// Default number of posts in one date partition.
pub const DEFAULT_POSTS_PER_SITEMAP: usize = 500;

/// Builds one date partition from the posts published that day.
///
/// At most `per_date_cap` posts are included, in repository order. Posts
/// whose permalink is not a valid sitemap URL are left out and logged.
pub struct PostsProvider {
    repo: Arc<dyn ContentRepository>,
    per_date_cap: usize,
    policy: UrlPolicy,
}

impl std::fmt::Debug for PostsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostsProvider")
            .field("per_date_cap", &self.per_date_cap)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl PostsProvider {
    /// Create a provider over `repo`.
    #[must_use]
    pub fn new(repo: Arc<dyn ContentRepository>) -> Self {
        Self {
            repo,
            per_date_cap: DEFAULT_POSTS_PER_SITEMAP,
            policy: UrlPolicy::default(),
        }
    }

    /// Cap posts per date; clamped to the protocol limit.
    #[must_use]
    pub fn with_cap(mut self, per_date_cap: usize) -> Self {
        self.per_date_cap = clamp_per_page(per_date_cap);
        self
    }

    /// Replace the URL policy.
    #[must_use]
    pub fn with_policy(mut self, policy: UrlPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Per-date cap in effect.
    #[must_use]
    pub const fn cap(&self) -> usize {
        self.per_date_cap
    }
}

impl DateContentProvider for PostsProvider {
    fn name(&self) -> &str {
        "post"
    }

    #[tracing::instrument(skip_all, fields(%date))]
    fn urls_for_date(&self, date: SitemapDate) -> Result<UrlSet> {
        let ids = self.repo.content_ids_for_date(date, self.per_date_cap)?;
        if ids.is_empty() {
            return Ok(UrlSet::with_limit(Vec::new(), self.per_date_cap));
        }

        let items = self.repo.load_items(&ids)?;
        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            if self.policy.should_skip(&item.url) {
                debug!(id = item.id, url = %item.url, "Skipping excluded URL");
                continue;
            }
            let entry = match UrlEntry::new(item.url) {
                Ok(entry) => entry.with_lastmod(item.modified),
                Err(e) => {
                    warn!(id = item.id, error = %e, "Leaving out post with invalid permalink");
                    continue;
                },
            };
            entries.push(self.policy.apply(entry)?);
        }

        debug!(urls = entries.len(), "Collected post URLs");
        Ok(UrlSet::with_limit(entries, self.per_date_cap))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ChangeFrequency;
    use crate::repository::{Catalog, CatalogRepository};
    use crate::testing::post;

    fn provider(posts: Vec<crate::repository::ContentItem>) -> PostsProvider {
        PostsProvider::new(Arc::new(CatalogRepository::new(Catalog {
            posts,
            ..Catalog::default()
        })))
    }

    #[test]
    fn test_one_url_per_post_under_cap() {
        // Given: Three posts on one date and one on another
        let p = provider(vec![
            post(1, "2024-07-10", "2024-07-10T08:00:00Z"),
            post(2, "2024-07-10", "2024-07-10T09:00:00Z"),
            post(3, "2024-07-10", "2024-07-10T10:00:00Z"),
            post(4, "2024-07-11", "2024-07-11T10:00:00Z"),
        ]);

        // When: Building the first date
        let set = p.urls_for_date("2024-07-10".parse().unwrap()).unwrap();

        // Then: Exactly the three posts are present with lastmod set
        assert_eq!(set.count(), 3);
        assert!(set.iter().all(|e| e.lastmod().is_some()));
        assert_eq!(set.entries()[0].loc(), "https://example.com/2024-07-10/post-1");
    }

    #[test]
    fn test_cap_limits_each_partition() {
        let p = provider(
            (1..=5)
                .map(|id| post(id, "2024-07-10", "2024-07-10T08:00:00Z"))
                .collect(),
        )
        .with_cap(2);

        let set = p.urls_for_date("2024-07-10".parse().unwrap()).unwrap();
        assert_eq!(set.count(), 2);
        assert_eq!(set.limit(), 2);
    }

    #[test]
    fn test_empty_date_is_an_empty_set() {
        let p = provider(vec![]);
        let set = p.urls_for_date("2024-07-10".parse().unwrap()).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_policy_skip_and_defaults() {
        let p = provider(vec![
            post(1, "2024-07-10", "2024-07-10T08:00:00Z"),
            post(2, "2024-07-10", "2024-07-10T08:00:00Z"),
        ])
        .with_policy(
            UrlPolicy::new(Some(ChangeFrequency::Weekly), Some(0.6))
                .with_skip(|url| url.ends_with("post-2")),
        );

        let set = p.urls_for_date("2024-07-10".parse().unwrap()).unwrap();
        assert_eq!(set.count(), 1);
        assert_eq!(set.entries()[0].changefreq(), Some(ChangeFrequency::Weekly));
        assert_eq!(set.entries()[0].priority(), Some(0.6));
    }

    #[test]
    fn test_invalid_permalink_is_left_out() {
        let mut bad = post(2, "2024-07-10", "2024-07-10T08:00:00Z");
        bad.url = "/relative/only".into();
        let p = provider(vec![post(1, "2024-07-10", "2024-07-10T08:00:00Z"), bad]);

        let set = p.urls_for_date("2024-07-10".parse().unwrap()).unwrap();
        assert_eq!(set.count(), 1);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let p = provider(vec![
            post(1, "2024-07-10", "2024-07-10T08:00:00Z"),
            post(2, "2024-07-10", "2024-07-10T09:00:00Z"),
        ]);
        let date = "2024-07-10".parse().unwrap();
        assert_eq!(p.urls_for_date(date).unwrap(), p.urls_for_date(date).unwrap());
    }
}
