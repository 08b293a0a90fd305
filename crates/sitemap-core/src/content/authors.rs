use std::sync::Arc;

use tracing::warn;

use super::{PaginatedContentProvider, UrlPolicy, clamp_per_page};
use crate::repository::ArchiveRepository;
use crate::{Result, UrlEntry, UrlSet};

/// Paginated author archive pages.
pub struct AuthorsProvider {
    repo: Arc<dyn ArchiveRepository>,
    enabled: bool,
    policy: UrlPolicy,
}

impl std::fmt::Debug for AuthorsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorsProvider")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl AuthorsProvider {
    /// Create an enabled provider.
    #[must_use]
    pub fn new(repo: Arc<dyn ArchiveRepository>) -> Self {
        Self {
            repo,
            enabled: true,
            policy: UrlPolicy::default(),
        }
    }

    /// Enable or disable the provider.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Replace the URL policy.
    #[must_use]
    pub fn with_policy(mut self, policy: UrlPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl PaginatedContentProvider for AuthorsProvider {
    fn name(&self) -> &str {
        "author"
    }

    fn urls(&self, page: usize, per_page: usize) -> Result<UrlSet> {
        let per_page = clamp_per_page(per_page);
        if page == 0 {
            return Ok(UrlSet::with_limit(Vec::new(), per_page));
        }

        let offset = (page - 1).saturating_mul(per_page);
        let mut entries = Vec::new();
        for author in self.repo.authors(offset, per_page)? {
            if self.policy.should_skip(&author.url) {
                continue;
            }
            let mut entry = match UrlEntry::new(author.url) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(id = author.id, error = %e, "Leaving out author with invalid URL");
                    continue;
                },
            };
            if let Some(modified) = author.modified {
                entry = entry.with_lastmod(modified);
            }
            entries.push(self.policy.apply(entry)?);
        }
        Ok(UrlSet::with_limit(entries, per_page))
    }

    fn total_count(&self) -> Result<u64> {
        self.repo.author_count()
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
