use std::sync::Arc;

use tracing::warn;

use super::{PaginatedContentProvider, UrlPolicy, clamp_per_page};
use crate::repository::ArchiveRepository;
use crate::{Result, UrlEntry, UrlSet};

/// Paginated archive pages for one taxonomy (categories, tags, ...).
pub struct TaxonomyProvider {
    repo: Arc<dyn ArchiveRepository>,
    taxonomy: String,
    enabled: bool,
    policy: UrlPolicy,
}

impl std::fmt::Debug for TaxonomyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaxonomyProvider")
            .field("taxonomy", &self.taxonomy)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl TaxonomyProvider {
    /// Create an enabled provider for `taxonomy`.
    #[must_use]
    pub fn new(repo: Arc<dyn ArchiveRepository>, taxonomy: impl Into<String>) -> Self {
        Self {
            repo,
            taxonomy: taxonomy.into(),
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

impl PaginatedContentProvider for TaxonomyProvider {
    fn name(&self) -> &str {
        &self.taxonomy
    }

    fn urls(&self, page: usize, per_page: usize) -> Result<UrlSet> {
        let per_page = clamp_per_page(per_page);
        if page == 0 {
            return Ok(UrlSet::with_limit(Vec::new(), per_page));
        }

        let offset = (page - 1).saturating_mul(per_page);
        let mut entries = Vec::new();
        for term in self.repo.terms(&self.taxonomy, offset, per_page)? {
            if self.policy.should_skip(&term.url) {
                continue;
            }
            let mut entry = match UrlEntry::new(term.url) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(taxonomy = %self.taxonomy, id = term.id, error = %e, "Leaving out term with invalid URL");
                    continue;
                },
            };
            if let Some(modified) = term.modified {
                entry = entry.with_lastmod(modified);
            }
            entries.push(self.policy.apply(entry)?);
        }
        Ok(UrlSet::with_limit(entries, per_page))
    }

    fn total_count(&self) -> Result<u64> {
        self.repo.term_count(&self.taxonomy)
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
