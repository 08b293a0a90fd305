//! Builds, persists and indexes date partitions.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::content::{DateContentProvider, PaginatedContentProvider, UrlEnhancer};
use crate::partition::{PartitionStore, SaveOutcome};
use crate::repository::ContentRepository;
use crate::{Result, SitemapDate, SitemapIndexCollection, SitemapIndexEntry, UrlSet};

/// Default number of archive URLs per paginated sitemap file.
pub const DEFAULT_ARCHIVE_PER_PAGE: usize = 2_000;

/// What building one date produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum DateBuild {
    /// New or changed output was written.
    Written {
        /// URLs in the partition.
        urls: usize,
    },
    /// Output was identical to the stored partition.
    Unchanged {
        /// URLs in the partition.
        urls: usize,
    },
    /// The date has no content; nothing is stored for it.
    Empty {
        /// Whether a previously built partition was removed.
        removed: bool,
    },
}

/// Turns content providers into persisted partitions.
pub struct PartitionGenerator {
    posts: Arc<dyn DateContentProvider>,
    enhancers: Vec<Arc<dyn UrlEnhancer>>,
    archives: Vec<Arc<dyn PaginatedContentProvider>>,
    repo: Arc<dyn ContentRepository>,
    partitions: Arc<PartitionStore>,
    archive_per_page: usize,
}

impl std::fmt::Debug for PartitionGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartitionGenerator")
            .field("posts", &self.posts.name())
            .field("enhancers", &self.enhancers.len())
            .field("archives", &self.archives.len())
            .field("archive_per_page", &self.archive_per_page)
            .finish_non_exhaustive()
    }
}

impl PartitionGenerator {
    /// Create a generator writing partitions built by `posts` into
    /// `partitions`. `repo` is consulted for orphan cleanup.
    #[must_use]
    pub fn new(
        posts: Arc<dyn DateContentProvider>,
        repo: Arc<dyn ContentRepository>,
        partitions: Arc<PartitionStore>,
    ) -> Self {
        Self {
            posts,
            enhancers: Vec::new(),
            archives: Vec::new(),
            repo,
            partitions,
            archive_per_page: DEFAULT_ARCHIVE_PER_PAGE,
        }
    }

    /// Add an enhancer applied to every date partition, in insertion order.
    #[must_use]
    pub fn with_enhancer(mut self, enhancer: Arc<dyn UrlEnhancer>) -> Self {
        self.enhancers.push(enhancer);
        self
    }

    /// Add a paginated archive provider to the index.
    #[must_use]
    pub fn with_archive(mut self, provider: Arc<dyn PaginatedContentProvider>) -> Self {
        self.archives.push(provider);
        self
    }

    /// URLs per archive sitemap page.
    #[must_use]
    pub fn with_archive_per_page(mut self, per_page: usize) -> Self {
        self.archive_per_page = crate::content::clamp_per_page(per_page);
        self
    }

    /// The partition store written to.
    #[must_use]
    pub fn partitions(&self) -> &PartitionStore {
        &self.partitions
    }

    /// Collect the URLs for `date` without persisting anything.
    pub fn build_url_set(&self, date: SitemapDate) -> Result<UrlSet> {
        let mut set = self.posts.urls_for_date(date)?;
        for enhancer in &self.enhancers {
            if set.is_empty() {
                break;
            }
            let limit = set.limit();
            let enhanced = enhancer.enhance(set.entries())?;
            debug!(%date, enhancer = enhancer.name(), "Applied enhancer");
            set = UrlSet::with_limit(enhanced, limit);
        }
        Ok(set)
    }

    /// Build and persist the partition for `date`.
    ///
    /// A date without content stores nothing, and a previously built
    /// partition for it is removed.
    #[tracing::instrument(skip_all, fields(%date))]
    pub fn generate(&self, date: SitemapDate, now: DateTime<Utc>) -> Result<DateBuild> {
        let set = self.build_url_set(date)?;
        if set.is_empty() {
            let removed = self.partitions.delete(date)?;
            if removed {
                info!("Removed partition for date without content");
            }
            return Ok(DateBuild::Empty { removed });
        }

        let urls = set.count();
        Ok(match self.partitions.save(date, &set, now)? {
            SaveOutcome::Written => DateBuild::Written { urls },
            SaveOutcome::Unchanged => DateBuild::Unchanged { urls },
        })
    }

    /// Remove partitions whose date no longer has any content.
    ///
    /// Returns the removed dates, ascending.
    pub fn cleanup_orphans(&self) -> Result<Vec<SitemapDate>> {
        let with_content: BTreeSet<SitemapDate> =
            self.repo.dates_with_content()?.into_iter().collect();

        let mut built: BTreeSet<SitemapDate> = self.partitions.built_dates()?.into_iter().collect();
        built.extend(self.partitions.stored_dates()?);

        let mut removed = Vec::new();
        for date in built.into_iter().filter(|d| !with_content.contains(d)) {
            self.partitions.delete(date)?;
            removed.push(date);
        }
        if !removed.is_empty() {
            info!(removed = removed.len(), "Removed orphaned partitions");
        }
        Ok(removed)
    }

    /// The sitemap index: every built date partition, then each enabled
    /// archive provider's pages.
    pub fn build_index(&self, base_url: &str) -> Result<SitemapIndexCollection> {
        let base = base_url.trim_end_matches('/');
        let mut refs = Vec::new();

        for (date, summary) in self.partitions.index()? {
            refs.push(SitemapIndexEntry::new(
                format!("{base}/sitemap-{date}.xml"),
                Some(summary.built_at),
            )?);
        }

        for provider in self.archives.iter().filter(|p| p.is_enabled()) {
            let pages = provider.page_count(self.archive_per_page)?;
            for page in 1..=pages {
                refs.push(SitemapIndexEntry::new(
                    format!("{base}/sitemap-{}-{page}.xml", provider.name()),
                    None,
                )?);
            }
        }

        Ok(SitemapIndexCollection::new(refs))
    }

    /// URLs on one page of the archive provider called `name`.
    ///
    /// Returns `None` for unknown or disabled providers.
    pub fn archive_page(&self, name: &str, page: usize) -> Result<Option<UrlSet>> {
        let Some(provider) = self
            .archives
            .iter()
            .find(|p| p.is_enabled() && p.name() == name)
        else {
            warn!(provider = name, "Unknown or disabled archive provider");
            return Ok(None);
        };
        provider.urls(page, self.archive_per_page).map(Some)
    }
}
