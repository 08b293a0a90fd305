use std::sync::Arc;

use tracing::debug;

use super::{DateProvider, DetectionKind, sorted_unique};
use crate::partition::PartitionStore;
use crate::repository::ContentRepository;
use crate::{Result, SitemapDate};

/// Built partitions whose content was modified after the build.
///
/// Dates never built are reported by [`super::MissingDates`] instead.
pub struct StaleDates {
    repo: Arc<dyn ContentRepository>,
    partitions: Arc<PartitionStore>,
}

impl StaleDates {
    /// Compare `repo` modification times against `partitions`.
    #[must_use]
    pub fn new(repo: Arc<dyn ContentRepository>, partitions: Arc<PartitionStore>) -> Self {
        Self { repo, partitions }
    }
}

impl DateProvider for StaleDates {
    fn detect(&self) -> Result<Vec<SitemapDate>> {
        let mut stale = Vec::new();
        for (date, summary) in self.partitions.index()? {
            let Some(modified) = self.repo.max_modified_for_date(date)? else {
                continue;
            };
            if summary.built_at < modified {
                debug!(%date, built_at = %summary.built_at, %modified, "Partition is stale");
                stale.push(date);
            }
        }
        Ok(sorted_unique(stale))
    }

    fn kind(&self) -> DetectionKind {
        DetectionKind::Stale
    }

    fn description(&self) -> &'static str {
        "Generated sitemaps older than the newest change to their content"
    }
}
