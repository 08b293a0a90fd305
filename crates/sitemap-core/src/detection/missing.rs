use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use super::{DateProvider, DetectionKind, sorted_unique};
use crate::partition::PartitionStore;
use crate::repository::ContentRepository;
use crate::{Result, SitemapDate};

/// Dates that have content but no built partition.
pub struct MissingDates {
    repo: Arc<dyn ContentRepository>,
    partitions: Arc<PartitionStore>,
}

impl MissingDates {
    /// Compare `repo` content against `partitions`.
    #[must_use]
    pub fn new(repo: Arc<dyn ContentRepository>, partitions: Arc<PartitionStore>) -> Self {
        Self { repo, partitions }
    }
}

impl DateProvider for MissingDates {
    fn detect(&self) -> Result<Vec<SitemapDate>> {
        let built: BTreeSet<SitemapDate> = self.partitions.built_dates()?.into_iter().collect();
        let missing: Vec<SitemapDate> = self
            .repo
            .dates_with_content()?
            .into_iter()
            .filter(|date| !built.contains(date))
            .collect();
        debug!(built = built.len(), missing = missing.len(), "Detected missing partitions");
        Ok(sorted_unique(missing))
    }

    fn kind(&self) -> DetectionKind {
        DetectionKind::Missing
    }

    fn description(&self) -> &'static str {
        "Dates with published content and no generated sitemap"
    }
}
