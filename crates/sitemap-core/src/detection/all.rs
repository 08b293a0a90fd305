use std::sync::Arc;

use super::{DateProvider, DetectionKind, sorted_unique};
use crate::repository::ContentRepository;
use crate::{Result, SitemapDate};

/// Every date with content, for full rebuilds.
pub struct AllDates {
    repo: Arc<dyn ContentRepository>,
}

impl AllDates {
    /// Report every content date in `repo`.
    #[must_use]
    pub fn new(repo: Arc<dyn ContentRepository>) -> Self {
        Self { repo }
    }
}

impl DateProvider for AllDates {
    fn detect(&self) -> Result<Vec<SitemapDate>> {
        Ok(sorted_unique(self.repo.dates_with_content()?))
    }

    fn kind(&self) -> DetectionKind {
        DetectionKind::All
    }

    fn description(&self) -> &'static str {
        "Every date with published content (full rebuild)"
    }
}
