use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{DateProvider, DetectionKind, sorted_unique};
use crate::repository::ContentRepository;
use crate::store::{KeyValueStore, WriteHint, read_json, write_json};
use crate::{Result, SitemapDate};

const LAST_CHECK_KEY: &str = "sitemap_last_modified_check";

/// Dates with content modified since the last recorded check.
///
/// Without a recorded check every content date is reported. The watermark
/// only advances through [`DateProvider::mark_scheduled`], so a detection
/// that is never acted on is reported again next time.
pub struct ModifiedDates {
    repo: Arc<dyn ContentRepository>,
    store: Arc<dyn KeyValueStore>,
}

impl ModifiedDates {
    /// Track modifications in `repo`, keeping the watermark in `store`.
    #[must_use]
    pub fn new(repo: Arc<dyn ContentRepository>, store: Arc<dyn KeyValueStore>) -> Self {
        Self { repo, store }
    }

    /// The recorded watermark.
    pub fn last_check(&self) -> Result<Option<DateTime<Utc>>> {
        read_json(self.store.as_ref(), LAST_CHECK_KEY)
    }
}

impl DateProvider for ModifiedDates {
    fn detect(&self) -> Result<Vec<SitemapDate>> {
        let dates = match self.last_check()? {
            Some(since) => {
                debug!(%since, "Detecting dates modified since last check");
                self.repo.dates_modified_since(since)?
            },
            None => self.repo.dates_with_content()?,
        };
        Ok(sorted_unique(dates))
    }

    fn kind(&self) -> DetectionKind {
        DetectionKind::Modified
    }

    fn description(&self) -> &'static str {
        "Dates with content changed since the last check"
    }

    fn mark_scheduled(&self, at: DateTime<Utc>) -> Result<()> {
        write_json(self.store.as_ref(), LAST_CHECK_KEY, &at, WriteHint::SkipWarmup)
    }
}
