//! Detection strategies deciding which date partitions need work.
//!
//! | kind       | reports                                                     |
//! |------------|-------------------------------------------------------------|
//! | `missing`  | dates with content and no built partition                   |
//! | `stale`    | built dates whose content changed after the build           |
//! | `all`      | every date with content (full rebuild)                      |
//! | `modified` | dates with content changed since the last recorded check    |
//!
//! Every strategy returns ascending, deduplicated dates, and an empty site is
//! an empty answer rather than an error.

mod all;
mod missing;
mod modified;
mod stale;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use all::AllDates;
pub use missing::MissingDates;
pub use modified::ModifiedDates;
pub use stale::StaleDates;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::partition::PartitionStore;
use crate::repository::ContentRepository;
use crate::store::KeyValueStore;
use crate::{Error, Result, SitemapDate};

/// Which detection strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionKind {
    /// Dates with content but no partition.
    #[default]
    Missing,
    /// Partitions older than their content.
    Stale,
    /// Every date with content.
    All,
    /// Dates changed since the last check.
    Modified,
}

impl DetectionKind {
    /// Every kind, in display order.
    pub const ALL: [Self; 4] = [Self::Missing, Self::Stale, Self::All, Self::Modified];

    /// Stable identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Stale => "stale",
            Self::All => "all",
            Self::Modified => "modified",
        }
    }
}

impl fmt::Display for DetectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                Error::Config(format!(
                    "unknown detection kind '{s}' (expected missing, stale, all or modified)"
                ))
            })
    }
}

/// A detection strategy.
pub trait DateProvider: Send + Sync {
    /// Dates needing work, ascending and deduplicated.
    fn detect(&self) -> Result<Vec<SitemapDate>>;

    /// [`Self::detect`] as `YYYY-MM-DD` strings.
    fn dates(&self) -> Result<Vec<String>> {
        Ok(self.detect()?.iter().map(ToString::to_string).collect())
    }

    /// Which strategy this is.
    fn kind(&self) -> DetectionKind;

    /// One-line human description.
    fn description(&self) -> &'static str;

    /// Called once the detected dates were handed to the scheduler.
    ///
    /// Strategies that track a watermark advance it here.
    fn mark_scheduled(&self, _at: DateTime<Utc>) -> Result<()> {
        Ok(())
    }
}

/// Build the provider for `kind`.
pub fn build_date_provider(
    kind: DetectionKind,
    repo: Arc<dyn ContentRepository>,
    partitions: Arc<PartitionStore>,
    store: Arc<dyn KeyValueStore>,
) -> Box<dyn DateProvider> {
    match kind {
        DetectionKind::Missing => Box::new(MissingDates::new(repo, partitions)),
        DetectionKind::Stale => Box::new(StaleDates::new(repo, partitions)),
        DetectionKind::All => Box::new(AllDates::new(repo)),
        DetectionKind::Modified => Box::new(ModifiedDates::new(repo, store)),
    }
}

fn sorted_unique(mut dates: Vec<SitemapDate>) -> Vec<SitemapDate> {
    dates.sort_unstable();
    dates.dedup();
    dates
}
