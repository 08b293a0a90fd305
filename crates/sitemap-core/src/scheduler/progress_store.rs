//! Persisted progress counters.
//!
//! Each field lives under its own key with [`WriteHint::SkipWarmup`] so
//! polling a run's status reads a handful of small values. The set of
//! dates a run has already counted sits next to the counters so a
//! redelivered task cannot count twice.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::store::{KeyValueStore, WriteHint, read_json, write_json};
use crate::{GenerationProgress, Result, SitemapDate};

const IN_PROGRESS_KEY: &str = "sitemap_generation_in_progress";
const TOTAL_KEY: &str = "sitemap_generation_total";
const REMAINING_KEY: &str = "sitemap_generation_remaining";
const CURRENT_DATE_KEY: &str = "sitemap_generation_current_date";
const COUNTED_DATES_KEY: &str = "sitemap_generation_counted_dates";

pub(crate) struct ProgressStore {
    store: Arc<dyn KeyValueStore>,
}

impl ProgressStore {
    pub(crate) fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub(crate) fn load(&self) -> Result<GenerationProgress> {
        let store = self.store.as_ref();
        let in_progress: bool = read_json(store, IN_PROGRESS_KEY)?.unwrap_or(false);
        let total: u64 = read_json(store, TOTAL_KEY)?.unwrap_or(0);
        let remaining: u64 = read_json(store, REMAINING_KEY)?.unwrap_or(0);
        let current_date: Option<SitemapDate> = read_json(store, CURRENT_DATE_KEY)?;
        Ok(GenerationProgress::restore(
            in_progress,
            total,
            remaining,
            current_date,
        ))
    }

    /// Record a fresh run over `total` dates, forgetting the previous run's
    /// counted dates.
    pub(crate) fn start(&self, total: u64) -> Result<GenerationProgress> {
        self.store.delete(COUNTED_DATES_KEY)?;
        let progress = GenerationProgress::started(total);
        self.save(&progress)?;
        Ok(progress)
    }

    /// Dates whose completion the current run has already counted.
    pub(crate) fn counted_dates(&self) -> Result<BTreeSet<SitemapDate>> {
        Ok(read_json(self.store.as_ref(), COUNTED_DATES_KEY)?.unwrap_or_default())
    }

    pub(crate) fn save_counted_dates(&self, dates: &BTreeSet<SitemapDate>) -> Result<()> {
        write_json(
            self.store.as_ref(),
            COUNTED_DATES_KEY,
            dates,
            WriteHint::SkipWarmup,
        )
    }

    pub(crate) fn save(&self, progress: &GenerationProgress) -> Result<()> {
        let store = self.store.as_ref();
        write_json(store, TOTAL_KEY, &progress.total(), WriteHint::SkipWarmup)?;
        write_json(store, REMAINING_KEY, &progress.remaining(), WriteHint::SkipWarmup)?;
        match progress.current_date() {
            Some(date) => write_json(store, CURRENT_DATE_KEY, &date, WriteHint::SkipWarmup)?,
            None => {
                store.delete(CURRENT_DATE_KEY)?;
            },
        }
        // Flag last: a reader seeing `true` also sees the counters for this run
        write_json(
            store,
            IN_PROGRESS_KEY,
            &progress.is_in_progress(),
            WriteHint::SkipWarmup,
        )
    }
}
