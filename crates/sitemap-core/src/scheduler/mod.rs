//! Background generation scheduling.
//!
//! The [`GenerationScheduler`] owns the lifecycle of a generation run:
//!
//! ```text
//! Idle ──schedule()──▶ Scheduled ──first task──▶ Running ──remaining = 0──▶ Completed
//!                          │                        │
//!                          └────────cancel()────────┴──▶ Cancelled ──schedule()──▶ Scheduled
//! ```
//!
//! Runs are driven one date at a time, either synchronously
//! ([`GenerationScheduler::generate_now`]) or through a [`TaskDispatcher`]
//! lane with one task per date spaced [`GENERATION_INTERVAL`] apart
//! ([`GenerationScheduler::schedule`]). Progress lives in the key-value store
//! so any process can report or continue it.
//!
//! Cancellation is cooperative: every unit of work first checks that its run
//! is still in progress, so a cancelled run stops at the next date without
//! interrupting a build already under way.

mod outcome;
mod progress_store;
mod task;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

pub use outcome::{
    CancelOutcome, DateOutcome, GenerateOutcome, ReconcileOutcome, ScheduleOutcome,
    SchedulerState, TaskOutcome,
};
pub use task::{CronTaskHandler, TaskPayload};

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::dispatch::TaskDispatcher;
use crate::eligibility::SiteEligibility;
use crate::generator::{DateBuild, PartitionGenerator};
use crate::store::KeyValueStore;
use crate::{Error, GenerationProgress, ProgressReport, Result, SitemapDate};
use progress_store::ProgressStore;

/// Spacing between consecutive tasks of one run.
pub const GENERATION_INTERVAL: Duration = Duration::from_secs(5);

/// Dispatcher lane used for date generation tasks.
pub const DEFAULT_ACTION_NAME: &str = "sitemap_generate_for_date";

/// Tunables for a [`GenerationScheduler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Spacing between consecutive tasks.
    pub interval: Duration,
    /// Dispatcher lane name.
    pub action_name: String,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            interval: GENERATION_INTERVAL,
            action_name: DEFAULT_ACTION_NAME.to_string(),
        }
    }
}

/// Coordinates detection output, partition builds and persisted progress.
pub struct GenerationScheduler {
    generator: Arc<PartitionGenerator>,
    dispatcher: Arc<dyn TaskDispatcher>,
    eligibility: Arc<dyn SiteEligibility>,
    progress: ProgressStore,
    settings: SchedulerSettings,
    // Serializes read-modify-write of the progress counters in this process.
    progress_lock: Mutex<()>,
}

impl std::fmt::Debug for GenerationScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationScheduler")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

fn parse_dates<S: AsRef<str>>(raw: &[S]) -> Result<Vec<SitemapDate>> {
    let mut seen = HashSet::new();
    let mut dates = Vec::with_capacity(raw.len());
    for value in raw {
        let date: SitemapDate = value.as_ref().parse()?;
        if seen.insert(date) {
            dates.push(date);
        }
    }
    Ok(dates)
}

impl GenerationScheduler {
    /// Wire a scheduler from its collaborators.
    ///
    /// `store` holds the progress counters; it may be the same store the
    /// partitions and task queue use.
    #[must_use]
    pub fn new(
        generator: Arc<PartitionGenerator>,
        store: Arc<dyn KeyValueStore>,
        dispatcher: Arc<dyn TaskDispatcher>,
        eligibility: Arc<dyn SiteEligibility>,
    ) -> Self {
        Self {
            generator,
            dispatcher,
            eligibility,
            progress: ProgressStore::new(store),
            settings: SchedulerSettings::default(),
            progress_lock: Mutex::new(()),
        }
    }

    /// Override interval and lane name.
    #[must_use]
    pub fn with_settings(mut self, settings: SchedulerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Settings in effect.
    #[must_use]
    pub const fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    /// The generator used for builds.
    #[must_use]
    pub fn generator(&self) -> &PartitionGenerator {
        &self.generator
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.progress_lock
            .lock()
            .map_err(|_| Error::Storage("progress lock poisoned".into()))
    }

    /// Start a staggered background run over `dates`.
    ///
    /// Records a fresh run of `dates.len()` and enqueues one task per date,
    /// in the given order, each [`SchedulerSettings::interval`] after the
    /// previous. Duplicates are dropped. Invalid date strings fail before
    /// anything is written.
    #[tracing::instrument(skip_all, fields(dates = dates.len()))]
    pub fn schedule<S: AsRef<str>>(&self, dates: &[S]) -> Result<ScheduleOutcome> {
        let dates = parse_dates(dates)?;

        if !self.eligibility.is_eligible() {
            return Ok(ScheduleOutcome {
                success: false,
                message: "Site is not eligible for sitemaps".into(),
                scheduled: 0,
            });
        }

        self.reconcile()?;

        let _guard = self.lock()?;
        if self.progress.load()?.is_in_progress() {
            return Ok(ScheduleOutcome {
                success: false,
                message: "Generation is already in progress".into(),
                scheduled: 0,
            });
        }
        if dates.is_empty() {
            return Ok(ScheduleOutcome {
                success: false,
                message: "No dates to process".into(),
                scheduled: 0,
            });
        }

        let total = dates.len() as u64;
        self.progress.start(total)?;

        let action = self.settings.action_name.as_str();
        let mut delay = Duration::ZERO;
        for (i, date) in dates.iter().enumerate() {
            let payload = TaskPayload {
                date: *date,
                next_date: dates.get(i + 1).copied(),
            };
            let enqueued = serde_json::to_value(&payload)
                .map_err(Error::from)
                .and_then(|value| self.dispatcher.enqueue(action, value, delay));
            if let Err(e) = enqueued {
                error!(%date, error = %e, "Failed to enqueue generation task; aborting run");
                if let Err(cleanup) = self.dispatcher.cancel_all(action) {
                    warn!(error = %cleanup, "Failed to remove partially scheduled tasks");
                }
                self.progress
                    .save(&GenerationProgress::started(total).with_cancelled())?;
                return Err(e);
            }
            delay += self.settings.interval;
        }

        info!(total, action, "Scheduled sitemap generation");
        Ok(ScheduleOutcome {
            success: true,
            message: format!("Scheduled generation of {total} date(s)"),
            scheduled: dates.len(),
        })
    }

    /// Build `dates` synchronously, in order.
    ///
    /// Progress is recorded as for [`Self::schedule`]. The run stops early
    /// when it is cancelled from elsewhere or the site becomes ineligible;
    /// a date that fails is logged and counted, and the run continues.
    #[tracing::instrument(skip_all, fields(dates = dates.len()))]
    pub fn generate_now<S: AsRef<str>>(&self, dates: &[S]) -> Result<GenerateOutcome> {
        let dates = parse_dates(dates)?;
        let mut outcome = GenerateOutcome {
            success: false,
            message: String::new(),
            generated: 0,
            failed: 0,
            empty: 0,
        };

        if !self.eligibility.is_eligible() {
            outcome.message = "Site is not eligible for sitemaps".into();
            return Ok(outcome);
        }
        if dates.is_empty() {
            outcome.message = "No dates to process".into();
            return Ok(outcome);
        }
        {
            let _guard = self.lock()?;
            if self.progress.load()?.is_in_progress() {
                outcome.message = "Generation is already in progress".into();
                return Ok(outcome);
            }
            self.progress.start(dates.len() as u64)?;
        }

        for (i, date) in dates.iter().enumerate() {
            if !self.begin_date(*date)? {
                outcome.message = format!(
                    "Generation stopped after {i} of {} date(s)",
                    dates.len()
                );
                return Ok(outcome);
            }
            if !self.eligibility.is_eligible() {
                self.halt()?;
                outcome.message = format!(
                    "Site became ineligible after {i} of {} date(s)",
                    dates.len()
                );
                return Ok(outcome);
            }

            match self.build_and_record(*date, dates.get(i + 1).copied())? {
                DateOutcome::Built { build, .. } => match build {
                    DateBuild::Empty { .. } => outcome.empty += 1,
                    _ => outcome.generated += 1,
                },
                DateOutcome::Failed { .. } => outcome.failed += 1,
            }
        }

        outcome.success = outcome.failed == 0;
        outcome.message = format!(
            "Processed {} date(s): {} generated, {} empty, {} failed",
            dates.len(),
            outcome.generated,
            outcome.empty,
            outcome.failed
        );
        Ok(outcome)
    }

    /// Build exactly one date and record its completion.
    ///
    /// Outside an active run the completion is a no-op, so this is also the
    /// entry point for one-off rebuilds. Safe to call repeatedly for the same
    /// date: output is keyed by date and overwritten, and a date counts
    /// toward the run at most once.
    pub fn generate_for_date(&self, date: &str) -> Result<DateOutcome> {
        let date: SitemapDate = date.parse()?;
        self.build_and_record(date, None)
    }

    fn build_and_record(
        &self,
        date: SitemapDate,
        next: Option<SitemapDate>,
    ) -> Result<DateOutcome> {
        let outcome = match self.generator.generate(date, Utc::now()) {
            Ok(build) => {
                debug!(%date, ?build, "Built partition");
                DateOutcome::Built { date, build }
            },
            Err(e) => {
                error!(%date, category = e.category(), error = %e, "Partition build failed");
                DateOutcome::Failed {
                    date,
                    error: e.to_string(),
                }
            },
        };
        self.complete_date(Some(date), next)?;
        Ok(outcome)
    }

    /// Mark one date of the active run as done.
    ///
    /// The run's current date is the one completed and `next_date` becomes
    /// the new current date. A date the run has already counted is not
    /// counted again. When the last date completes, orphaned partitions are
    /// removed. Without an active run this returns the stored progress
    /// unchanged.
    pub fn record_date_completion(&self, next_date: Option<&str>) -> Result<GenerationProgress> {
        let next = next_date.map(str::parse).transpose()?;
        self.complete_date(None, next)
    }

    // `date` defaults to the run's current date.
    fn complete_date(
        &self,
        date: Option<SitemapDate>,
        next: Option<SitemapDate>,
    ) -> Result<GenerationProgress> {
        let updated = {
            let _guard = self.lock()?;
            let current = self.progress.load()?;
            if !current.is_in_progress() {
                debug!("No active run; completion not recorded");
                return Ok(current);
            }
            if let Some(date) = date.or_else(|| current.current_date()) {
                let mut counted = self.progress.counted_dates()?;
                if !counted.insert(date) {
                    debug!(%date, "Date already counted for this run");
                    return Ok(current);
                }
                self.progress.save_counted_dates(&counted)?;
            }
            let updated = current.with_date_completed(next);
            self.progress.save(&updated)?;
            updated
        };

        if updated.is_complete() {
            info!(total = updated.total(), "Sitemap generation complete");
            if let Err(e) = self.generator.cleanup_orphans() {
                warn!(error = %e, "Orphan cleanup failed");
            }
        }
        Ok(updated)
    }

    /// Whether a run is active. Never schedules or repairs anything.
    pub fn is_in_progress(&self) -> Result<bool> {
        Ok(self.progress.load()?.is_in_progress())
    }

    /// The stable status payload. Never schedules or repairs anything.
    pub fn get_progress(&self) -> Result<ProgressReport> {
        Ok(self.progress.load()?.report())
    }

    /// Full progress snapshot.
    pub fn progress(&self) -> Result<GenerationProgress> {
        self.progress.load()
    }

    /// Derived lifecycle state.
    pub fn state(&self) -> Result<SchedulerState> {
        let progress = self.progress.load()?;
        Ok(if progress.is_in_progress() {
            if progress.completed() > 0 || progress.current_date().is_some() {
                SchedulerState::Running
            } else {
                SchedulerState::Scheduled
            }
        } else if progress.total() == 0 {
            SchedulerState::Idle
        } else if progress.remaining() == 0 {
            SchedulerState::Completed
        } else {
            SchedulerState::Cancelled
        })
    }

    /// Stop the active run.
    ///
    /// Pending tasks are removed and the in-progress flag cleared; `total`
    /// and `remaining` are kept so the run's reach stays visible. A task
    /// already executing finishes its date.
    pub fn cancel(&self) -> Result<CancelOutcome> {
        let removed_tasks = self.dispatcher.cancel_all(&self.settings.action_name)?;
        let was_active = {
            let _guard = self.lock()?;
            let current = self.progress.load()?;
            self.progress.save(&current.with_cancelled())?;
            current.is_in_progress()
        };

        let success = was_active || removed_tasks > 0;
        if success {
            info!(removed_tasks, "Cancelled sitemap generation");
        }
        Ok(CancelOutcome {
            success,
            message: if success {
                format!("Generation cancelled; removed {removed_tasks} pending task(s)")
            } else {
                "No generation in progress".into()
            },
            removed_tasks,
        })
    }

    /// Repair disagreement between the progress flag and the task queue.
    ///
    /// - flag set, nothing queued: flag cleared
    /// - tasks queued, flag clear: tasks cancelled
    ///
    /// A task stays queued until it is acknowledged, so an empty queue also
    /// means no task is executing.
    pub fn reconcile(&self) -> Result<ReconcileOutcome> {
        let action = self.settings.action_name.as_str();
        let mut outcome = ReconcileOutcome::default();
        let next = self.dispatcher.next_scheduled(action)?;

        let _guard = self.lock()?;
        let progress = self.progress.load()?;
        if progress.is_in_progress() && next.is_none() {
            warn!(
                total = progress.total(),
                remaining = progress.remaining(),
                "Clearing in-progress flag with no scheduled work"
            );
            self.progress.save(&progress.with_cancelled())?;
            outcome.cleared_flag = true;
        } else if !progress.is_in_progress() && next.is_some() {
            outcome.cancelled_tasks = self.dispatcher.cancel_all(action)?;
            warn!(
                cancelled = outcome.cancelled_tasks,
                "Cancelled tasks queued without an active run"
            );
        }
        Ok(outcome)
    }

    /// Handle one dispatched task.
    ///
    /// Skips when no run is active, halts the run when the site is no longer
    /// eligible, otherwise builds the date and records completion even if
    /// the build fails.
    #[tracing::instrument(skip_all, fields(date = %payload.date))]
    pub fn run_task(&self, payload: &TaskPayload) -> Result<TaskOutcome> {
        let date = payload.date;
        if !self.begin_date(date)? {
            debug!("Run is not active; skipping task");
            return Ok(TaskOutcome::Skipped { date });
        }
        if !self.eligibility.is_eligible() {
            let removed_tasks = self.halt()?;
            return Ok(TaskOutcome::Halted {
                date,
                removed_tasks,
            });
        }
        self.build_and_record(date, payload.next_date)
            .map(TaskOutcome::Ran)
    }

    // Cancellation check: returns false when the run is no longer active,
    // otherwise marks `date` as current.
    fn begin_date(&self, date: SitemapDate) -> Result<bool> {
        let _guard = self.lock()?;
        let progress = self.progress.load()?;
        if !progress.is_in_progress() {
            return Ok(false);
        }
        self.progress.save(&progress.with_current_date(date))?;
        Ok(true)
    }

    fn halt(&self) -> Result<usize> {
        warn!("Site is no longer eligible; halting sitemap generation");
        let removed = self.dispatcher.cancel_all(&self.settings.action_name)?;
        let _guard = self.lock()?;
        let progress = self.progress.load()?;
        self.progress.save(&progress.with_cancelled())?;
        Ok(removed)
    }
}
