//! Structured results returned to front-ends.
//!
//! Expected conditions (nothing to do, site not eligible, a run already
//! active) are reported here with `success = false` instead of as errors.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::SitemapDate;
use crate::generator::DateBuild;

/// Derived lifecycle state of the generation lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    /// No run has ever been recorded.
    Idle,
    /// A run was scheduled and no task has started yet.
    Scheduled,
    /// Tasks of the current run are executing.
    Running,
    /// The last run finished every date.
    Completed,
    /// The last run was stopped before finishing.
    Cancelled,
}

impl SchedulerState {
    /// Stable identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Scheduled => "scheduled",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of `schedule()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleOutcome {
    /// Whether a run was started.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// Tasks enqueued.
    pub scheduled: usize,
}

/// Result of `generate_now()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateOutcome {
    /// Whether the run started and processed every requested date.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// Dates whose partition was written or confirmed unchanged.
    pub generated: usize,
    /// Dates whose build failed.
    pub failed: usize,
    /// Dates without content.
    pub empty: usize,
}

/// Result of `cancel()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelOutcome {
    /// Whether there was anything to cancel.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// Pending tasks removed from the dispatcher.
    pub removed_tasks: usize,
}

/// Result of `reconcile()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ReconcileOutcome {
    /// An in-progress flag with no queued or running work was cleared.
    pub cleared_flag: bool,
    /// Queued tasks with no active run that were cancelled.
    pub cancelled_tasks: usize,
}

impl ReconcileOutcome {
    /// Whether any repair was made.
    #[must_use]
    pub const fn repaired(&self) -> bool {
        self.cleared_flag || self.cancelled_tasks > 0
    }
}

/// Result of building one date inside a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DateOutcome {
    /// The build finished.
    Built {
        /// The date built.
        date: SitemapDate,
        /// What was stored.
        build: DateBuild,
    },
    /// The build failed; progress still advanced.
    Failed {
        /// The date attempted.
        date: SitemapDate,
        /// Error description.
        error: String,
    },
}

impl DateOutcome {
    /// The date this outcome is about.
    #[must_use]
    pub const fn date(&self) -> SitemapDate {
        match self {
            Self::Built { date, .. } | Self::Failed { date, .. } => *date,
        }
    }

    /// Whether the build failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Result of handling one dispatched task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum TaskOutcome {
    /// The date was processed.
    Ran(DateOutcome),
    /// No run is active (cancelled or already finished); nothing was done.
    Skipped {
        /// The date carried by the task.
        date: SitemapDate,
    },
    /// The site stopped being eligible; the run was stopped.
    Halted {
        /// The date carried by the task.
        date: SitemapDate,
        /// Pending tasks removed.
        removed_tasks: usize,
    },
}
