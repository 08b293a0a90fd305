//! Immutable progress snapshots for a generation run.
//!
//! A run moves through a small lifecycle:
//!
//! ```text
//! not_started ──started(n)──▶ in progress ──with_date_completed()×n──▶ complete
//!                                  │
//!                                  └──with_cancelled()──▶ cancelled (counts frozen)
//! ```
//!
//! Every transition returns a new value.

use serde::{Deserialize, Serialize};

use crate::SitemapDate;

/// Snapshot of a generation run.
///
/// Invariants: `remaining <= total`, and `in_progress` is false whenever
/// `remaining == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GenerationProgress {
    in_progress: bool,
    total: u64,
    remaining: u64,
    current_date: Option<SitemapDate>,
}

impl GenerationProgress {
    /// A run that has never started.
    #[must_use]
    pub const fn not_started() -> Self {
        Self {
            in_progress: false,
            total: 0,
            remaining: 0,
            current_date: None,
        }
    }

    /// A fresh run over `total` dates.
    ///
    /// A run over zero dates is immediately finished rather than in progress.
    #[must_use]
    pub const fn started(total: u64) -> Self {
        Self {
            in_progress: total > 0,
            total,
            remaining: total,
            current_date: None,
        }
    }

    /// Rebuild a snapshot from persisted counters, repairing any
    /// inconsistency (remaining clamped to total, a drained run never in
    /// progress).
    #[must_use]
    pub fn restore(
        in_progress: bool,
        total: u64,
        remaining: u64,
        current_date: Option<SitemapDate>,
    ) -> Self {
        let remaining = remaining.min(total);
        let in_progress = in_progress && remaining > 0;
        Self {
            in_progress,
            total,
            remaining,
            current_date: if in_progress { current_date } else { None },
        }
    }

    /// One more date finished; `next` becomes the current date.
    ///
    /// `remaining` floors at zero, and the run stops being in progress exactly
    /// when it reaches zero.
    #[must_use]
    pub const fn with_date_completed(self, next: Option<SitemapDate>) -> Self {
        let remaining = self.remaining.saturating_sub(1);
        let in_progress = self.in_progress && remaining > 0;
        Self {
            in_progress,
            total: self.total,
            remaining,
            current_date: if in_progress { next } else { None },
        }
    }

    /// Mark `date` as the one currently being built.
    #[must_use]
    pub const fn with_current_date(self, date: SitemapDate) -> Self {
        if !self.in_progress {
            return self;
        }
        Self {
            current_date: Some(date),
            ..self
        }
    }

    /// Stop the run, keeping the counters for inspection.
    #[must_use]
    pub const fn with_cancelled(self) -> Self {
        Self {
            in_progress: false,
            total: self.total,
            remaining: self.remaining,
            current_date: None,
        }
    }

    /// Whether a run is active.
    #[must_use]
    pub const fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    /// Number of dates in the run.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Dates not yet finished.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Dates finished so far.
    #[must_use]
    pub const fn completed(&self) -> u64 {
        self.total - self.remaining
    }

    /// The date currently being built, if known.
    #[must_use]
    pub const fn current_date(&self) -> Option<SitemapDate> {
        self.current_date
    }

    /// A run that drained every date.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        !self.in_progress && self.total > 0 && self.remaining == 0
    }

    /// A run that was stopped before draining.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        !self.in_progress && self.remaining > 0
    }

    /// Percentage of the run completed, `0.0` for an empty run.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Display only
    pub fn percent_complete(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.completed() as f64 / self.total as f64) * 100.0
    }

    /// The stable status payload surfaced to operators.
    #[must_use]
    pub const fn report(&self) -> ProgressReport {
        ProgressReport {
            in_progress: self.in_progress,
            total: self.total,
            remaining: self.remaining,
            completed: self.completed(),
        }
    }
}

impl Default for GenerationProgress {
    fn default() -> Self {
        Self::not_started()
    }
}

/// Status payload consumed by status commands and HTTP endpoints.
///
/// The field set and names are part of the public contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressReport {
    /// Whether a run is active.
    pub in_progress: bool,
    /// Dates in the most recent run.
    pub total: u64,
    /// Dates not yet finished.
    pub remaining: u64,
    /// Dates finished.
    pub completed: u64,
}
