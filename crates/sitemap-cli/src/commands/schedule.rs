//! Queue background generation, or build inline for small batches.

use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use serde::Serialize;
use sitemap_core::{DetectionKind, GenerateOutcome, ScheduleOutcome};
use tracing::{debug, warn};

use super::generate::print_generate_outcome;
use crate::output::{OutputFormat, print_json};
use crate::utils::context::AppContext;

#[derive(Debug, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
enum ScheduleReport {
    Scheduled(ScheduleOutcome),
    Generated(GenerateOutcome),
}

impl ScheduleReport {
    const fn success(&self) -> bool {
        match self {
            Self::Scheduled(outcome) => outcome.success,
            Self::Generated(outcome) => outcome.success,
        }
    }
}

/// Execute the schedule command
///
/// Explicit dates are used as given. Otherwise the detection strategy picks
/// them, and a successful run advances that strategy's watermark.
pub fn schedule(
    ctx: &AppContext,
    kind: Option<DetectionKind>,
    dates: &[String],
    format: OutputFormat,
) -> Result<()> {
    ctx.require_catalog()?;

    let checked_at = Utc::now();
    let (dates, provider) = if dates.is_empty() {
        let provider = ctx.date_provider(kind);
        let detected = provider.dates()?;
        debug!(kind = %provider.kind(), count = detected.len(), "Detected dates");
        (detected, Some(provider))
    } else {
        (dates.to_vec(), None)
    };

    let threshold = ctx.config.generation.sync_threshold;
    let report = if !dates.is_empty() && dates.len() <= threshold {
        debug!(count = dates.len(), threshold, "Generating inline");
        ScheduleReport::Generated(ctx.scheduler.generate_now(&dates)?)
    } else {
        ScheduleReport::Scheduled(ctx.scheduler.schedule(&dates)?)
    };

    if report.success() {
        if let Some(provider) = &provider {
            if let Err(e) = provider.mark_scheduled(checked_at) {
                warn!(error = %e, "Failed to record detection watermark");
            }
        }
    }

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => match &report {
            ScheduleReport::Scheduled(outcome) => {
                if outcome.success {
                    println!("{} {}", "✓".green(), outcome.message);
                    println!(
                        "  Run {} to process the queue",
                        "sitemapctl worker".cyan()
                    );
                } else {
                    println!("{} {}", "!".yellow(), outcome.message);
                }
            },
            ScheduleReport::Generated(outcome) => print_generate_outcome(outcome),
        },
    }
    Ok(())
}
