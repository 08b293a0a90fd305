//! Build dates synchronously.

use std::sync::Arc;

use anyhow::{Result, bail};
use colored::Colorize;
use sitemap_core::GenerateOutcome;

use crate::output::{OutputFormat, print_json, spinner};
use crate::utils::context::AppContext;

/// Execute the generate command
///
/// Exits with an error when any date failed to build.
pub async fn generate(ctx: &AppContext, dates: &[String], format: OutputFormat) -> Result<()> {
    ctx.require_catalog()?;

    let pb = if format.is_machine_readable() {
        indicatif::ProgressBar::hidden()
    } else {
        spinner(&format!("Generating {} date(s)...", dates.len()))
    };

    let scheduler = Arc::clone(&ctx.scheduler);
    let owned = dates.to_vec();
    let outcome = tokio::task::spawn_blocking(move || scheduler.generate_now(&owned)).await??;
    pb.finish_and_clear();

    match format {
        OutputFormat::Json => print_json(&outcome)?,
        OutputFormat::Text => print_generate_outcome(&outcome),
    }

    if outcome.failed > 0 {
        bail!("{} date(s) failed to build", outcome.failed);
    }
    Ok(())
}

pub(super) fn print_generate_outcome(outcome: &GenerateOutcome) {
    let marker = if outcome.success {
        "✓".green()
    } else if outcome.failed > 0 {
        "✗".red()
    } else {
        "!".yellow()
    };
    println!("{marker} {}", outcome.message);
}
