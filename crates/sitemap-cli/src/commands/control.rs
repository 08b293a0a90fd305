//! Cancel and repair the active run.

use anyhow::Result;
use colored::Colorize;

use crate::output::{OutputFormat, print_json};
use crate::utils::context::AppContext;

/// Execute the cancel command
pub fn cancel(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    let outcome = ctx.scheduler.cancel()?;
    match format {
        OutputFormat::Json => print_json(&outcome)?,
        OutputFormat::Text => {
            let marker = if outcome.success {
                "✓".green()
            } else {
                "-".bright_black()
            };
            println!("{marker} {}", outcome.message);
        },
    }
    Ok(())
}

/// Execute the repair command
pub fn repair(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    let outcome = ctx.scheduler.reconcile()?;
    match format {
        OutputFormat::Json => print_json(&outcome)?,
        OutputFormat::Text => {
            if !outcome.repaired() {
                println!("{} Progress and task queue agree", "✓".green());
            }
            if outcome.cleared_flag {
                println!(
                    "{} Cleared in-progress flag with no scheduled work",
                    "!".yellow()
                );
            }
            if outcome.cancelled_tasks > 0 {
                println!(
                    "{} Cancelled {} task(s) queued without an active run",
                    "!".yellow(),
                    outcome.cancelled_tasks
                );
            }
        },
    }
    Ok(())
}
