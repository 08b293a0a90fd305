//! Show run progress.

use anyhow::Result;
use colored::{ColoredString, Colorize};
use sitemap_core::{SchedulerState, TaskDispatcher};

use crate::output::{OutputFormat, print_json};
use crate::utils::context::AppContext;

/// Execute the status command
///
/// JSON output is exactly the progress payload
/// `{in_progress, total, remaining, completed}`.
pub fn status(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    let report = ctx.scheduler.get_progress()?;
    if format.is_machine_readable() {
        return print_json(&report);
    }

    let progress = ctx.scheduler.progress()?;
    let state = ctx.scheduler.state()?;
    println!("{} {}", "State:".bold(), paint(state));
    if report.total > 0 {
        println!(
            "{} {}/{} dates ({:.0}%)",
            "Progress:".bold(),
            report.completed,
            report.total,
            progress.percent_complete()
        );
    }
    if let Some(date) = progress.current_date() {
        println!("{} {date}", "Current date:".bold());
    }
    if let Some(at) = ctx
        .queue
        .next_scheduled(&ctx.scheduler.settings().action_name)?
    {
        println!("{} {}", "Next task:".bold(), at.to_rfc3339());
    }
    println!(
        "{} {} ({} URLs)",
        "Built partitions:".bold(),
        ctx.partitions.built_dates()?.len(),
        ctx.partitions.total_url_count()?
    );
    Ok(())
}

fn paint(state: SchedulerState) -> ColoredString {
    let label = state.as_str();
    match state {
        SchedulerState::Idle => label.bright_black(),
        SchedulerState::Scheduled => label.cyan(),
        SchedulerState::Running => label.yellow(),
        SchedulerState::Completed => label.green(),
        SchedulerState::Cancelled => label.red(),
    }
}
