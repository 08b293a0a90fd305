//! Drain the generation task queue.

use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use sitemap_core::{CronTaskHandler, DateBuild, DateOutcome, TaskOutcome};
use tracing::{debug, info, warn};

use crate::utils::context::AppContext;

/// Execute the worker command
///
/// Handles due tasks in order. Without `--once` it sleeps until the next
/// queued task and returns when the queue is empty. Every task is
/// acknowledged after its handler returns, whether or not it succeeded.
pub async fn worker(ctx: &AppContext, once: bool, max_tasks: Option<usize>) -> Result<()> {
    ctx.require_catalog()?;

    let handler = CronTaskHandler::new(ctx.scheduler.clone());
    let mut handled = 0usize;

    loop {
        if max_tasks.is_some_and(|max| handled >= max) {
            debug!(handled, "Task limit reached");
            break;
        }

        if let Some(task) = ctx.queue.next_due(Utc::now())? {
            if handler.accepts(&task) {
                let job = handler.clone();
                let current = task.clone();
                match tokio::task::spawn_blocking(move || job.handle(&current)).await? {
                    Ok(outcome) => println!("{}", describe(&outcome)),
                    Err(e) => warn!(id = task.id, error = %e, "Task failed"),
                }
            } else {
                warn!(id = task.id, action = %task.action, "Dropping task for unknown lane");
            }
            ctx.queue.acknowledge(task.id)?;
            handled += 1;
            continue;
        }

        if once {
            break;
        }
        let Some(next) = ctx.queue.next_run_at()? else {
            break;
        };
        let wait = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        debug!(?wait, "Waiting for next task");
        tokio::time::sleep(wait).await;
    }

    info!(handled, "Worker finished");
    println!("Handled {handled} task(s)");
    Ok(())
}

fn describe(outcome: &TaskOutcome) -> String {
    match outcome {
        TaskOutcome::Ran(DateOutcome::Built { date, build }) => match build {
            DateBuild::Written { urls } => format!("{} {date} written ({urls} URLs)", "✓".green()),
            DateBuild::Unchanged { urls } => {
                format!("{} {date} unchanged ({urls} URLs)", "✓".green())
            },
            DateBuild::Empty { removed } => {
                let note = if *removed { ", old sitemap removed" } else { "" };
                format!("{} {date} has no content{note}", "-".bright_black())
            },
        },
        TaskOutcome::Ran(DateOutcome::Failed { date, error }) => {
            format!("{} {date} failed: {error}", "✗".red())
        },
        TaskOutcome::Skipped { date } => {
            format!("{} {date} skipped (no active run)", "-".bright_black())
        },
        TaskOutcome::Halted {
            date,
            removed_tasks,
        } => format!(
            "{} {date} halted: site not eligible, {removed_tasks} task(s) removed",
            "!".yellow()
        ),
    }
}
