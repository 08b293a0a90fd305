//! List dates chosen by a detection strategy.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use sitemap_core::DetectionKind;

use crate::output::{OutputFormat, print_json};
use crate::utils::context::AppContext;

#[derive(Debug, Serialize)]
struct DetectReport<'a> {
    kind: DetectionKind,
    description: &'a str,
    dates: Vec<String>,
}

/// Execute the detect command
pub fn detect(ctx: &AppContext, kind: Option<DetectionKind>, format: OutputFormat) -> Result<()> {
    ctx.require_catalog()?;
    let provider = ctx.date_provider(kind);
    let report = DetectReport {
        kind: provider.kind(),
        description: provider.description(),
        dates: provider.dates()?,
    };

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            if report.dates.is_empty() {
                println!(
                    "{} No dates found ({})",
                    "✓".green(),
                    report.description
                );
            } else {
                println!(
                    "{} {} date(s): {}",
                    report.kind.to_string().bold(),
                    report.dates.len(),
                    report.description.bright_black()
                );
                for date in &report.dates {
                    println!("  {date}");
                }
            }
        },
    }
    Ok(())
}
